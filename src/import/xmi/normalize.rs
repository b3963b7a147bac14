//! EA-XMI-specific repair: strip EA rich-text markup from notes and keep
//! association-class back-references consistent with what survived.

use rustc_hash::FxHashSet;

use crate::import::ir::{IrValue, keys};
use crate::import::normalize::NormalizeOptions;
use crate::import::normalize::common::finish_format_pass;
use crate::import::report::sample;
use crate::import::{ImportReport, IrModel};

const MARKUP_TAGS: &[&str] = &["b", "i", "u", "font", "ul", "ol", "li", "br", "p"];

/// Remove the inline formatting tags EA stores in notes.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let Some(end) = candidate.find('>') else {
            out.push_str(candidate);
            return out;
        };
        let tag = candidate[1..end].trim_start_matches('/');
        let name = tag
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if MARKUP_TAGS.contains(&name.as_str()) {
            if matches!(name.as_str(), "br" | "p" | "li") {
                out.push('\n');
            }
        } else {
            out.push_str(&candidate[..=end]);
        }
        rest = &candidate[end + 1..];
    }
    out.push_str(rest);
    out
}

fn strip_opt(text: &mut Option<String>) {
    if let Some(value) = text.as_mut() {
        if value.contains('<') {
            *value = strip_markup(value);
        }
    }
}

/// The EA-XMI normalization pass.
pub fn normalize_ea_xmi(mut ir: IrModel, options: &NormalizeOptions, report: &mut ImportReport) -> IrModel {
    for folder in &mut ir.folders {
        strip_opt(&mut folder.documentation);
    }
    for element in &mut ir.elements {
        strip_opt(&mut element.documentation);
    }
    for relationship in &mut ir.relationships {
        strip_opt(&mut relationship.documentation);
    }
    for view in &mut ir.views {
        strip_opt(&mut view.documentation);
    }
    let ir = finish_format_pass(ir, options, report);
    unlink_association_classes(ir, report)
}

/// Drop back-references whose other half did not survive normalization.
fn unlink_association_classes(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let element_ids: FxHashSet<String> = ir.elements.iter().map(|e| e.id.clone()).collect();
    let relationship_ids: FxHashSet<String> =
        ir.relationships.iter().map(|r| r.id.clone()).collect();

    for element in &mut ir.elements {
        let dangling = element
            .attrs
            .get(keys::ASSOCIATION_RELATIONSHIP_ID)
            .and_then(IrValue::as_str)
            .is_some_and(|id| !relationship_ids.contains(id));
        if dangling {
            element.attrs.shift_remove(keys::ASSOCIATION_RELATIONSHIP_ID);
            report.warn(
                "association-class-unlinked",
                "Association class lost its relationship half",
                sample(&[("id", &element.id)]),
            );
        }
    }
    for relationship in &mut ir.relationships {
        let dangling = relationship
            .attrs
            .get(keys::ASSOCIATION_CLASS_ELEMENT_ID)
            .and_then(IrValue::as_str)
            .is_some_and(|id| !element_ids.contains(id));
        if dangling {
            relationship.attrs.shift_remove(keys::ASSOCIATION_CLASS_ELEMENT_ID);
            report.warn(
                "association-class-unlinked",
                "Association class lost its element half",
                sample(&[("id", &relationship.id)]),
            );
        }
    }
    ir
}
