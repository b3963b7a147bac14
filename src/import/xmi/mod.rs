//! Enterprise Architect XMI / UML importer.

mod normalize;
mod parser;

pub use normalize::{normalize_ea_xmi, strip_markup};
pub use parser::{ASSOCIATION_SUFFIX, archimate_stereotype, lower_camel, parse_ea_xmi};

use super::importer::{ModelImporter, NormalizePass};
use super::sniff::SniffContext;
use super::xml::Document;
use super::{ImportError, ImportReport, IrModel};

/// Importer name and report source.
pub const FORMAT: &str = "ea-xmi";

/// Detect an XMI document carrying a UML model.
pub fn sniff_ea_xmi(ctx: &SniffContext) -> bool {
    let xmi_root = ctx.root_is("XMI") || (ctx.root_is("Model") && ctx.contains("xmi:"));
    let xmi_namespace = ctx.contains("omg.org/spec/XMI") || ctx.contains_ignore_case("xmlns:xmi=");
    let uml = ctx.contains("omg.org/spec/UML") || ctx.contains("uml:");
    xmi_root && xmi_namespace && uml
}

/// Importer for Sparx Enterprise Architect XMI 2.x exports.
#[derive(Debug, Default, Clone, Copy)]
pub struct EaXmiImporter;

impl ModelImporter for EaXmiImporter {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "Enterprise Architect XMI 2.x (UML, ArchiMate profile)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xmi", "xml"]
    }

    fn source_system(&self) -> &'static str {
        "sparx-ea"
    }

    fn sniff(&self, ctx: &SniffContext) -> bool {
        sniff_ea_xmi(ctx)
    }

    fn parse(&self, doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
        parse_ea_xmi(doc, report)
    }

    fn format_pass(&self) -> NormalizePass {
        normalize_ea_xmi
    }
}
