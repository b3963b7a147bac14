//! MEFF-specific repair: fold legacy (2.1 era) type tokens onto the
//! current ArchiMate vocabulary, then the shared tail.

use crate::import::ir::IrValue;
use crate::import::normalize::NormalizeOptions;
use crate::import::normalize::common::finish_format_pass;
use crate::import::{ImportReport, IrModel};

/// Current name for a legacy element type, with an optional junction kind.
fn canonical_element_type(token: &str) -> (&str, Option<&'static str>) {
    match token {
        "InfrastructureInterface" => ("TechnologyInterface", None),
        "InfrastructureFunction" => ("TechnologyFunction", None),
        "InfrastructureService" => ("TechnologyService", None),
        "AndJunction" => ("Junction", Some("and")),
        "OrJunction" => ("Junction", Some("or")),
        other => (other, None),
    }
}

/// Current name for a legacy relationship type.
fn canonical_relationship_type(token: &str) -> &str {
    let token = token.strip_suffix("Relationship").unwrap_or(token);
    match token {
        "UsedBy" => "Serving",
        "Realisation" => "Realization",
        "Specialisation" => "Specialization",
        other => other,
    }
}

/// The MEFF normalization pass.
pub fn normalize_meff(mut ir: IrModel, options: &NormalizeOptions, report: &mut ImportReport) -> IrModel {
    for element in &mut ir.elements {
        let (canonical, junction) = canonical_element_type(&element.type_name);
        if canonical != element.type_name {
            let canonical = canonical.to_string();
            element.type_name = canonical;
        }
        if let Some(kind) = junction {
            element
                .attrs
                .entry("junctionType".to_string())
                .or_insert_with(|| IrValue::from(kind));
        }
    }
    for relationship in &mut ir.relationships {
        let canonical = canonical_relationship_type(&relationship.type_name);
        if canonical != relationship.type_name {
            relationship.type_name = canonical.to_string();
        }
    }
    finish_format_pass(ir, options, report)
}
