//! Enterprise Architect XMI import tests.

use archimport::import::ir::{IrValue, keys};
use archimport::import::xmi::{ASSOCIATION_SUFFIX, archimate_stereotype, lower_camel};
use archimport::import::{ParsedImport, parse_and_normalize};
use archimport::model::Layer;
use archimport::{ImportConfig, MemoryStore, import_bytes};
use rstest::rstest;

use crate::helpers::model_assertions::*;
use crate::helpers::source_fixtures::EA_XMI_ORDERS;

fn normalized() -> ParsedImport {
    parse_and_normalize(
        EA_XMI_ORDERS.as_bytes(),
        "orders.xmi",
        None,
        &ImportConfig::default(),
    )
    .expect("XMI import")
}

fn type_of(parsed: &ParsedImport, id: &str) -> Option<String> {
    parsed.ir.element(id).map(|e| e.type_name.clone())
}

// =============================================================================
// PARSE + NORMALIZE
// =============================================================================

#[test]
fn test_detected_as_ea_xmi() {
    let parsed = normalized();
    assert_eq!(parsed.importer, "ea-xmi");
    assert_eq!(parsed.source_system, "sparx-ea");
    assert_eq!(parsed.ir.meta.tool.as_deref(), Some("Enterprise Architect"));
    assert_eq!(parsed.ir.meta.model_name.as_deref(), Some("Orders"));
}

#[test]
fn test_uml_and_stereotyped_types() {
    let parsed = normalized();
    assert_eq!(type_of(&parsed, "EAID_Order").as_deref(), Some("uml.class"));
    assert_eq!(type_of(&parsed, "EAID_Clerk").as_deref(), Some("BusinessRole"));
    assert_eq!(type_of(&parsed, "EAID_Doc").as_deref(), Some("BusinessObject"));
    assert_eq!(
        type_of(&parsed, "EAID_Assign").as_deref(),
        Some("uml.associationClass")
    );

    let order = parsed.ir.element("EAID_Order").expect("order");
    assert_eq!(order.folder_id.as_deref(), Some("EAPK_root"));
    assert_eq!(
        order.attrs["attributes"],
        IrValue::List(vec![IrValue::from("total")])
    );
    assert_eq!(
        order.attrs["operations"],
        IrValue::List(vec![IrValue::from("submit")])
    );
}

#[test]
fn test_notes_lose_markup_and_tags_become_tagged_values() {
    let parsed = normalized();
    let document = parsed.ir.element("EAID_Doc").expect("document");
    assert_eq!(document.documentation.as_deref(), Some("A stored document"));
    assert_eq!(document.attrs["umlType"].as_str(), Some("uml.class"));
    assert!(
        document
            .tagged_values
            .iter()
            .any(|t| t.key == "owner" && t.value == "records")
    );
}

#[test]
fn test_relationships() {
    let parsed = normalized();
    let ir = &parsed.ir;

    let generalization = ir.relationship("EAID_Gen").expect("generalization");
    assert_eq!(generalization.type_name, "uml.generalization");
    assert_eq!(generalization.source_id, "EAID_Order");
    assert_eq!(generalization.target_id, "EAID_Doc");

    let dependency = ir.relationship("EAID_Dep").expect("dependency");
    assert_eq!(dependency.documentation.as_deref(), Some("reads"));
    assert_eq!(dependency.attrs["direction"].as_str(), Some("Source -> Destination"));

    assert!(ir.relationship("EAID_Lost").is_none());
    assert_eq!(parsed.report.count_of("relationship-dangling-endpoint"), 1);
    assert_ir_referential_integrity(ir);
}

#[test]
fn test_association_class_halves_reference_each_other() {
    let parsed = normalized();
    let relationship_id = format!("EAID_Assign{ASSOCIATION_SUFFIX}");
    let element = parsed.ir.element("EAID_Assign").expect("element half");
    let relationship = parsed
        .ir
        .relationship(&relationship_id)
        .expect("relationship half");
    assert_eq!(
        element.attrs[keys::ASSOCIATION_RELATIONSHIP_ID].as_str(),
        Some(relationship_id.as_str())
    );
    assert_eq!(
        relationship.attrs[keys::ASSOCIATION_CLASS_ELEMENT_ID].as_str(),
        Some("EAID_Assign")
    );
    assert_eq!(relationship.source_id, "EAID_Clerk");
    assert_eq!(relationship.target_id, "EAID_Order");
}

#[test]
fn test_diagram_geometry() {
    let parsed = normalized();
    let view = parsed.ir.view("EAID_Diagram").expect("diagram");
    assert_eq!(view.name, "Order domain");
    assert_eq!(view.folder_id.as_deref(), Some("EAPK_root"));
    assert_eq!(view.nodes.len(), 2);

    let clerk = view.node("EAID_Diagram:EAID_Clerk").expect("clerk node");
    let bounds = clerk.bounds.expect("bounds");
    assert_eq!((bounds.x, bounds.y, bounds.width, bounds.height), (100.0, 50.0, 90.0, 70.0));

    assert_eq!(view.connections.len(), 1);
    assert_eq!(view.connections[0].relationship_id.as_deref(), Some("EAID_Dep"));
    assert_eq!(view.connections[0].points.len(), 2);
}

// =============================================================================
// APPLY
// =============================================================================

#[test]
fn test_apply_rewrites_association_class_links() {
    let mut store = MemoryStore::new();
    let result = import_bytes(
        EA_XMI_ORDERS.as_bytes(),
        "orders.xmi",
        None,
        &mut store,
        &ImportConfig::default(),
    )
    .expect("import");
    let model = store.model(&result.model_id).expect("model");
    assert_model_consistent(model);

    let element = element(model, "sparx-ea", "EAID_Assign");
    let relationship = relationship(model, "sparx-ea", "EAID_Assign__association");
    assert_eq!(
        element.attrs[keys::ASSOCIATION_RELATIONSHIP_ID],
        serde_json::Value::String(relationship.id.to_string())
    );
    assert_eq!(
        relationship.attrs[keys::ASSOCIATION_CLASS_ELEMENT_ID],
        serde_json::Value::String(element.id.to_string())
    );
}

#[test]
fn test_apply_layers() {
    let mut store = MemoryStore::new();
    let result = import_bytes(
        EA_XMI_ORDERS.as_bytes(),
        "orders.xmi",
        None,
        &mut store,
        &ImportConfig::default(),
    )
    .expect("import");
    let model = store.model(&result.model_id).expect("model");
    assert_eq!(element(model, "sparx-ea", "EAID_Doc").layer, Layer::Business);
    assert_eq!(element(model, "sparx-ea", "EAID_Order").layer, Layer::Other);
    assert_eq!(element(model, "sparx-ea", "EAID_Order").type_name, "uml.class");
    assert!(result.report.unknown_element_types.is_empty());
}

// =============================================================================
// HELPERS
// =============================================================================

#[rstest]
#[case("ArchiMate3::ArchiMate_BusinessActor", Some("BusinessActor"))]
#[case("ArchiMate_ApplicationComponent", Some("ApplicationComponent"))]
#[case("Archimate_Node", Some("Node"))]
#[case("ArchiMate_", None)]
#[case("boundary", None)]
fn test_archimate_stereotypes(#[case] stereotype: &str, #[case] expected: Option<&str>) {
    assert_eq!(archimate_stereotype(stereotype), expected);
}

#[rstest]
#[case("Class", "class")]
#[case("InformationFlow", "informationFlow")]
#[case("", "")]
fn test_lower_camel(#[case] kind: &str, #[case] expected: &str) {
    assert_eq!(lower_camel(kind), expected);
}
