//! BPMN 2.0 import tests.

use archimport::ImportConfig;
use archimport::import::bpmn::{element_type, parse_bpmn};
use archimport::import::ir::keys;
use archimport::import::xml::Document;
use archimport::import::{ImportError, ImportReport, parse_and_normalize};
use rstest::rstest;

use crate::helpers::model_assertions::*;
use crate::helpers::source_fixtures::{BPMN_MINIMAL, BPMN_ORDER};

// =============================================================================
// HELPERS
// =============================================================================

fn normalized(source: &str) -> archimport::ParsedImport {
    parse_and_normalize(source.as_bytes(), "process.bpmn", None, &ImportConfig::default())
        .expect("BPMN import")
}

fn parent_of(ir: &archimport::IrModel, id: &str) -> Option<String> {
    ir.element(id).and_then(|e| e.parent_element_id.clone())
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[test]
fn test_minimal_process() {
    let parsed = normalized(BPMN_MINIMAL);
    assert_eq!(parsed.importer, "bpmn2");
    assert_eq!(parsed.source_system, "bpmn");

    let ir = &parsed.ir;
    assert_eq!(ir.elements.len(), 3);
    assert!(ir.elements.iter().all(|e| !e.name.trim().is_empty()));
    assert_eq!(
        ir.element("end").map(|e| e.name.as_str()),
        Some("Unnamed (bpmn.endEvent)")
    );

    assert_eq!(ir.relationships.len(), 2);
    assert!(
        ir.relationships
            .iter()
            .all(|r| r.type_name == "bpmn.sequenceFlow")
    );
    assert_ir_referential_integrity(ir);
    assert_eq!(parsed.report.count_of("missing-name"), 1);
}

#[test]
fn test_document_metadata() {
    let parsed = normalized(BPMN_ORDER);
    let meta = &parsed.ir.meta;
    assert_eq!(meta.format.as_deref(), Some("bpmn2"));
    assert_eq!(meta.tool.as_deref(), Some("Camunda Modeler"));
    assert_eq!(meta.tool_version.as_deref(), Some("5.20.0"));
    assert_eq!(meta.model_name.as_deref(), Some("Order handling"));
    assert!(meta.imported_at_iso.is_some());
}

// =============================================================================
// CONTAINMENT
// =============================================================================

#[test]
fn test_lanes_and_pools_become_parents() {
    let parsed = normalized(BPMN_ORDER);
    let ir = &parsed.ir;
    assert_eq!(parent_of(ir, "lane_sales").as_deref(), Some("pool"));
    assert_eq!(parent_of(ir, "start").as_deref(), Some("lane_sales"));
    assert_eq!(parent_of(ir, "task").as_deref(), Some("lane_sales"));
    assert_eq!(parent_of(ir, "end").as_deref(), Some("pool"));
    assert_eq!(parent_of(ir, "timeout").as_deref(), Some("pool"));
    assert_eq!(parent_of(ir, "pool"), None);
}

#[test]
fn test_boundary_event_keeps_host_and_timer() {
    let parsed = normalized(BPMN_ORDER);
    let timeout = parsed.ir.element("timeout").expect("boundary event");
    assert_eq!(timeout.type_name, "bpmn.boundaryEvent");
    assert_eq!(timeout.attrs[keys::ATTACHED_TO_REF].as_str(), Some("task"));
    let definition = timeout.attrs["eventDefinition"].as_map().expect("definition");
    assert_eq!(definition["kind"].as_str(), Some("timer"));
    assert_eq!(definition["timeDuration"].as_str(), Some("PT2H"));
}

#[test]
fn test_documentation_is_cleaned() {
    let parsed = normalized(BPMN_ORDER);
    assert_eq!(
        parsed.ir.element("task").and_then(|e| e.documentation.as_deref()),
        Some("Verify stock\nand payment")
    );
}

// =============================================================================
// REPAIRS
// =============================================================================

#[test]
fn test_flow_to_missing_node_is_dropped() {
    let parsed = normalized(BPMN_ORDER);
    assert!(parsed.ir.relationship("f3").is_none());
    assert_eq!(parsed.report.count_of("relationship-dangling-endpoint"), 1);
    assert_ir_referential_integrity(&parsed.ir);
}

#[test]
fn test_diagram_edges_are_wired_to_shapes() {
    let parsed = normalized(BPMN_ORDER);
    let view = parsed.ir.view("diagram").expect("diagram");
    assert_eq!(view.name, "Order flow");
    assert_eq!(view.viewpoint.as_deref(), Some("bpmn"));
    assert_eq!(view.nodes.len(), 4);
    assert_eq!(view.connections.len(), 2);

    let f1 = view
        .connections
        .iter()
        .find(|c| c.relationship_id.as_deref() == Some("f1"))
        .expect("f1 edge");
    assert_eq!(f1.source_node_id.as_deref(), Some("start_di"));
    assert_eq!(f1.target_node_id.as_deref(), Some("task_di"));
    assert_eq!(f1.points.len(), 2);
}

#[test]
fn test_missing_ids_are_generated() {
    let parsed = normalized(
        r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
             <process id="p"><task name="Anonymous"/></process>
           </definitions>"#,
    );
    assert_eq!(parsed.ir.elements.len(), 1);
    assert!(parsed.ir.elements[0].id.starts_with("bpmn_synth_"));
    assert_eq!(parsed.report.count_of("missing-id"), 1);
}

#[test]
fn test_children_of_anonymous_subprocess_are_kept() {
    let parsed = normalized(
        r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
             <process id="p">
               <subProcess name="Handle"><task id="inner" name="Check"/></subProcess>
             </process>
           </definitions>"#,
    );
    let container = parsed
        .ir
        .elements
        .iter()
        .find(|e| e.type_name == "bpmn.subProcess")
        .expect("subprocess");
    assert!(container.id.starts_with("bpmn_synth_"));
    assert_eq!(parent_of(&parsed.ir, "inner"), Some(container.id.clone()));
    assert_eq!(parsed.report.count_of("missing-id"), 1);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_wrong_root_is_structural() {
    let doc = Document::parse_str("<process id=\"p\"/>").expect("xml");
    let mut report = ImportReport::new("bpmn2");
    let err = parse_bpmn(&doc, &mut report).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("definitions"));
}

#[test]
fn test_malformed_xml_is_fatal() {
    let result = parse_and_normalize(
        br#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"><process id="p">"#,
        "broken.bpmn",
        None,
        &ImportConfig::default(),
    );
    assert!(matches!(result, Err(ImportError::Xml(_))));
}

// =============================================================================
// TYPE TOKENS
// =============================================================================

#[rstest]
#[case("task", Some("bpmn.task"))]
#[case("userTask", Some("bpmn.userTask"))]
#[case("adHocSubProcess", Some("bpmn.subProcess"))]
#[case("exclusiveGateway", Some("bpmn.exclusiveGateway"))]
#[case("dataStoreReference", Some("bpmn.dataStoreReference"))]
#[case("participant", Some("bpmn.pool"))]
#[case("sequenceFlow", None)]
#[case("definitions", None)]
fn test_element_type_tokens(#[case] tag: &str, #[case] expected: Option<&str>) {
    assert_eq!(element_type(tag), expected);
}
