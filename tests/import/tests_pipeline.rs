//! End-to-end tests: detection, import from bytes and files, overrides.

use archimport::import::{ImporterRegistry, ModelImporter, SniffContext};
use archimport::{ImportConfig, ImportError, MemoryStore, import_bytes, import_file};
use rstest::rstest;

use crate::helpers::model_assertions::*;
use crate::helpers::source_fixtures::*;

// =============================================================================
// DETECTION
// =============================================================================

#[rstest]
#[case::bpmn_default_namespace(BPMN_MINIMAL, "process.bpmn", Some("bpmn2"))]
#[case::bpmn_prefixed(BPMN_ORDER, "order.xml", Some("bpmn2"))]
#[case::meff(MEFF_BANK, "bank.xml", Some("archimate-meff"))]
#[case::meff_ns0(MEFF_BANK_NS0, "bank.xml", Some("archimate-meff"))]
#[case::meff_legacy(MEFF_LEGACY, "legacy.xml", Some("archimate-meff"))]
#[case::ea_xmi(EA_XMI_ORDERS, "orders.xmi", Some("ea-xmi"))]
#[case::html("<html><body/></html>", "page.html", None)]
#[case::foreign_model(r#"<model xmlns="http://example.com/other"/>"#, "other.xml", None)]
fn test_format_detection(
    #[case] source: &str,
    #[case] file_name: &str,
    #[case] expected: Option<&str>,
) {
    let registry = ImporterRegistry::with_defaults();
    let detected = registry
        .detect(&SniffContext::from_text(source, file_name))
        .map(|importer| importer.name());
    assert_eq!(detected, expected);
}

#[test]
fn test_registry_order() {
    let registry = ImporterRegistry::with_defaults();
    assert_eq!(registry.names(), vec!["bpmn2", "archimate-meff", "ea-xmi"]);
    assert_eq!(
        registry.get("ea-xmi").map(|importer| importer.source_system()),
        Some("sparx-ea")
    );
    assert!(registry.get("visio").is_none());
}

#[test]
fn test_unsupported_input_is_rejected_before_apply() {
    let mut store = MemoryStore::new();
    let err = import_bytes(
        b"name,type\nCustomer,BusinessActor\n",
        "elements.csv",
        None,
        &mut store,
        &ImportConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ImportError::UnsupportedFormat { ref file_name } if file_name == "elements.csv"
    ));
    assert!(store.is_empty());
}

// =============================================================================
// BYTES
// =============================================================================

#[test]
fn test_bpmn_end_to_end() {
    let mut store = MemoryStore::new();
    let result = import_bytes(
        BPMN_ORDER.as_bytes(),
        "order.bpmn",
        None,
        &mut store,
        &ImportConfig::default(),
    )
    .expect("import");
    let model = store.model(&result.model_id).expect("model");

    assert_eq!(model.name, "Order handling");
    assert_eq!(model.elements.len(), 6);
    assert_eq!(model.relationships.len(), 2);
    let metadata = |key: &str| model.metadata.get(key).map(String::as_str);
    assert_eq!(metadata("importFormat"), Some("bpmn2"));
    assert_eq!(metadata("sourceSystem"), Some("bpmn"));
    assert_eq!(metadata("sourceTool"), Some("Camunda Modeler"));
    assert_eq!(metadata("sourceFile"), Some("order.bpmn"));
    assert!(metadata("importedAt").is_some());
    assert_model_consistent(model);
    assert_external_ids_recoverable(
        model,
        "bpmn",
        &["pool", "lane_sales", "start", "task", "timeout", "end", "f1", "f2"],
    );

    let task = element(model, "bpmn", "task");
    let lane = element(model, "bpmn", "lane_sales");
    let pool = element(model, "bpmn", "pool");
    assert_eq!(task.type_name, "bpmn.task");
    assert_eq!(task.parent.as_ref(), Some(&lane.id));
    assert_eq!(lane.parent.as_ref(), Some(&pool.id));

    let timeout = element(model, "bpmn", "timeout");
    assert_eq!(
        timeout.attrs["attachedToRef"],
        serde_json::Value::String(task.id.to_string())
    );

    let view = view_named(model, "Order flow");
    assert_eq!(view.viewpoint, "business_process_cooperation");
    assert_eq!(view.nodes.len(), 4);
    assert_eq!(view.connections.len(), 2);

    // f3 points at a node that does not exist.
    assert_eq!(result.report.count_of("relationship-dangling-endpoint"), 1);
    assert_eq!(result.report.source, "bpmn2");
}

#[test]
fn test_overrides_from_config() {
    let config = ImportConfig::default()
        .with_source_system("modeler")
        .with_model_name("Imported bank");
    let mut store = MemoryStore::new();
    let result = import_bytes(MEFF_BANK.as_bytes(), "bank.xml", None, &mut store, &config)
        .expect("import");
    let model = store.model(&result.model_id).expect("model");

    assert_eq!(model.name, "Imported bank");
    assert_eq!(model.metadata.get("sourceSystem").map(String::as_str), Some("modeler"));
    assert!(model.element_by_external_id("modeler", "a").is_some());
    assert!(model.element_by_external_id("archimate", "a").is_none());
}

#[test]
fn test_each_import_allocates_a_new_model() {
    let mut store = MemoryStore::new();
    let config = ImportConfig::default();
    let first = import_bytes(MEFF_BANK.as_bytes(), "bank.xml", None, &mut store, &config)
        .expect("first");
    let second = import_bytes(MEFF_BANK.as_bytes(), "bank.xml", None, &mut store, &config)
        .expect("second");
    assert_ne!(first.model_id, second.model_id);
    assert_eq!(store.len(), 2);
}

// =============================================================================
// FILES
// =============================================================================

#[test]
fn test_import_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.xmi");
    std::fs::write(&path, EA_XMI_ORDERS).expect("write");

    let mut store = MemoryStore::new();
    let result = import_file(&path, &mut store, &ImportConfig::default()).expect("import");
    let model = store.model(&result.model_id).expect("model");
    assert_eq!(
        model.metadata.get("sourceFile").map(String::as_str),
        Some("orders.xmi")
    );
    assert_eq!(
        model.metadata.get("importFormat").map(String::as_str),
        Some("ea-xmi")
    );
    assert_model_consistent(model);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = MemoryStore::new();
    let err = import_file(dir.path().join("absent.bpmn"), &mut store, &ImportConfig::default())
        .unwrap_err();
    assert!(matches!(err, ImportError::Io(_)));
}

#[test]
fn test_report_serializes_to_json() {
    let mut store = MemoryStore::new();
    let result = import_bytes(
        BPMN_ORDER.as_bytes(),
        "order.bpmn",
        None,
        &mut store,
        &ImportConfig::default(),
    )
    .expect("import");
    let json = result.report.to_json_pretty().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(value["source"], "bpmn2");
    assert!(value["warnings"].as_array().is_some_and(|w| !w.is_empty()));
}
