//! Assertion helpers over IRs and stored models.

use std::collections::HashSet;

use archimport::import::ImportReport;
use archimport::import::ir::IrModel;
use archimport::model::{Element, Model, Relationship, View};

/// Every relationship endpoint is an element of the IR.
pub fn assert_ir_referential_integrity(ir: &IrModel) {
    let elements: HashSet<&str> = ir.elements.iter().map(|e| e.id.as_str()).collect();
    for relationship in &ir.relationships {
        assert!(
            elements.contains(relationship.source_id.as_str()),
            "relationship {} has dangling source {}",
            relationship.id,
            relationship.source_id
        );
        assert!(
            elements.contains(relationship.target_id.as_str()),
            "relationship {} has dangling target {}",
            relationship.id,
            relationship.target_id
        );
    }
}

fn assert_distinct<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) {
    let mut seen = HashSet::new();
    for id in ids {
        assert!(seen.insert(id), "duplicate {kind} id {id}");
    }
}

/// Ids are pairwise distinct within each collection.
pub fn assert_ir_unique_ids(ir: &IrModel) {
    assert_distinct("folder", ir.folders.iter().map(|f| f.id.as_str()));
    assert_distinct("element", ir.elements.iter().map(|e| e.id.as_str()));
    assert_distinct("relationship", ir.relationships.iter().map(|r| r.id.as_str()));
    assert_distinct("view", ir.views.iter().map(|v| v.id.as_str()));
}

/// Every reference inside the stored model resolves.
pub fn assert_model_consistent(model: &Model) {
    for folder in model.folders.values() {
        if let Some(parent) = &folder.parent {
            assert!(model.folders.contains_key(parent), "folder {} parent", folder.id);
        }
    }
    for element in model.elements.values() {
        if let Some(folder) = &element.folder {
            assert!(model.folders.contains_key(folder), "element {} folder", element.id);
        }
        if let Some(parent) = &element.parent {
            assert!(model.elements.contains_key(parent), "element {} parent", element.id);
        }
    }
    for relationship in model.relationships.values() {
        assert!(model.elements.contains_key(&relationship.source));
        assert!(model.elements.contains_key(&relationship.target));
    }
    for view in model.views.values() {
        for node in view.nodes.values() {
            if let Some(element) = node.element() {
                assert!(model.elements.contains_key(element), "view {} node element", view.id);
            }
            if let Some(parent) = &node.parent {
                assert!(view.nodes.contains_key(parent), "view {} node parent", view.id);
            }
        }
        for connection in &view.connections {
            assert!(view.nodes.contains_key(&connection.source));
            assert!(view.nodes.contains_key(&connection.target));
            if let Some(relationship) = &connection.relationship {
                assert!(model.relationships.contains_key(relationship));
            }
        }
    }
}

/// Every element and relationship carries a `{system, id}` external id
/// pointing at one of `ir_ids`.
pub fn assert_external_ids_recoverable(model: &Model, system: &str, ir_ids: &[&str]) {
    let known: HashSet<&str> = ir_ids.iter().copied().collect();
    let recovered = |ids: &[archimport::model::ExternalIdRef]| {
        ids.iter()
            .find(|x| x.system == system)
            .map(|x| x.id.clone())
    };
    for element in model.elements.values() {
        let id = recovered(&element.external_ids)
            .unwrap_or_else(|| panic!("element {} has no {system} external id", element.id));
        assert!(known.contains(id.as_str()), "unexpected external id {id}");
    }
    for relationship in model.relationships.values() {
        let id = recovered(&relationship.external_ids)
            .unwrap_or_else(|| panic!("relationship {} has no {system} external id", relationship.id));
        assert!(known.contains(id.as_str()), "unexpected external id {id}");
    }
}

pub fn element<'a>(model: &'a Model, system: &str, ir_id: &str) -> &'a Element {
    model
        .element_by_external_id(system, ir_id)
        .unwrap_or_else(|| panic!("no element imported from {ir_id}"))
}

pub fn relationship<'a>(model: &'a Model, system: &str, ir_id: &str) -> &'a Relationship {
    model
        .relationship_by_external_id(system, ir_id)
        .unwrap_or_else(|| panic!("no relationship imported from {ir_id}"))
}

pub fn view_named<'a>(model: &'a Model, name: &str) -> &'a View {
    model
        .views
        .values()
        .find(|v| v.name == name)
        .unwrap_or_else(|| panic!("no view named {name}"))
}

/// Codes of all recorded issues, in order.
pub fn issue_codes(report: &ImportReport) -> Vec<&str> {
    report.issues.iter().map(|i| i.code.as_str()).collect()
}
