//! ArchiMate Model Exchange File import tests.

use archimport::import::ir::{IrValue, IrViewNodeKind, keys};
use archimport::import::meff::{FORMAT, sniff_meff};
use archimport::import::{ParsedImport, SniffContext, parse_and_normalize};
use archimport::{ImportConfig, IrModel};

use crate::helpers::model_assertions::*;
use crate::helpers::source_fixtures::{MEFF_BANK, MEFF_BANK_NS0, MEFF_LEGACY};

fn normalized(source: &str) -> ParsedImport {
    parse_and_normalize(source.as_bytes(), "model.xml", None, &ImportConfig::default())
        .expect("MEFF import")
}

/// The IR with its import timestamp cleared, for comparisons across runs.
fn without_timestamp(mut ir: IrModel) -> IrModel {
    ir.meta.imported_at_iso = None;
    ir
}

// =============================================================================
// NAMESPACE TOLERANCE
// =============================================================================

#[test]
fn test_prefixed_document_sniffs_like_unprefixed() {
    assert!(sniff_meff(&SniffContext::from_text(MEFF_BANK, "model.xml")));
    assert!(sniff_meff(&SniffContext::from_text(MEFF_BANK_NS0, "model.xml")));
}

#[test]
fn test_prefixed_document_parses_identically() {
    let plain = normalized(MEFF_BANK);
    let prefixed = normalized(MEFF_BANK_NS0);
    assert_eq!(plain.importer, FORMAT);
    assert_eq!(prefixed.importer, FORMAT);

    let (plain, prefixed) = (plain.ir, prefixed.ir);
    assert_eq!(plain.elements.len(), prefixed.elements.len());
    assert_eq!(plain.relationships.len(), prefixed.relationships.len());
    assert_eq!(plain.views.len(), prefixed.views.len());
    assert_eq!(plain.views[0].nodes.len(), prefixed.views[0].nodes.len());
    assert_eq!(
        plain.views[0].connections.len(),
        prefixed.views[0].connections.len()
    );
    assert_eq!(without_timestamp(plain), without_timestamp(prefixed));
}

// =============================================================================
// CONTENT
// =============================================================================

#[test]
fn test_elements_relationships_and_properties() {
    let parsed = normalized(MEFF_BANK);
    let ir = &parsed.ir;
    assert_eq!(ir.meta.model_name.as_deref(), Some("Bank"));
    assert_eq!(ir.meta.documentation.as_deref(), Some("Retail banking landscape"));
    assert_eq!(ir.elements.len(), 4);
    assert_eq!(ir.relationships.len(), 2);

    let customer = ir.element("a").expect("customer");
    assert_eq!(customer.type_name, "BusinessActor");
    assert_eq!(customer.name, "Customer");
    assert_eq!(customer.tagged_values.len(), 1);
    assert_eq!(customer.tagged_values[0].key, "Priority");
    assert_eq!(customer.tagged_values[0].value, "High");
    assert!(!customer.meta.contains_key(keys::EXTENSION_TAGS));

    let access = ir.relationship("r2").expect("access");
    assert_eq!(access.attrs["accessType"].as_str(), Some("Read"));

    // Unknown tokens survive normalization untouched; Apply decides.
    assert_eq!(ir.element("x").map(|e| e.type_name.as_str()), Some("TotallyMadeUp"));
}

#[test]
fn test_organizations_become_folders() {
    let parsed = normalized(MEFF_BANK);
    let ir = &parsed.ir;
    assert_eq!(ir.folders.len(), 2);
    let folder_named = |name: &str| {
        ir.folders
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.id.clone())
            .expect("folder")
    };
    let business = folder_named("Business");
    let views = folder_named("Views");
    for id in ["a", "b", "c"] {
        assert_eq!(
            ir.element(id).and_then(|e| e.folder_id.clone()),
            Some(business.clone())
        );
    }
    assert_eq!(ir.element("x").and_then(|e| e.folder_id.clone()), None);
    assert_eq!(ir.view("v1").and_then(|v| v.folder_id.clone()), Some(views));
}

#[test]
fn test_view_nodes_and_reverse_resolution() {
    let parsed = normalized(MEFF_BANK);
    let view = parsed.ir.view("v1").expect("view");
    assert_eq!(view.viewpoint.as_deref(), Some("Layered"));
    assert_eq!(view.nodes.len(), 4);

    let group = view.node("g1").expect("group");
    assert_eq!(group.kind, IrViewNodeKind::Group);
    assert_eq!(group.label.as_deref(), Some("Customers"));
    assert_eq!(
        view.node("n1").and_then(|n| n.parent_node_id.as_deref()),
        Some("g1")
    );

    let drawn = view
        .connections
        .iter()
        .find(|c| c.id == "c1")
        .expect("c1");
    assert_eq!(drawn.relationship_id.as_deref(), Some("r1"));
    assert_eq!(drawn.points.len(), 1);

    // c2 was drawn c→b; only b→c exists, so it is flipped onto r2.
    let inferred = view
        .connections
        .iter()
        .find(|c| c.id == "c2")
        .expect("c2");
    assert_eq!(inferred.relationship_id.as_deref(), Some("r2"));
    assert_eq!(inferred.source_node_id.as_deref(), Some("n2"));
    assert_eq!(inferred.target_node_id.as_deref(), Some("n3"));
    assert_eq!(inferred.meta.get(keys::REVERSED), Some(&IrValue::Boolean(true)));
}

#[test]
fn test_normalized_ir_invariants() {
    let parsed = normalized(MEFF_BANK);
    assert_ir_referential_integrity(&parsed.ir);
    assert_ir_unique_ids(&parsed.ir);
}

// =============================================================================
// LEGACY 2.1 EXPORTS
// =============================================================================

#[test]
fn test_legacy_vocabulary_is_canonicalized() {
    let parsed = normalized(MEFF_LEGACY);
    let ir = &parsed.ir;
    assert_eq!(ir.element("s").map(|e| e.type_name.as_str()), Some("TechnologyService"));
    assert_eq!(ir.element("s").map(|e| e.name.as_str()), Some("Hosting"));

    let junction = ir.element("j").expect("junction");
    assert_eq!(junction.type_name, "Junction");
    assert_eq!(junction.attrs["junctionType"].as_str(), Some("or"));
    assert_eq!(junction.name, "Unnamed (Junction)");

    assert_eq!(ir.relationship("u").map(|r| r.type_name.as_str()), Some("Serving"));

    let view = ir.view("v").expect("view");
    assert_eq!(view.name, "Hosting");
    assert_eq!(view.nodes.len(), 2);
    assert_eq!(view.connections[0].relationship_id.as_deref(), Some("u"));
}

#[test]
fn test_organization_reference_to_unknown_id_is_reported() {
    let parsed = normalized(
        r#"<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
                  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
             <elements>
               <element identifier="a" xsi:type="Node"><name>Server</name></element>
             </elements>
             <organizations>
               <item><label>Technology</label><item identifierRef="ghost"/></item>
             </organizations>
           </model>"#,
    );
    assert_eq!(parsed.report.count_of("organization-dangling-ref"), 1);
    assert_eq!(parsed.ir.elements.len(), 1);
}
