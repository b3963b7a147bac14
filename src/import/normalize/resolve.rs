//! Infers the relationship a view connection depicts when the exporter
//! drew the edge without naming it.
//!
//! Only an unambiguous match is taken: one forward match, or one reverse
//! match with no forward match (the connection is then flipped so the
//! rendered arrow follows the relationship). Parallel relationships between
//! the same two elements are left alone and reported.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::import::ir::{IrValue, IrView, IrViewConnection, keys};
use crate::import::report::sample;
use crate::import::{ImportReport, IrModel};

type EndpointIndex = FxHashMap<(String, String), Vec<String>>;

fn build_index(ir: &IrModel) -> EndpointIndex {
    let mut index = EndpointIndex::default();
    for relationship in &ir.relationships {
        index
            .entry((relationship.source_id.clone(), relationship.target_id.clone()))
            .or_default()
            .push(relationship.id.clone());
    }
    index
}

fn endpoint_elements(view: &IrView, connection: &IrViewConnection) -> Option<(String, String)> {
    let from_node = |node_id: &Option<String>| {
        node_id
            .as_deref()
            .and_then(|id| view.node(id))
            .and_then(|node| node.element_id.clone())
    };
    let source = from_node(&connection.source_node_id).or(connection.source_element_id.clone())?;
    let target = from_node(&connection.target_node_id).or(connection.target_element_id.clone())?;
    Some((source, target))
}

fn is_marked_ambiguous(connection: &IrViewConnection) -> bool {
    connection
        .meta
        .get(keys::RELATIONSHIP_AMBIGUOUS)
        .and_then(IrValue::as_bool)
        .unwrap_or(false)
}

enum Resolution {
    Forward(String),
    Reverse(String),
    Ambiguous(usize),
    Unmatched,
}

fn resolve_one(index: &EndpointIndex, source: &str, target: &str) -> Resolution {
    let lookup = |a: &str, b: &str| {
        index
            .get(&(a.to_string(), b.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    };
    let forward = lookup(source, target);
    // A self-loop's reverse key is its forward key.
    let reverse = if source == target { &[][..] } else { lookup(target, source) };

    match (forward, reverse) {
        ([only], []) => Resolution::Forward(only.clone()),
        ([], [only]) => Resolution::Reverse(only.clone()),
        ([], []) => Resolution::Unmatched,
        (f, r) => Resolution::Ambiguous(f.len() + r.len()),
    }
}

/// Fill in missing `relationship_id`s on view connections.
pub fn resolve_view_connections(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let index = build_index(&ir);
    if index.is_empty() {
        return ir;
    }

    for view in &mut ir.views {
        let mut updates: Vec<(usize, Resolution)> = Vec::new();
        for (position, connection) in view.connections.iter().enumerate() {
            if connection.relationship_id.is_some() || is_marked_ambiguous(connection) {
                continue;
            }
            let Some((source, target)) = endpoint_elements(view, connection) else {
                continue;
            };
            match resolve_one(&index, &source, &target) {
                Resolution::Unmatched => {}
                Resolution::Ambiguous(candidates) => {
                    report.warn(
                        "view-connection-ambiguous",
                        "View connection matches several relationships; left unresolved",
                        sample(&[
                            ("view", &view.id),
                            ("connection", &connection.id),
                            ("sourceElementId", &source),
                            ("targetElementId", &target),
                            ("candidates", &candidates.to_string()),
                        ]),
                    );
                    updates.push((position, Resolution::Ambiguous(candidates)));
                }
                resolved => updates.push((position, resolved)),
            }
        }

        for (position, resolution) in updates {
            let connection = &mut view.connections[position];
            match resolution {
                Resolution::Forward(relationship_id) => {
                    trace!(connection = %connection.id, %relationship_id, "resolved connection");
                    connection.relationship_id = Some(relationship_id);
                }
                Resolution::Reverse(relationship_id) => {
                    trace!(connection = %connection.id, %relationship_id, "resolved reversed connection");
                    connection.relationship_id = Some(relationship_id);
                    std::mem::swap(&mut connection.source_node_id, &mut connection.target_node_id);
                    std::mem::swap(
                        &mut connection.source_element_id,
                        &mut connection.target_element_id,
                    );
                    connection.points.reverse();
                    connection
                        .meta
                        .insert(keys::REVERSED.to_string(), IrValue::Boolean(true));
                }
                Resolution::Ambiguous(_) => {
                    connection
                        .meta
                        .insert(keys::RELATIONSHIP_AMBIGUOUS.to_string(), IrValue::Boolean(true));
                }
                Resolution::Unmatched => {}
            }
        }
    }
    ir
}
