//! Repair steps shared by the dialect-specific normalization passes.
//!
//! Each step takes the IR by value and hands back the repaired IR. A step
//! emits exactly one report entry per item it drops or defaults.

use rustc_hash::FxHashSet;
use tracing::trace;

use super::NormalizeOptions;
use super::resolve::resolve_view_connections;
use crate::config::TagLimits;
use crate::import::ir::{IrAttrs, IrTaggedValue, IrValue, keys};
use crate::import::report::sample;
use crate::import::{ImportReport, IrModel};

/// The fixed tail of every dialect pass, run after its own containment and
/// extraction logic.
pub fn finish_format_pass(
    ir: IrModel,
    options: &NormalizeOptions,
    report: &mut ImportReport,
) -> IrModel {
    let ir = clean_documentation(ir);
    let ir = default_names(ir, report);
    let ir = extract_extension_tags(ir, &options.tag_limits, report);
    let ir = if options.remove_dangling_relationships {
        drop_dangling_relationships(ir, report)
    } else {
        ir
    };
    let ir = drop_dangling_view_refs(ir, report);
    let ir = resolve_view_connections(ir, report);
    sort_by_id(ir)
}

/// Normalize line endings (CRLF/CR → LF) and trim.
pub fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

fn clean_opt(text: Option<String>) -> Option<String> {
    text.map(|t| clean_text(&t)).filter(|t| !t.is_empty())
}

/// Clean every documentation field; blank documentation becomes `None`.
pub fn clean_documentation(mut ir: IrModel) -> IrModel {
    ir.meta.documentation = clean_opt(ir.meta.documentation.take());
    for folder in &mut ir.folders {
        folder.documentation = clean_opt(folder.documentation.take());
    }
    for element in &mut ir.elements {
        element.documentation = clean_opt(element.documentation.take());
    }
    for relationship in &mut ir.relationships {
        relationship.documentation = clean_opt(relationship.documentation.take());
    }
    for view in &mut ir.views {
        view.documentation = clean_opt(view.documentation.take());
    }
    ir
}

/// The fallback name for an entity of the given type.
pub fn unnamed(type_name: &str) -> String {
    format!("Unnamed ({type_name})")
}

/// Give every folder, element and view a non-empty name.
pub fn default_names(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    for folder in &mut ir.folders {
        if folder.name.trim().is_empty() {
            folder.name = unnamed("folder");
            report.warn(
                "missing-name",
                "Folder has no name; using a placeholder",
                sample(&[("id", &folder.id)]),
            );
        } else {
            folder.name = folder.name.trim().to_string();
        }
    }
    for element in &mut ir.elements {
        if element.name.trim().is_empty() {
            element.name = unnamed(&element.type_name);
            report.warn(
                "missing-name",
                "Element has no name; using a placeholder",
                sample(&[("id", &element.id), ("type", &element.type_name)]),
            );
        } else {
            element.name = element.name.trim().to_string();
        }
    }
    for relationship in &mut ir.relationships {
        relationship.name = relationship
            .name
            .take()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
    }
    for view in &mut ir.views {
        if view.name.trim().is_empty() {
            view.name = unnamed("view");
            report.warn(
                "missing-name",
                "View has no name; using a placeholder",
                sample(&[("id", &view.id)]),
            );
        } else {
            view.name = view.name.trim().to_string();
        }
    }
    ir
}

/// Append a raw extension key/value to an entity's meta for later extraction.
pub fn push_extension_tag(meta: &mut IrAttrs, key: &str, value: &str) {
    let mut entry = IrAttrs::new();
    entry.insert("key".to_string(), IrValue::from(key));
    entry.insert("value".to_string(), IrValue::from(value));
    let slot = meta
        .entry(keys::EXTENSION_TAGS.to_string())
        .or_insert_with(|| IrValue::List(Vec::new()));
    if let IrValue::List(list) = slot {
        list.push(IrValue::Map(entry));
    }
}

fn take_extension_tags(meta: &mut IrAttrs) -> Vec<(String, String)> {
    let Some(raw) = meta.shift_remove(keys::EXTENSION_TAGS) else {
        return Vec::new();
    };
    let entries = match raw {
        IrValue::List(list) => list,
        other => vec![other],
    };
    entries
        .iter()
        .filter_map(IrValue::as_map)
        .filter_map(|m| {
            let key = m.get("key").and_then(IrValue::as_str)?;
            let value = m.get("value").and_then(IrValue::as_str).unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn merge_tags(
    owner_id: &str,
    raw: Vec<(String, String)>,
    tagged_values: &mut Vec<IrTaggedValue>,
    limits: &TagLimits,
    report: &mut ImportReport,
) {
    let mut overflow = 0usize;
    for (key, value) in raw {
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            continue;
        }
        if key.chars().count() > limits.max_key_length {
            report.warn(
                "extension-tag-key-too-long",
                format!("Extension tag key exceeds {} characters; tag dropped", limits.max_key_length),
                sample(&[("owner", owner_id), ("key", key)]),
            );
            continue;
        }
        if tagged_values.iter().any(|t| t.key == key) {
            continue;
        }
        if tagged_values.len() >= limits.max_tags {
            overflow += 1;
            continue;
        }
        let value = if value.chars().count() > limits.max_value_length {
            report.warn(
                "extension-tag-value-truncated",
                format!("Extension tag value exceeds {} characters; truncated", limits.max_value_length),
                sample(&[("owner", owner_id), ("key", key)]),
            );
            value.chars().take(limits.max_value_length).collect()
        } else {
            value.to_string()
        };
        tagged_values.push(IrTaggedValue::new(key, value));
    }
    if overflow > 0 {
        report.warn(
            "extension-tags-capped",
            format!("More than {} extension tags; extra tags dropped", limits.max_tags),
            sample(&[("owner", owner_id), ("dropped", &overflow.to_string())]),
        );
    }
}

/// Move raw extension key/values into tagged values, applying the size caps.
pub fn extract_extension_tags(
    mut ir: IrModel,
    limits: &TagLimits,
    report: &mut ImportReport,
) -> IrModel {
    for element in &mut ir.elements {
        let raw = take_extension_tags(&mut element.meta);
        merge_tags(&element.id, raw, &mut element.tagged_values, limits, report);
    }
    for relationship in &mut ir.relationships {
        let raw = take_extension_tags(&mut relationship.meta);
        merge_tags(&relationship.id, raw, &mut relationship.tagged_values, limits, report);
    }
    for view in &mut ir.views {
        let raw = take_extension_tags(&mut view.meta);
        merge_tags(&view.id, raw, &mut view.tagged_values, limits, report);
    }
    ir
}

/// Drop relationships whose endpoints are not elements of this IR.
pub fn drop_dangling_relationships(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let element_ids: FxHashSet<&str> = ir.elements.iter().map(|e| e.id.as_str()).collect();
    let mut kept = Vec::with_capacity(ir.relationships.len());
    for relationship in std::mem::take(&mut ir.relationships) {
        let source_ok = element_ids.contains(relationship.source_id.as_str());
        let target_ok = element_ids.contains(relationship.target_id.as_str());
        if source_ok && target_ok {
            kept.push(relationship);
        } else {
            trace!(id = %relationship.id, "dropping dangling relationship");
            report.warn(
                "relationship-dangling-endpoint",
                "Relationship references a missing element; dropped",
                sample(&[
                    ("id", &relationship.id),
                    ("sourceId", &relationship.source_id),
                    ("targetId", &relationship.target_id),
                ]),
            );
        }
    }
    ir.relationships = kept;
    ir
}

/// Drop view nodes bound to missing elements and connections bound to
/// missing relationships or nodes.
pub fn drop_dangling_view_refs(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let element_ids: FxHashSet<String> = ir.elements.iter().map(|e| e.id.clone()).collect();
    let relationship_ids: FxHashSet<String> =
        ir.relationships.iter().map(|r| r.id.clone()).collect();

    for view in &mut ir.views {
        let view_id = view.id.clone();
        view.nodes.retain(|node| match &node.element_id {
            Some(element_id) if !element_ids.contains(element_id) => {
                report.warn(
                    "view-node-dangling-element",
                    "View node references a missing element; dropped",
                    sample(&[("view", &view_id), ("node", &node.id), ("elementId", element_id)]),
                );
                false
            }
            _ => true,
        });

        let node_ids: FxHashSet<String> = view.nodes.iter().map(|n| n.id.clone()).collect();
        view.connections.retain(|connection| {
            if let Some(relationship_id) = &connection.relationship_id {
                if !relationship_ids.contains(relationship_id) {
                    report.warn(
                        "view-connection-dangling-relationship",
                        "View connection references a missing relationship; dropped",
                        sample(&[
                            ("view", &view_id),
                            ("connection", &connection.id),
                            ("relationshipId", relationship_id),
                        ]),
                    );
                    return false;
                }
            }
            let missing_node = [&connection.source_node_id, &connection.target_node_id]
                .into_iter()
                .flatten()
                .find(|id| !node_ids.contains(*id));
            if let Some(node_id) = missing_node {
                report.warn(
                    "view-connection-dangling-node",
                    "View connection references a missing node; dropped",
                    sample(&[("view", &view_id), ("connection", &connection.id), ("nodeId", node_id)]),
                );
                return false;
            }
            true
        });
    }
    ir
}

/// Impose id ordering on every collection.
pub fn sort_by_id(mut ir: IrModel) -> IrModel {
    ir.folders.sort_by(|a, b| a.id.cmp(&b.id));
    ir.elements.sort_by(|a, b| a.id.cmp(&b.id));
    ir.relationships.sort_by(|a, b| a.id.cmp(&b.id));
    ir.views.sort_by(|a, b| a.id.cmp(&b.id));
    for view in &mut ir.views {
        view.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        view.connections.sort_by(|a, b| a.id.cmp(&b.id));
    }
    ir
}
