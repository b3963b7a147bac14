//! Normalization: the repair passes between Parse and Apply.
//!
//! Normalization is an ordered list of [`NormalizePass`] functions, each
//! taking an [`IrModel`] by value and returning a repaired one. Every
//! importer contributes its dialect pass; [`normalize_ir`] is the generic
//! pass that always runs last. After the generic pass every id referenced
//! inside the IR resolves, or the reference has been cleared and reported.
//!
//! Both passes are idempotent: feeding a normalized IR back in returns an
//! equal IR and records nothing.

pub mod common;
pub mod resolve;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::{ImportConfig, TagLimits};
use crate::import::importer::NormalizePass;
use crate::import::ir::{IrExternalId, IrTaggedValue};
use crate::import::report::sample;
use crate::import::{ImportReport, IrModel};

pub use common::{clean_text, unnamed};
pub use resolve::resolve_view_connections;

/// Options shared by all normalization passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop relationships whose endpoints do not resolve.
    pub remove_dangling_relationships: bool,
    pub tag_limits: TagLimits,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_dangling_relationships: true,
            tag_limits: TagLimits::default(),
        }
    }
}

impl From<&ImportConfig> for NormalizeOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            remove_dangling_relationships: config.remove_dangling_relationships,
            tag_limits: config.tags,
        }
    }
}

/// Run passes in order.
pub fn run_passes(
    ir: IrModel,
    passes: &[NormalizePass],
    options: &NormalizeOptions,
    report: &mut ImportReport,
) -> IrModel {
    passes.iter().fold(ir, |ir, pass| pass(ir, options, report))
}

/// The generic, dialect-independent normalization pass.
pub fn normalize_ir(ir: IrModel, options: &NormalizeOptions, report: &mut ImportReport) -> IrModel {
    let before = report.warning_count();
    let ir = dedupe_ids(ir, report);
    let ir = common::sort_by_id(ir);
    let ir = common::default_names(ir, report);
    let ir = repair_folder_refs(ir, report);
    let ir = repair_element_refs(ir, report);
    let ir = if options.remove_dangling_relationships {
        common::drop_dangling_relationships(ir, report)
    } else {
        ir
    };
    let ir = repair_views(ir, report);
    let ir = clean_annotations(ir);
    let mut ir = common::sort_by_id(ir);
    if ir.meta.imported_at_iso.is_none() {
        ir.meta.imported_at_iso = Some(
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        );
    }
    debug!(
        elements = ir.elements.len(),
        relationships = ir.relationships.len(),
        views = ir.views.len(),
        warnings = report.warning_count() - before,
        "generic normalization done"
    );
    ir
}

/// Keep the first item per id; drop empty and repeated ids.
fn dedupe_by_id<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> &str,
    kind: &str,
    report: &mut ImportReport,
) -> Vec<T> {
    let mut seen = FxHashSet::default();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let id = id_of(&item);
        if id.trim().is_empty() {
            report.warn(
                "empty-id",
                format!("{kind} without an id; dropped"),
                sample(&[("kind", kind)]),
            );
        } else if !seen.insert(id.to_string()) {
            report.warn(
                "duplicate-id",
                format!("Duplicate {kind} id; later occurrence dropped"),
                sample(&[("kind", kind), ("id", id)]),
            );
        } else {
            kept.push(item);
        }
    }
    kept
}

fn dedupe_ids(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    ir.folders = dedupe_by_id(std::mem::take(&mut ir.folders), |f| f.id.as_str(), "folder", report);
    ir.elements = dedupe_by_id(std::mem::take(&mut ir.elements), |e| e.id.as_str(), "element", report);
    ir.relationships = dedupe_by_id(
        std::mem::take(&mut ir.relationships),
        |r| r.id.as_str(),
        "relationship",
        report,
    );
    ir.views = dedupe_by_id(std::mem::take(&mut ir.views), |v| v.id.as_str(), "view", report);
    for view in &mut ir.views {
        view.nodes = dedupe_by_id(std::mem::take(&mut view.nodes), |n| n.id.as_str(), "view node", report);
        view.connections = dedupe_by_id(
            std::mem::take(&mut view.connections),
            |c| c.id.as_str(),
            "view connection",
            report,
        );
    }
    ir
}

/// Why a parent reference was reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParentDefect {
    Missing,
    SelfReference,
    Cycle,
}

impl ParentDefect {
    fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::SelfReference => "self",
            Self::Cycle => "cycle",
        }
    }
}

/// Find parent links to reset so that every chain ends at a root.
///
/// Links are examined in order; a reset is visible to later links, so each
/// cycle is broken exactly once, at its first member.
fn find_invalid_parents(links: &[(String, Option<String>)]) -> Vec<(usize, ParentDefect)> {
    let mut parents: FxHashMap<&str, Option<&str>> = links
        .iter()
        .map(|(id, parent)| (id.as_str(), parent.as_deref()))
        .collect();
    let mut defects = Vec::new();

    for (position, (id, parent)) in links.iter().enumerate() {
        let Some(parent) = parent.as_deref() else {
            continue;
        };
        let id = id.as_str();
        let defect = if parent == id {
            Some(ParentDefect::SelfReference)
        } else if !parents.contains_key(parent) {
            Some(ParentDefect::Missing)
        } else {
            let mut visited = FxHashSet::default();
            let mut cursor = Some(parent);
            let mut cyclic = false;
            while let Some(current) = cursor {
                if current == id || !visited.insert(current) {
                    cyclic = current == id;
                    break;
                }
                cursor = parents.get(current).copied().flatten();
            }
            cyclic.then_some(ParentDefect::Cycle)
        };
        if let Some(defect) = defect {
            parents.insert(id, None);
            defects.push((position, defect));
        }
    }
    defects
}

fn repair_folder_refs(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let links: Vec<_> = ir
        .folders
        .iter()
        .map(|f| (f.id.clone(), f.parent_id.clone()))
        .collect();
    for (position, defect) in find_invalid_parents(&links) {
        let folder = &mut ir.folders[position];
        report.warn(
            "invalid-folder-parent",
            "Folder parent is invalid; moved to root",
            sample(&[
                ("id", &folder.id),
                ("parentId", folder.parent_id.as_deref().unwrap_or("")),
                ("reason", defect.as_str()),
            ]),
        );
        folder.parent_id = None;
    }
    ir
}

fn repair_element_refs(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let folder_ids: FxHashSet<String> = ir.folders.iter().map(|f| f.id.clone()).collect();
    let element_ids: FxHashSet<String> = ir.elements.iter().map(|e| e.id.clone()).collect();

    for element in &mut ir.elements {
        if let Some(folder_id) = element.folder_id.as_deref() {
            if !folder_ids.contains(folder_id) {
                report.warn(
                    "missing-folder",
                    "Element references a missing folder; placed at root",
                    sample(&[("id", &element.id), ("folderId", folder_id)]),
                );
                element.folder_id = None;
            }
        }
    }

    let links: Vec<_> = ir
        .elements
        .iter()
        .map(|e| (e.id.clone(), e.parent_element_id.clone()))
        .collect();
    for (position, defect) in find_invalid_parents(&links) {
        let element = &mut ir.elements[position];
        report.warn(
            "invalid-element-parent",
            "Element parent is invalid; containment cleared",
            sample(&[
                ("id", &element.id),
                ("parentElementId", element.parent_element_id.as_deref().unwrap_or("")),
                ("reason", defect.as_str()),
            ]),
        );
        element.parent_element_id = None;
    }

    for view in &mut ir.views {
        if let Some(folder_id) = view.folder_id.as_deref() {
            if !folder_ids.contains(folder_id) {
                report.warn(
                    "missing-folder",
                    "View references a missing folder; placed at root",
                    sample(&[("id", &view.id), ("folderId", folder_id)]),
                );
                view.folder_id = None;
            }
        }
        if let Some(owner) = view.owner_element_id.as_deref() {
            if !element_ids.contains(owner) {
                report.warn(
                    "missing-view-owner",
                    "View owner element is missing; owner cleared",
                    sample(&[("id", &view.id), ("ownerElementId", owner)]),
                );
                view.owner_element_id = None;
            }
        }
    }
    ir
}

fn repair_views(mut ir: IrModel, report: &mut ImportReport) -> IrModel {
    let element_ids: FxHashSet<String> = ir.elements.iter().map(|e| e.id.clone()).collect();
    let relationship_ids: FxHashSet<String> =
        ir.relationships.iter().map(|r| r.id.clone()).collect();

    for view in &mut ir.views {
        let view_id = view.id.clone();

        for node in &mut view.nodes {
            if let Some(element_id) = node.element_id.as_deref() {
                if !element_ids.contains(element_id) {
                    report.warn(
                        "view-node-missing-element",
                        "View node references a missing element; reference cleared",
                        sample(&[("view", &view_id), ("node", &node.id), ("elementId", element_id)]),
                    );
                    node.element_id = None;
                }
            }
            if let Some(bounds) = node.bounds {
                if !bounds.is_valid() {
                    report.warn(
                        "invalid-bounds",
                        "View node bounds are not finite and positive; dropped",
                        sample(&[("view", &view_id), ("node", &node.id)]),
                    );
                    node.bounds = None;
                }
            }
        }

        let links: Vec<_> = view
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.parent_node_id.clone()))
            .collect();
        for (position, defect) in find_invalid_parents(&links) {
            let node = &mut view.nodes[position];
            report.warn(
                "invalid-node-parent",
                "View node parent is invalid; moved to view root",
                sample(&[
                    ("view", &view_id),
                    ("node", &node.id),
                    ("parentNodeId", node.parent_node_id.as_deref().unwrap_or("")),
                    ("reason", defect.as_str()),
                ]),
            );
            node.parent_node_id = None;
        }

        let node_ids: FxHashSet<String> = view.nodes.iter().map(|n| n.id.clone()).collect();
        for connection in &mut view.connections {
            let connection_id = connection.id.clone();
            let mut clear = |field: &str, slot: &mut Option<String>, valid: &FxHashSet<String>| {
                if let Some(value) = slot.as_deref() {
                    if !valid.contains(value) {
                        report.warn(
                            "view-connection-dangling-ref",
                            "View connection reference does not resolve; reference cleared",
                            sample(&[
                                ("view", &view_id),
                                ("connection", &connection_id),
                                ("field", field),
                                ("value", value),
                            ]),
                        );
                        *slot = None;
                    }
                }
            };
            clear("relationshipId", &mut connection.relationship_id, &relationship_ids);
            clear("sourceNodeId", &mut connection.source_node_id, &node_ids);
            clear("targetNodeId", &mut connection.target_node_id, &node_ids);
            clear("sourceElementId", &mut connection.source_element_id, &element_ids);
            clear("targetElementId", &mut connection.target_element_id, &element_ids);

            let total = connection.points.len();
            connection.points.retain(|p| p.is_finite());
            if connection.points.len() != total {
                report.warn(
                    "invalid-points",
                    "View connection has non-finite points; dropped",
                    sample(&[
                        ("view", &view_id),
                        ("connection", &connection_id),
                        ("dropped", &(total - connection.points.len()).to_string()),
                    ]),
                );
            }
        }
    }
    ir
}

fn clean_tagged_values(values: Vec<IrTaggedValue>) -> Vec<IrTaggedValue> {
    let mut seen = FxHashSet::default();
    values
        .into_iter()
        .map(|t| IrTaggedValue::new(t.key.trim(), t.value.trim()))
        .filter(|t| !t.key.is_empty() && seen.insert((t.key.clone(), t.value.clone())))
        .collect()
}

fn clean_external_ids(ids: Vec<IrExternalId>) -> Vec<IrExternalId> {
    let mut seen = FxHashSet::default();
    ids.into_iter()
        .map(|x| IrExternalId {
            system: x.system.trim().to_string(),
            id: x.id.trim().to_string(),
            kind: x
                .kind
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        })
        .filter(|x| {
            !x.system.is_empty()
                && !x.id.is_empty()
                && seen.insert((x.system.clone(), x.id.clone(), x.kind.clone()))
        })
        .collect()
}

fn clean_annotations(mut ir: IrModel) -> IrModel {
    for folder in &mut ir.folders {
        folder.tagged_values = clean_tagged_values(std::mem::take(&mut folder.tagged_values));
        folder.external_ids = clean_external_ids(std::mem::take(&mut folder.external_ids));
    }
    for element in &mut ir.elements {
        element.tagged_values = clean_tagged_values(std::mem::take(&mut element.tagged_values));
        element.external_ids = clean_external_ids(std::mem::take(&mut element.external_ids));
    }
    for relationship in &mut ir.relationships {
        relationship.tagged_values =
            clean_tagged_values(std::mem::take(&mut relationship.tagged_values));
        relationship.external_ids =
            clean_external_ids(std::mem::take(&mut relationship.external_ids));
    }
    for view in &mut ir.views {
        view.tagged_values = clean_tagged_values(std::mem::take(&mut view.tagged_values));
        view.external_ids = clean_external_ids(std::mem::take(&mut view.external_ids));
    }
    ir
}
