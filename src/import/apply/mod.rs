//! Apply: the only stage with side effects.
//!
//! A normalized [`IrModel`] is turned into domain objects through a
//! [`ModelSink`]. Every IR id gets a freshly generated internal id; the
//! remapping tables are returned in [`IdMappings`] and every created object
//! also carries an external id `{system: source_system, id: <IR id>}`.
//!
//! Failures are per item: a create call the sink refuses becomes a warning
//! and the loop continues. Only a failed model allocation aborts.

mod sink;
mod types;

pub use sink::{ModelSink, SinkError};
pub use types::{
    ARCHIMATE_ELEMENTS, ARCHIMATE_RELATIONSHIPS, DEFAULT_VIEWPOINT, ResolvedType, VIEWPOINTS,
    guess_layer, resolve_element_type, resolve_relationship_type, resolve_viewpoint,
};

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use crate::config::{ImportConfig, UnknownTypePolicy};
use crate::import::ir::{
    IrAttrs, IrExternalId, IrTaggedValue, IrValue, IrView, IrViewNode, IrViewNodeKind, keys,
};
use crate::import::report::{merge_counts_max, sample};
use crate::import::{ImportError, ImportReport, IrModel};
use crate::model::{
    Attributes, Bounds, Element, ElementId, ExternalIdRef, Folder, FolderId, ModelId, NewModel,
    Point, Relationship, RelationshipId, TaggedValue, UNKNOWN_TYPE, UnknownType, View,
    ViewConnection, ViewId, ViewNode, ViewNodeContent, ViewNodeId, ViewObjectKind,
};

/// Name given to the model when neither the options nor the document name one.
pub const DEFAULT_MODEL_NAME: &str = "Imported model";

// ============================================================================
// OPTIONS AND RESULTS
// ============================================================================

/// Options for one Apply call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOptions {
    /// `system` of the external ids Apply adds, and namespace of unknown types.
    pub source_system: String,
    pub unknown_type_policy: UnknownTypePolicy,
    /// Overrides the document's model name.
    pub model_name: Option<String>,
    /// Extra metadata stored on the allocated model.
    pub metadata: IndexMap<String, String>,
}

impl ApplyOptions {
    pub fn new(source_system: impl Into<String>) -> Self {
        Self {
            source_system: source_system.into(),
            unknown_type_policy: UnknownTypePolicy::default(),
            model_name: None,
            metadata: IndexMap::new(),
        }
    }

    /// Options from an import configuration; `default_system` applies when
    /// the configuration does not override the source system.
    pub fn from_config(config: &ImportConfig, default_system: &str) -> Self {
        Self {
            source_system: config
                .source_system
                .clone()
                .unwrap_or_else(|| default_system.to_string()),
            unknown_type_policy: config.unknown_type_policy,
            model_name: config.model_name.clone(),
            metadata: IndexMap::new(),
        }
    }

    pub fn with_unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_type_policy = policy;
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// IR id → internal id tables built during Apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdMappings {
    pub folders: IndexMap<String, FolderId>,
    pub elements: IndexMap<String, ElementId>,
    pub relationships: IndexMap<String, RelationshipId>,
    pub views: IndexMap<String, ViewId>,
    /// Per IR view id: IR node id → internal node id.
    pub view_nodes: IndexMap<String, IndexMap<String, ViewNodeId>>,
}

impl IdMappings {
    pub fn folder(&self, ir_id: &str) -> Option<&FolderId> {
        self.folders.get(ir_id)
    }

    pub fn element(&self, ir_id: &str) -> Option<&ElementId> {
        self.elements.get(ir_id)
    }

    pub fn relationship(&self, ir_id: &str) -> Option<&RelationshipId> {
        self.relationships.get(ir_id)
    }

    pub fn view(&self, ir_id: &str) -> Option<&ViewId> {
        self.views.get(ir_id)
    }

    pub fn view_node(&self, ir_view_id: &str, ir_node_id: &str) -> Option<&ViewNodeId> {
        self.view_nodes.get(ir_view_id)?.get(ir_node_id)
    }
}

/// Outcome of a successful Apply.
#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub model_id: ModelId,
    pub mappings: IdMappings,
    pub report: ImportReport,
}

// ============================================================================
// APPLY
// ============================================================================

/// Create a new model in `sink` from a normalized IR.
///
/// `report` is the running report of the earlier stages, if any; Apply
/// records into it and returns it.
pub fn apply_ir<S: ModelSink + ?Sized>(
    ir: IrModel,
    sink: &mut S,
    options: &ApplyOptions,
    report: Option<ImportReport>,
) -> Result<ApplyResult, ImportError> {
    let mut report = report.unwrap_or_else(|| ImportReport::new(options.source_system.clone()));

    let model_id = match sink.create_model(new_model(&ir, options)) {
        Ok(id) => id,
        Err(err) => {
            warn!(error = %err, "model allocation failed");
            return Err(ImportError::ModelAllocation(err));
        }
    };
    debug!(model = %model_id, "applying IR");

    let mut applier = Applier {
        ir: &ir,
        sink: &mut *sink,
        model: model_id.clone(),
        options,
        report: &mut report,
        mappings: IdMappings::default(),
        pending_refs: Vec::new(),
        failed_folders: FxHashSet::default(),
        visiting_folders: FxHashSet::default(),
    };
    applier.folders();
    applier.elements();
    applier.relationships();
    applier.element_refs();
    applier.views();
    let Applier { mappings, .. } = applier;

    finalize(&*sink, &model_id, &mut report);
    debug!(
        model = %model_id,
        folders = mappings.folders.len(),
        elements = mappings.elements.len(),
        relationships = mappings.relationships.len(),
        views = mappings.views.len(),
        warnings = report.warning_count(),
        "apply done"
    );

    Ok(ApplyResult {
        model_id,
        mappings,
        report,
    })
}

fn new_model(ir: &IrModel, options: &ApplyOptions) -> NewModel {
    let name = options
        .model_name
        .clone()
        .or_else(|| ir.meta.model_name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

    let mut metadata = options.metadata.clone();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(value) = value {
            metadata
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    };
    put("sourceSystem", Some(options.source_system.as_str()));
    put("importFormat", ir.meta.format.as_deref());
    put("sourceTool", ir.meta.tool.as_deref());
    put("sourceToolVersion", ir.meta.tool_version.as_deref());
    put("importedAt", ir.meta.imported_at_iso.as_deref());
    for (key, value) in &ir.meta.extra {
        put(key.as_str(), value.as_str());
    }

    NewModel {
        name,
        documentation: ir.meta.documentation.clone(),
        metadata,
    }
}

/// Which id space an attribute value points into.
#[derive(Clone, Copy, Debug)]
enum RefTarget {
    Element,
    Relationship,
}

fn ref_target(key: &str) -> Option<RefTarget> {
    match key {
        keys::ATTACHED_TO_REF | keys::ASSOCIATION_CLASS_ELEMENT_ID => Some(RefTarget::Element),
        keys::ASSOCIATION_RELATIONSHIP_ID | keys::DEFAULT_FLOW => Some(RefTarget::Relationship),
        _ => None,
    }
}

/// Element attr that names another object; set once every relationship exists.
#[derive(Debug)]
struct PendingRef {
    owner: String,
    element: ElementId,
    key: String,
    target: RefTarget,
    ir_ref: String,
}

struct Applier<'a, S: ?Sized> {
    ir: &'a IrModel,
    sink: &'a mut S,
    model: ModelId,
    options: &'a ApplyOptions,
    report: &'a mut ImportReport,
    mappings: IdMappings,
    pending_refs: Vec<PendingRef>,
    failed_folders: FxHashSet<String>,
    visiting_folders: FxHashSet<String>,
}

impl<'a, S: ModelSink + ?Sized> Applier<'a, S> {
    fn system(&self) -> &str {
        &self.options.source_system
    }

    fn skips_unknown(&self) -> bool {
        self.options.unknown_type_policy == UnknownTypePolicy::Skip
    }

    // ------------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------------

    fn folders(&mut self) {
        let ir = self.ir;
        for folder in &ir.folders {
            self.ensure_folder(&folder.id);
        }
    }

    /// Create a folder (and its ancestors) on first use.
    fn ensure_folder(&mut self, ir_id: &str) -> Option<FolderId> {
        if let Some(id) = self.mappings.folders.get(ir_id) {
            return Some(id.clone());
        }
        if self.failed_folders.contains(ir_id) || !self.visiting_folders.insert(ir_id.to_string()) {
            return None;
        }

        let ir = self.ir;
        let folder = match ir.folder(ir_id) {
            Some(source) => {
                let parent = source
                    .parent_id
                    .as_deref()
                    .and_then(|parent| self.ensure_folder(parent));
                let mut folder = Folder::new(FolderId::generate(), source.name.clone());
                folder.parent = parent;
                folder.documentation = source.documentation.clone();
                folder.tagged_values = tagged_values(&source.tagged_values);
                folder.external_ids = external_ids(&source.external_ids, self.system(), &source.id);
                folder
            }
            None => {
                self.report.warn(
                    "folder-placeholder",
                    "Referenced folder is not defined; placeholder created at the root",
                    sample(&[("id", ir_id)]),
                );
                let mut folder = Folder::new(FolderId::generate(), format!("Missing folder ({ir_id})"));
                folder
                    .external_ids
                    .push(ExternalIdRef::new(self.system(), ir_id));
                folder
            }
        };
        self.visiting_folders.remove(ir_id);

        let id = folder.id.clone();
        match self.sink.create_folder(&self.model, folder) {
            Ok(()) => {
                self.mappings.folders.insert(ir_id.to_string(), id.clone());
                Some(id)
            }
            Err(err) => {
                self.failed_folders.insert(ir_id.to_string());
                self.report.warn(
                    "folder-create-failed",
                    "Folder could not be created",
                    sample(&[("id", ir_id), ("error", &err.to_string())]),
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------------

    fn elements(&mut self) {
        let ir = self.ir;
        let mut planned = Vec::with_capacity(ir.elements.len());
        for element in &ir.elements {
            let resolved = resolve_element_type(&element.type_name);
            if resolved.is_unknown() && self.skips_unknown() {
                self.report.warn(
                    "unknown-type-skipped",
                    "Element of unknown type skipped",
                    sample(&[("id", &element.id), ("type", &element.type_name)]),
                );
                continue;
            }
            self.mappings
                .elements
                .insert(element.id.clone(), ElementId::generate());
            planned.push((element, resolved));
        }

        let depths = nesting_depths(
            ir.elements
                .iter()
                .map(|e| (e.id.as_str(), e.parent_element_id.as_deref())),
        );
        planned.sort_by_key(|(e, _)| depths.get(e.id.as_str()).copied().unwrap_or(0));

        for (source, resolved) in planned {
            let Some(id) = self.mappings.elements.get(&source.id).cloned() else {
                continue;
            };
            let parent = source
                .parent_element_id
                .as_deref()
                .and_then(|parent| self.mapped_element(parent, "element-parent-unmapped", &source.id));

            let mut element = Element::new(id, resolved.type_name(), source.name.clone());
            element.layer = resolved.layer();
            element.documentation = source.documentation.clone();
            element.folder = source
                .folder_id
                .as_deref()
                .and_then(|folder| self.ensure_folder(folder));
            element.parent = parent;
            element.tagged_values = tagged_values(&source.tagged_values);
            element.external_ids = external_ids(&source.external_ids, self.system(), &source.id);
            let mut refs = Vec::new();
            for (key, value) in &source.attrs {
                match (ref_target(key), value.as_str()) {
                    (Some(target), Some(ir_ref)) => refs.push((key, target, ir_ref)),
                    _ => {
                        element.attrs.insert(key.clone(), to_json(value));
                    }
                }
            }
            if let ResolvedType::Unknown { token, .. } = &resolved {
                element.unknown_type = Some(UnknownType {
                    ns: self.system().to_string(),
                    name: token.clone(),
                });
                self.report.info(
                    "unknown-element-type",
                    "Element type not recognized; imported as Unknown",
                    sample(&[("id", &source.id), ("type", token)]),
                );
            }

            let created = element.id.clone();
            match self.sink.create_element(&self.model, element) {
                Ok(()) => {
                    for (key, target, ir_ref) in refs {
                        self.pending_refs.push(PendingRef {
                            owner: source.id.clone(),
                            element: created.clone(),
                            key: key.clone(),
                            target,
                            ir_ref: ir_ref.to_string(),
                        });
                    }
                }
                Err(err) => {
                    self.mappings.elements.shift_remove(&source.id);
                    self.report.warn(
                        "element-create-failed",
                        "Element could not be created",
                        sample(&[
                            ("id", &source.id),
                            ("name", &source.name),
                            ("error", &err.to_string()),
                        ]),
                    );
                }
            }
        }
    }

    fn mapped_element(&mut self, ir_id: &str, code: &str, owner: &str) -> Option<ElementId> {
        match self.mappings.elements.get(ir_id) {
            Some(id) => Some(id.clone()),
            None => {
                self.report.warn(
                    code,
                    "Referenced element was not created; reference cleared",
                    sample(&[("id", owner), ("ref", ir_id)]),
                );
                None
            }
        }
    }

    /// Internal id of a created object, as an attr value.
    fn resolve_ref(
        &mut self,
        target: RefTarget,
        ir_ref: &str,
        owner: &str,
        key: &str,
    ) -> Option<serde_json::Value> {
        let mapped = match target {
            RefTarget::Element => self.mappings.elements.get(ir_ref).map(ToString::to_string),
            RefTarget::Relationship => self
                .mappings
                .relationships
                .get(ir_ref)
                .map(ToString::to_string),
        };
        if mapped.is_none() {
            self.report.warn(
                "attribute-ref-unmapped",
                "Attribute references an object that was not imported; dropped",
                sample(&[("id", owner), ("attr", key), ("ref", ir_ref)]),
            );
        }
        mapped.map(serde_json::Value::String)
    }

    /// Convert attrs, rewriting IR back-references to internal ids.
    fn rewrite_attrs(&mut self, attrs: &IrAttrs, owner: &str) -> Attributes {
        let mut out = Attributes::with_capacity(attrs.len());
        for (key, value) in attrs {
            let (Some(target), Some(ir_ref)) = (ref_target(key), value.as_str()) else {
                out.insert(key.clone(), to_json(value));
                continue;
            };
            if let Some(id) = self.resolve_ref(target, ir_ref, owner, key) {
                out.insert(key.clone(), id);
            }
        }
        out
    }

    /// Set the element attrs that point at other objects, now that every
    /// element and relationship has either been created or dropped.
    fn element_refs(&mut self) {
        for pending in std::mem::take(&mut self.pending_refs) {
            let Some(value) =
                self.resolve_ref(pending.target, &pending.ir_ref, &pending.owner, &pending.key)
            else {
                continue;
            };
            if let Err(err) =
                self.sink
                    .set_element_attr(&self.model, &pending.element, &pending.key, value)
            {
                self.report.warn(
                    "attribute-update-failed",
                    "Attribute reference could not be stored",
                    sample(&[
                        ("id", &pending.owner),
                        ("attr", &pending.key),
                        ("error", &err.to_string()),
                    ]),
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------------

    fn relationships(&mut self) {
        let ir = self.ir;
        for source in &ir.relationships {
            let resolved = resolve_relationship_type(&source.type_name);
            if resolved.is_unknown() && self.skips_unknown() {
                self.report.warn(
                    "unknown-type-skipped",
                    "Relationship of unknown type skipped",
                    sample(&[("id", &source.id), ("type", &source.type_name)]),
                );
                continue;
            }
            let endpoints = (
                self.mappings.elements.get(&source.source_id).cloned(),
                self.mappings.elements.get(&source.target_id).cloned(),
            );
            let (Some(from), Some(to)) = endpoints else {
                self.report.warn(
                    "relationship-endpoint-unmapped",
                    "Relationship endpoint was not created; relationship skipped",
                    sample(&[
                        ("id", &source.id),
                        ("source", &source.source_id),
                        ("target", &source.target_id),
                    ]),
                );
                continue;
            };

            let id = RelationshipId::generate();
            let mut relationship = Relationship::new(id.clone(), resolved.type_name(), from, to);
            relationship.name = source.name.clone();
            relationship.documentation = source.documentation.clone();
            relationship.tagged_values = tagged_values(&source.tagged_values);
            relationship.external_ids =
                external_ids(&source.external_ids, self.system(), &source.id);
            relationship.attrs = self.rewrite_attrs(&source.attrs, &source.id);
            if let ResolvedType::Unknown { token, .. } = &resolved {
                relationship.unknown_type = Some(UnknownType {
                    ns: self.system().to_string(),
                    name: token.clone(),
                });
                self.report.info(
                    "unknown-relationship-type",
                    "Relationship type not recognized; imported as Unknown",
                    sample(&[("id", &source.id), ("type", token)]),
                );
            }

            match self.sink.create_relationship(&self.model, relationship) {
                Ok(()) => {
                    self.mappings.relationships.insert(source.id.clone(), id);
                }
                Err(err) => self.report.warn(
                    "relationship-create-failed",
                    "Relationship could not be created",
                    sample(&[("id", &source.id), ("error", &err.to_string())]),
                ),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    fn views(&mut self) {
        let ir = self.ir;
        for view in &ir.views {
            self.view(view);
        }
    }

    fn view(&mut self, source: &IrView) {
        let id = ViewId::generate();
        let mut view = View::new(
            id.clone(),
            source.name.clone(),
            resolve_viewpoint(source.viewpoint.as_deref()),
        );
        view.folder = source
            .folder_id
            .as_deref()
            .and_then(|folder| self.ensure_folder(folder));
        view.owner = source
            .owner_element_id
            .as_deref()
            .and_then(|owner| self.mapped_element(owner, "view-owner-unmapped", &source.id));
        view.documentation = source.documentation.clone();
        view.tagged_values = tagged_values(&source.tagged_values);
        view.external_ids = external_ids(&source.external_ids, self.system(), &source.id);

        if let Err(err) = self.sink.create_view(&self.model, view) {
            self.report.warn(
                "view-create-failed",
                "View could not be created",
                sample(&[
                    ("id", &source.id),
                    ("name", &source.name),
                    ("error", &err.to_string()),
                ]),
            );
            return;
        }
        self.mappings.views.insert(source.id.clone(), id.clone());

        let nodes = self.view_nodes(source, &id);
        let connections = self.view_connections(source, &nodes);
        self.mappings.view_nodes.insert(source.id.clone(), nodes);

        if connections.is_empty() {
            return;
        }
        let count = connections.len();
        if let Err(err) = self.sink.set_view_connections(&self.model, &id, connections) {
            self.report.warn(
                "view-connections-failed",
                "View connections could not be stored",
                sample(&[
                    ("view", &source.id),
                    ("count", &count.to_string()),
                    ("error", &err.to_string()),
                ]),
            );
        }
    }

    fn view_nodes(&mut self, source: &IrView, view: &ViewId) -> IndexMap<String, ViewNodeId> {
        let depths = nesting_depths(
            source
                .nodes
                .iter()
                .map(|n| (n.id.as_str(), n.parent_node_id.as_deref())),
        );
        let mut ordered: Vec<&IrViewNode> = source.nodes.iter().collect();
        ordered.sort_by_key(|n| depths.get(n.id.as_str()).copied().unwrap_or(0));

        let mut mapped: IndexMap<String, ViewNodeId> = IndexMap::with_capacity(ordered.len());
        for node in ordered {
            let Some(content) = self.node_content(node) else {
                self.report.warn(
                    "view-node-element-unmapped",
                    "View node depicts an element that was not created; node skipped",
                    sample(&[
                        ("view", &source.id),
                        ("node", &node.id),
                        ("element", node.element_id.as_deref().unwrap_or("")),
                    ]),
                );
                continue;
            };
            let id = ViewNodeId::generate();
            let created = ViewNode {
                id: id.clone(),
                content,
                parent: node
                    .parent_node_id
                    .as_deref()
                    .and_then(|parent| mapped.get(parent).cloned()),
                bounds: node.bounds.map(|b| Bounds {
                    x: b.x,
                    y: b.y,
                    width: b.width,
                    height: b.height,
                }),
            };
            match self.sink.add_view_node(&self.model, view, created) {
                Ok(()) => {
                    mapped.insert(node.id.clone(), id);
                }
                Err(err) => self.report.warn(
                    "view-node-create-failed",
                    "View node could not be created",
                    sample(&[
                        ("view", &source.id),
                        ("node", &node.id),
                        ("error", &err.to_string()),
                    ]),
                ),
            }
        }
        mapped
    }

    fn node_content(&self, node: &IrViewNode) -> Option<ViewNodeContent> {
        if let Some(kind) = object_override(node) {
            return Some(ViewNodeContent::Object {
                kind,
                text: node.label.clone(),
            });
        }
        match &node.element_id {
            Some(element) => self
                .mappings
                .elements
                .get(element)
                .map(|id| ViewNodeContent::Element { element: id.clone() }),
            None => Some(ViewNodeContent::Object {
                kind: object_kind(node.kind),
                text: node.label.clone(),
            }),
        }
    }

    fn view_connections(
        &mut self,
        source: &IrView,
        nodes: &IndexMap<String, ViewNodeId>,
    ) -> Vec<ViewConnection> {
        let mut connections = Vec::with_capacity(source.connections.len());
        for connection in &source.connections {
            let ends = (
                connection.source_node_id.as_deref().and_then(|n| nodes.get(n)),
                connection.target_node_id.as_deref().and_then(|n| nodes.get(n)),
            );
            let (Some(from), Some(to)) = ends else {
                self.report.warn(
                    "view-connection-unmapped",
                    "View connection endpoint was not created; connection skipped",
                    sample(&[("view", &source.id), ("connection", &connection.id)]),
                );
                continue;
            };
            let relationship = match connection.relationship_id.as_deref() {
                Some(ir_id) => match self.mappings.relationships.get(ir_id) {
                    Some(id) => Some(id.clone()),
                    None => {
                        self.report.warn(
                            "view-connection-relationship-unmapped",
                            "View connection routes a relationship that was not created; connection skipped",
                            sample(&[
                                ("view", &source.id),
                                ("connection", &connection.id),
                                ("relationship", ir_id),
                            ]),
                        );
                        continue;
                    }
                },
                None => None,
            };
            connections.push(ViewConnection {
                id: uuid::Uuid::new_v4().to_string(),
                relationship,
                source: from.clone(),
                target: to.clone(),
                points: connection
                    .points
                    .iter()
                    .filter(|p| p.is_finite())
                    .map(|p| Point { x: p.x, y: p.y })
                    .collect(),
                label: connection.label.clone(),
            });
        }
        connections
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Depth of every item in a parent forest. Cycles stop counting after one lap.
fn nesting_depths<'a>(
    links: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> FxHashMap<&'a str, usize> {
    let parents: FxHashMap<&str, Option<&str>> = links.into_iter().collect();
    parents
        .iter()
        .map(|(&id, &parent)| {
            let mut depth = 0;
            let mut cursor = parent;
            while let Some(next) = cursor {
                depth += 1;
                if depth > parents.len() {
                    break;
                }
                cursor = parents.get(next).copied().flatten();
            }
            (id, depth)
        })
        .collect()
}

fn object_kind(kind: IrViewNodeKind) -> ViewObjectKind {
    match kind {
        IrViewNodeKind::Element | IrViewNodeKind::Label => ViewObjectKind::Label,
        IrViewNodeKind::Note => ViewObjectKind::Note,
        IrViewNodeKind::Group => ViewObjectKind::GroupBox,
    }
}

fn object_override(node: &IrViewNode) -> Option<ViewObjectKind> {
    let value = node.meta.get(keys::OBJECT_TYPE)?.as_str()?;
    match value.to_ascii_lowercase().as_str() {
        "label" => Some(ViewObjectKind::Label),
        "note" => Some(ViewObjectKind::Note),
        "group" | "groupbox" => Some(ViewObjectKind::GroupBox),
        _ => None,
    }
}

fn tagged_values(items: &[IrTaggedValue]) -> Vec<TaggedValue> {
    items
        .iter()
        .map(|t| TaggedValue {
            key: t.key.clone(),
            value: t.value.clone(),
        })
        .collect()
}

/// Source external ids plus the `{system, IR id}` entry, first.
fn external_ids(items: &[IrExternalId], system: &str, ir_id: &str) -> Vec<ExternalIdRef> {
    let mut out: Vec<ExternalIdRef> = items
        .iter()
        .map(|x| ExternalIdRef {
            system: x.system.clone(),
            id: x.id.clone(),
            kind: x.kind.clone(),
        })
        .collect();
    if !out.iter().any(|x| x.system == system && x.id == ir_id) {
        out.insert(0, ExternalIdRef::new(system, ir_id));
    }
    out
}

fn to_json(value: &IrValue) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn unknown_key(unknown: Option<&UnknownType>) -> String {
    unknown
        .map(UnknownType::key)
        .unwrap_or_else(|| format!("unknown:{UNKNOWN_TYPE}"))
}

/// Count residual Unknown types in the stored model into the report.
fn finalize<S: ModelSink + ?Sized>(sink: &S, model: &ModelId, report: &mut ImportReport) {
    let Some(model) = sink.get_model(model) else {
        trace!(model = %model, "model not readable; unknown type scan skipped");
        return;
    };
    let mut elements = BTreeMap::new();
    for element in model.elements.values().filter(|e| e.is_unknown()) {
        *elements
            .entry(unknown_key(element.unknown_type.as_ref()))
            .or_insert(0) += 1;
    }
    let mut relationships = BTreeMap::new();
    for relationship in model.relationships.values().filter(|r| r.is_unknown()) {
        *relationships
            .entry(unknown_key(relationship.unknown_type.as_ref()))
            .or_insert(0) += 1;
    }
    merge_counts_max(&mut report.unknown_element_types, elements);
    merge_counts_max(&mut report.unknown_relationship_types, relationships);
}
