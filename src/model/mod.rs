//! Tool-internal architecture model.
//!
//! This is what the Apply stage produces. Objects are created through the
//! [`ModelSink`](crate::import::apply::ModelSink) port; [`MemoryStore`] is the
//! in-process implementation.
//!
//! ```text
//! Model
//! ├── folders:        IndexMap<FolderId, Folder>
//! ├── elements:       IndexMap<ElementId, Element>
//! ├── relationships:  IndexMap<RelationshipId, Relationship>
//! └── views:          IndexMap<ViewId, View>
//!     ├── nodes:        IndexMap<ViewNodeId, ViewNode>
//!     └── connections:  Vec<ViewConnection>
//! ```

mod store;

pub use store::MemoryStore;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type name given to elements and relationships no taxonomy recognizes.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Free-form attributes carried over from the source document.
pub type Attributes = IndexMap<String, serde_json::Value>;

// ============================================================================
// IDs
// ============================================================================

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Arc<str>);

        impl $name {
            /// Wrap an existing id.
            pub fn new(id: impl Into<Arc<str>>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random (UUID v4) id.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string().into())
            }

            /// The id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

id_type!(
    /// Identifier of an allocated model.
    ModelId
);
id_type!(
    /// Identifier of a folder.
    FolderId
);
id_type!(
    /// Identifier of an element.
    ElementId
);
id_type!(
    /// Identifier of a relationship.
    RelationshipId
);
id_type!(
    /// Identifier of a view.
    ViewId
);
id_type!(
    /// Identifier of a node within a view.
    ViewNodeId
);

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// Where an object came from, in some external system's terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdRef {
    pub system: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ExternalIdRef {
    pub fn new(system: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            id: id.into(),
            kind: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedValue {
    pub key: String,
    pub value: String,
}

/// The original type token of an object typed [`UNKNOWN_TYPE`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownType {
    /// Source system namespace (`sparx-ea`, `bpmn`, ...).
    pub ns: String,
    /// The token exactly as the source wrote it.
    pub name: String,
}

impl UnknownType {
    /// Report key, `"ns:name"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.ns, self.name)
    }
}

// ============================================================================
// LAYERS
// ============================================================================

/// ArchiMate layer (or aspect) an element belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Strategy,
    Business,
    Application,
    Technology,
    Physical,
    Motivation,
    ImplementationMigration,
    #[default]
    Other,
}

// ============================================================================
// MODEL OBJECTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub parent: Option<FolderId>,
    pub documentation: Option<String>,
    pub tagged_values: Vec<TaggedValue>,
    pub external_ids: Vec<ExternalIdRef>,
}

impl Folder {
    pub fn new(id: FolderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            documentation: None,
            tagged_values: Vec::new(),
            external_ids: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// ArchiMate type, a `bpmn.*`/`uml.*` token, or [`UNKNOWN_TYPE`].
    pub type_name: String,
    pub layer: Layer,
    pub name: String,
    pub documentation: Option<String>,
    pub folder: Option<FolderId>,
    /// Containing element.
    pub parent: Option<ElementId>,
    pub tagged_values: Vec<TaggedValue>,
    pub external_ids: Vec<ExternalIdRef>,
    pub attrs: Attributes,
    pub unknown_type: Option<UnknownType>,
}

impl Element {
    pub fn new(id: ElementId, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            layer: Layer::Other,
            name: name.into(),
            documentation: None,
            folder: None,
            parent: None,
            tagged_values: Vec::new(),
            external_ids: Vec::new(),
            attrs: Attributes::new(),
            unknown_type: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.type_name == UNKNOWN_TYPE
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub type_name: String,
    pub source: ElementId,
    pub target: ElementId,
    pub name: Option<String>,
    pub documentation: Option<String>,
    pub tagged_values: Vec<TaggedValue>,
    pub external_ids: Vec<ExternalIdRef>,
    pub attrs: Attributes,
    pub unknown_type: Option<UnknownType>,
}

impl Relationship {
    pub fn new(
        id: RelationshipId,
        type_name: impl Into<String>,
        source: ElementId,
        target: ElementId,
    ) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            source,
            target,
            name: None,
            documentation: None,
            tagged_values: Vec::new(),
            external_ids: Vec::new(),
            attrs: Attributes::new(),
            unknown_type: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.type_name == UNKNOWN_TYPE
    }
}

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Free-standing diagram objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewObjectKind {
    Label,
    Note,
    GroupBox,
}

/// What a node shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ViewNodeContent {
    Element { element: ElementId },
    Object { kind: ViewObjectKind, text: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: ViewNodeId,
    pub content: ViewNodeContent,
    pub parent: Option<ViewNodeId>,
    pub bounds: Option<Bounds>,
}

impl ViewNode {
    /// The element this node depicts, if any.
    pub fn element(&self) -> Option<&ElementId> {
        match &self.content {
            ViewNodeContent::Element { element } => Some(element),
            ViewNodeContent::Object { .. } => None,
        }
    }
}

/// A routed edge on a view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConnection {
    pub id: String,
    pub relationship: Option<RelationshipId>,
    pub source: ViewNodeId,
    pub target: ViewNodeId,
    pub points: Vec<Point>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    pub name: String,
    /// Viewpoint id (`layered`, `application_cooperation`, ...).
    pub viewpoint: String,
    pub folder: Option<FolderId>,
    /// Element that owns this view, if any.
    pub owner: Option<ElementId>,
    pub documentation: Option<String>,
    pub tagged_values: Vec<TaggedValue>,
    pub external_ids: Vec<ExternalIdRef>,
    pub nodes: IndexMap<ViewNodeId, ViewNode>,
    pub connections: Vec<ViewConnection>,
}

impl View {
    pub fn new(id: ViewId, name: impl Into<String>, viewpoint: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            viewpoint: viewpoint.into(),
            folder: None,
            owner: None,
            documentation: None,
            tagged_values: Vec::new(),
            external_ids: Vec::new(),
            nodes: IndexMap::new(),
            connections: Vec::new(),
        }
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Request to allocate a model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewModel {
    pub name: String,
    pub documentation: Option<String>,
    pub metadata: IndexMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub documentation: Option<String>,
    pub metadata: IndexMap<String, String>,
    pub folders: IndexMap<FolderId, Folder>,
    pub elements: IndexMap<ElementId, Element>,
    pub relationships: IndexMap<RelationshipId, Relationship>,
    pub views: IndexMap<ViewId, View>,
}

impl Model {
    pub fn new(id: ModelId, spec: NewModel) -> Self {
        Self {
            id,
            name: spec.name,
            documentation: spec.documentation,
            metadata: spec.metadata,
            folders: IndexMap::new(),
            elements: IndexMap::new(),
            relationships: IndexMap::new(),
            views: IndexMap::new(),
        }
    }

    pub fn folder(&self, id: &FolderId) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn view(&self, id: &ViewId) -> Option<&View> {
        self.views.get(id)
    }

    /// Find an element by an external id it carries.
    pub fn element_by_external_id(&self, system: &str, id: &str) -> Option<&Element> {
        self.elements
            .values()
            .find(|e| e.external_ids.iter().any(|x| x.system == system && x.id == id))
    }

    /// Find a relationship by an external id it carries.
    pub fn relationship_by_external_id(&self, system: &str, id: &str) -> Option<&Relationship> {
        self.relationships
            .values()
            .find(|r| r.external_ids.iter().any(|x| x.system == system && x.id == id))
    }
}
