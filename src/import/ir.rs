//! Intermediate representation shared by every import stage.
//!
//! Parsers produce an [`IrModel`] straight from the source dialect (often
//! defective), the normalizers repair it, and the Apply stage consumes it.
//!
//! ```text
//! IrModel
//! ├── folders:        Vec<IrFolder>        (parentId → folder)
//! ├── elements:       Vec<IrElement>       (folderId, parentElementId)
//! ├── relationships:  Vec<IrRelationship>  (sourceId/targetId → element)
//! ├── views:          Vec<IrView>
//! │   ├── nodes:        Vec<IrViewNode>        (elementId, parentNodeId)
//! │   └── connections:  Vec<IrViewConnection>  (relationshipId, source/target node)
//! └── meta:           IrMeta
//! ```
//!
//! `type` tokens are dialect specific (`bpmn.task`, `uml.class`,
//! `BusinessActor`) and are only resolved against the tool taxonomy by Apply.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A loosely-typed attribute value attached to IR entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IrValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(Vec<IrValue>),
    Map(IndexMap<String, IrValue>),
}

impl IrValue {
    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as a map, if it is one.
    pub fn as_map(&self) -> Option<&IndexMap<String, IrValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[IrValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<&str> for IrValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for IrValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for IrValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for IrValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for IrValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

/// Free-form key/value bag (`attrs`, `meta`).
pub type IrAttrs = IndexMap<String, IrValue>;

/// Well-known meta/attr keys.
pub mod keys {
    /// Raw extension key/values captured by a parser, turned into tagged values by normalization.
    pub const EXTENSION_TAGS: &str = "extensionTags";
    /// Connection endpoints were swapped to follow the relationship direction.
    pub const REVERSED: &str = "reversed";
    /// The connection matched several relationships and was left unresolved.
    pub const RELATIONSHIP_AMBIGUOUS: &str = "relationshipAmbiguous";
    /// On an association-class element: the IR id of its relationship half.
    pub const ASSOCIATION_RELATIONSHIP_ID: &str = "associationRelationshipId";
    /// On an association-class relationship: the IR id of its element half.
    pub const ASSOCIATION_CLASS_ELEMENT_ID: &str = "associationClassElementId";
    /// Boundary event host.
    pub const ATTACHED_TO_REF: &str = "attachedToRef";
    /// Gateway/activity default sequence flow.
    pub const DEFAULT_FLOW: &str = "defaultFlow";
    /// On a view node: forces a free-standing object kind (`label`, `note`, `group`).
    pub const OBJECT_TYPE: &str = "objectType";
}

/// A key/value annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrTaggedValue {
    pub key: String,
    pub value: String,
}

impl IrTaggedValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An identifier of the entity in some external system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrExternalId {
    pub system: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl IrExternalId {
    pub fn new(system: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            id: id.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Model-level metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrMeta {
    /// Source dialect (`bpmn2`, `archimate-meff`, `ea-xmi`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Exporting tool, when the document declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Stamped by the generic normalizer when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at_iso: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IrAttrs,
}

/// A folder (package, organization item).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<IrExternalId>,
}

impl IrFolder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// A model element.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrElement {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<IrExternalId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IrAttrs,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IrAttrs,
}

impl IrElement {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn with_parent(mut self, parent_element_id: impl Into<String>) -> Self {
        self.parent_element_id = Some(parent_element_id.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<IrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// A relationship between two elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<IrExternalId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IrAttrs,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IrAttrs,
}

impl IrRelationship {
    pub fn new(
        id: impl Into<String>,
        type_name: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<IrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IrBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl IrBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Finite coordinates and strictly positive, finite dimensions.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// A polyline point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IrPoint {
    pub x: f64,
    pub y: f64,
}

impl IrPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// What a view node depicts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IrViewNodeKind {
    /// Bound to a model element.
    #[default]
    Element,
    /// Free text label.
    Label,
    /// Note / annotation box.
    Note,
    /// Visual grouping container.
    Group,
}

/// A shape on a view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrViewNode {
    pub id: String,
    #[serde(default)]
    pub kind: IrViewNodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<IrBounds>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IrAttrs,
}

impl IrViewNode {
    /// A node bound to an element.
    pub fn element(id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: IrViewNodeKind::Element,
            element_id: Some(element_id.into()),
            ..Self::default()
        }
    }

    /// A free-standing node (label, note, group).
    pub fn free(id: impl Into<String>, kind: IrViewNodeKind, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: IrBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_parent(mut self, parent_node_id: impl Into<String>) -> Self {
        self.parent_node_id = Some(parent_node_id.into());
        self
    }
}

/// An edge on a view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrViewConnection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<IrPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IrAttrs,
}

impl IrViewConnection {
    /// A connection between two nodes.
    pub fn between(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: Some(source_node_id.into()),
            target_node_id: Some(target_node_id.into()),
            ..Self::default()
        }
    }

    pub fn with_relationship(mut self, relationship_id: impl Into<String>) -> Self {
        self.relationship_id = Some(relationship_id.into());
        self
    }

    /// Whether normalization swapped the endpoints.
    pub fn is_reversed(&self) -> bool {
        self.meta
            .get(keys::REVERSED)
            .and_then(IrValue::as_bool)
            .unwrap_or(false)
    }
}

/// A diagram.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrView {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Owning element (MEFF organization containment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default)]
    pub nodes: Vec<IrViewNode>,
    #[serde(default)]
    pub connections: Vec<IrViewConnection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<IrTaggedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<IrExternalId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IrAttrs,
}

impl IrView {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn node(&self, id: &str) -> Option<&IrViewNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// The whole intermediate model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrModel {
    #[serde(default)]
    pub folders: Vec<IrFolder>,
    #[serde(default)]
    pub elements: Vec<IrElement>,
    #[serde(default)]
    pub relationships: Vec<IrRelationship>,
    #[serde(default)]
    pub views: Vec<IrView>,
    #[serde(default)]
    pub meta: IrMeta,
}

impl IrModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self, id: &str) -> Option<&IrElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&IrRelationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn folder(&self, id: &str) -> Option<&IrFolder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn view(&self, id: &str) -> Option<&IrView> {
        self.views.iter().find(|v| v.id == id)
    }

    /// Serialize to pretty JSON (fixtures, debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
