//! The port Apply writes through.

use thiserror::Error;

use crate::model::{
    Element, ElementId, Folder, FolderId, Model, ModelId, NewModel, Relationship, RelationshipId,
    View, ViewConnection, ViewId, ViewNode, ViewNodeId,
};

/// Why a sink refused a create call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("unknown model: {0}")]
    UnknownModel(ModelId),

    #[error("unknown folder: {0}")]
    UnknownFolder(FolderId),

    #[error("unknown element: {0}")]
    UnknownElement(ElementId),

    #[error("unknown relationship: {0}")]
    UnknownRelationship(RelationshipId),

    #[error("unknown view: {0}")]
    UnknownView(ViewId),

    #[error("unknown view node: {0}")]
    UnknownViewNode(ViewNodeId),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Create-only access to a model store.
///
/// Ids are allocated by the caller, except for the model itself. Every
/// reference passed in (parent folder, endpoints, bound element) must name
/// an object created earlier in the same model. The one update is
/// [`ModelSink::set_element_attr`], used for attrs that point at objects
/// created after the element.
pub trait ModelSink {
    fn create_model(&mut self, spec: NewModel) -> Result<ModelId, SinkError>;

    fn create_folder(&mut self, model: &ModelId, folder: Folder) -> Result<(), SinkError>;

    fn create_element(&mut self, model: &ModelId, element: Element) -> Result<(), SinkError>;

    fn create_relationship(
        &mut self,
        model: &ModelId,
        relationship: Relationship,
    ) -> Result<(), SinkError>;

    /// Set one attr on an element created earlier.
    fn set_element_attr(
        &mut self,
        model: &ModelId,
        element: &ElementId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SinkError>;

    /// Create an empty view. Nodes and connections are added afterwards.
    fn create_view(&mut self, model: &ModelId, view: View) -> Result<(), SinkError>;

    fn add_view_node(&mut self, model: &ModelId, view: &ViewId, node: ViewNode) -> Result<(), SinkError>;

    /// Replace the connections of a view in one batch.
    fn set_view_connections(
        &mut self,
        model: &ModelId,
        view: &ViewId,
        connections: Vec<ViewConnection>,
    ) -> Result<(), SinkError>;

    fn get_model(&self, model: &ModelId) -> Option<&Model>;
}
