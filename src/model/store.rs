//! In-memory model store.

use indexmap::IndexMap;
use tracing::trace;

use crate::import::apply::{ModelSink, SinkError};

use super::{
    Element, ElementId, Folder, Model, ModelId, NewModel, Relationship, View, ViewConnection, ViewId,
    ViewNode, ViewNodeContent,
};

/// Holds models in memory and checks every reference on insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: IndexMap<ModelId, Model>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self, id: &ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Remove a model and hand it back.
    pub fn take_model(&mut self, id: &ModelId) -> Option<Model> {
        self.models.shift_remove(id)
    }

    fn model_mut(&mut self, id: &ModelId) -> Result<&mut Model, SinkError> {
        self.models
            .get_mut(id)
            .ok_or_else(|| SinkError::UnknownModel(id.clone()))
    }
}

fn view_mut<'a>(model: &'a mut Model, id: &ViewId) -> Result<&'a mut View, SinkError> {
    model
        .views
        .get_mut(id)
        .ok_or_else(|| SinkError::UnknownView(id.clone()))
}

impl ModelSink for MemoryStore {
    fn create_model(&mut self, spec: NewModel) -> Result<ModelId, SinkError> {
        let id = ModelId::generate();
        self.models.insert(id.clone(), Model::new(id.clone(), spec));
        trace!(model = %id, "model created");
        Ok(id)
    }

    fn create_folder(&mut self, model: &ModelId, folder: Folder) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        if model.folders.contains_key(&folder.id) {
            return Err(SinkError::DuplicateId(folder.id.to_string()));
        }
        if let Some(parent) = &folder.parent {
            if !model.folders.contains_key(parent) {
                return Err(SinkError::UnknownFolder(parent.clone()));
            }
        }
        model.folders.insert(folder.id.clone(), folder);
        Ok(())
    }

    fn create_element(&mut self, model: &ModelId, element: Element) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        if model.elements.contains_key(&element.id) {
            return Err(SinkError::DuplicateId(element.id.to_string()));
        }
        if let Some(folder) = &element.folder {
            if !model.folders.contains_key(folder) {
                return Err(SinkError::UnknownFolder(folder.clone()));
            }
        }
        if let Some(parent) = &element.parent {
            if !model.elements.contains_key(parent) {
                return Err(SinkError::UnknownElement(parent.clone()));
            }
        }
        model.elements.insert(element.id.clone(), element);
        Ok(())
    }

    fn create_relationship(
        &mut self,
        model: &ModelId,
        relationship: Relationship,
    ) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        if model.relationships.contains_key(&relationship.id) {
            return Err(SinkError::DuplicateId(relationship.id.to_string()));
        }
        for end in [&relationship.source, &relationship.target] {
            if !model.elements.contains_key(end) {
                return Err(SinkError::UnknownElement(end.clone()));
            }
        }
        model
            .relationships
            .insert(relationship.id.clone(), relationship);
        Ok(())
    }

    fn set_element_attr(
        &mut self,
        model: &ModelId,
        element: &ElementId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        let element = model
            .elements
            .get_mut(element)
            .ok_or_else(|| SinkError::UnknownElement(element.clone()))?;
        element.attrs.insert(key.to_string(), value);
        Ok(())
    }

    fn create_view(&mut self, model: &ModelId, view: View) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        if model.views.contains_key(&view.id) {
            return Err(SinkError::DuplicateId(view.id.to_string()));
        }
        if let Some(folder) = &view.folder {
            if !model.folders.contains_key(folder) {
                return Err(SinkError::UnknownFolder(folder.clone()));
            }
        }
        if let Some(owner) = &view.owner {
            if !model.elements.contains_key(owner) {
                return Err(SinkError::UnknownElement(owner.clone()));
            }
        }
        if !view.nodes.is_empty() || !view.connections.is_empty() {
            return Err(SinkError::Rejected(
                "views are created empty; add nodes and connections separately".into(),
            ));
        }
        model.views.insert(view.id.clone(), view);
        Ok(())
    }

    fn add_view_node(&mut self, model: &ModelId, view: &ViewId, node: ViewNode) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        if let ViewNodeContent::Element { element } = &node.content {
            if !model.elements.contains_key(element) {
                return Err(SinkError::UnknownElement(element.clone()));
            }
        }
        let view = view_mut(model, view)?;
        if view.nodes.contains_key(&node.id) {
            return Err(SinkError::DuplicateId(node.id.to_string()));
        }
        if let Some(parent) = &node.parent {
            if !view.nodes.contains_key(parent) {
                return Err(SinkError::UnknownViewNode(parent.clone()));
            }
        }
        view.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    fn set_view_connections(
        &mut self,
        model: &ModelId,
        view: &ViewId,
        connections: Vec<ViewConnection>,
    ) -> Result<(), SinkError> {
        let model = self.model_mut(model)?;
        for connection in &connections {
            if let Some(relationship) = &connection.relationship {
                if !model.relationships.contains_key(relationship) {
                    return Err(SinkError::UnknownRelationship(relationship.clone()));
                }
            }
        }
        let view = view_mut(model, view)?;
        for connection in &connections {
            for end in [&connection.source, &connection.target] {
                if !view.nodes.contains_key(end) {
                    return Err(SinkError::UnknownViewNode(end.clone()));
                }
            }
        }
        view.connections = connections;
        Ok(())
    }

    fn get_model(&self, model: &ModelId) -> Option<&Model> {
        self.models.get(model)
    }
}
