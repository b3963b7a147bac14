//! ArchiMate Model Exchange File → IR.
//!
//! Every query matches on local names, so the same document parses the same
//! whether its tags are unprefixed or carry an arbitrary prefix. Both the
//! 3.x layout (`identifierRef`, `views/diagrams`, `propertyDefinitions`) and
//! the 2.1 layout (`identifierref`, `views/view`, `propertydefs`) are read.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::{FORMAT, XSI_NS};
use crate::import::ir::{
    IrAttrs, IrBounds, IrElement, IrFolder, IrPoint, IrRelationship, IrValue, IrView,
    IrViewConnection, IrViewNode, IrViewNodeKind,
};
use crate::import::normalize::common::push_extension_tag;
use crate::import::report::sample;
use crate::import::xml::{Document, Element};
use crate::import::{ImportError, ImportReport, IrModel};

fn xsi_type(el: &Element) -> Option<&str> {
    el.attr_ns(XSI_NS, "type")
        .or_else(|| el.attr("type"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn identifier(el: &Element) -> Option<&str> {
    el.attr_non_empty("identifier")
}

fn identifier_ref(el: &Element) -> Option<&str> {
    el.attr_non_empty("identifierRef")
        .or_else(|| el.attr_non_empty("identifierref"))
}

/// First non-empty `<name>` child (any language), then the 2.1 `<label>`,
/// then a `name` attribute.
fn name_of(el: &Element) -> String {
    el.child_text("name")
        .or_else(|| el.child_text("label"))
        .or_else(|| el.attr_non_empty("name"))
        .unwrap_or("")
        .to_string()
}

fn documentation_of(el: &Element) -> Option<String> {
    el.child_text("documentation").map(str::to_string)
}

struct MeffParser<'r> {
    ir: IrModel,
    report: &'r mut ImportReport,
    property_names: FxHashMap<String, String>,
    synthetic: usize,
}

/// Parse an ArchiMate exchange document.
pub fn parse_meff(doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
    let root = doc.root();
    if !root.is("model") {
        return Err(ImportError::missing_root(FORMAT, "model", root.name()));
    }

    let mut parser = MeffParser {
        ir: IrModel::new(),
        report,
        property_names: property_definitions(root),
        synthetic: 0,
    };
    parser.ir.meta.format = Some(FORMAT.to_string());
    let model_name = name_of(root);
    parser.ir.meta.model_name = (!model_name.is_empty()).then_some(model_name);
    parser.ir.meta.documentation = documentation_of(root);
    if let Some(id) = identifier(root) {
        parser
            .ir
            .meta
            .extra
            .insert("modelIdentifier".to_string(), IrValue::from(id));
    }
    let properties = parser.properties(root);
    if !properties.is_empty() {
        let map: IrAttrs = properties
            .into_iter()
            .map(|(k, v)| (k, IrValue::from(v)))
            .collect();
        parser.ir.meta.extra.insert("properties".to_string(), IrValue::Map(map));
    }

    if let Some(elements) = root.child("elements") {
        for el in elements.children_named("element") {
            parser.element(el);
        }
    }
    if let Some(relationships) = root.child("relationships") {
        for rel in relationships.children_named("relationship") {
            parser.relationship(rel);
        }
    }
    if let Some(views) = root.child("views") {
        for view in views.descendants_named("view") {
            parser.view(view);
        }
    }
    for organizations in root
        .children()
        .iter()
        .filter(|c| c.is("organizations") || c.is("organization"))
    {
        for item in organizations.children_named("item") {
            parser.organization_item(item, None, None);
        }
    }

    let ir = parser.ir;
    debug!(
        elements = ir.elements.len(),
        relationships = ir.relationships.len(),
        views = ir.views.len(),
        folders = ir.folders.len(),
        "parsed ArchiMate exchange document"
    );
    Ok(ir)
}

/// Property definition id → display name.
fn property_definitions(root: &Element) -> FxHashMap<String, String> {
    let mut names = FxHashMap::default();
    for container in root
        .children()
        .iter()
        .filter(|c| c.is("propertyDefinitions") || c.is("propertydefs"))
    {
        for def in container.children() {
            if !(def.is("propertyDefinition") || def.is("propertydef")) {
                continue;
            }
            if let Some(id) = identifier(def) {
                let name = name_of(def);
                names.insert(id.to_string(), if name.is_empty() { id.to_string() } else { name });
            }
        }
    }
    names
}

fn read_bounds(node: &Element) -> Option<IrBounds> {
    Some(IrBounds::new(
        node.attr_f64("x")?,
        node.attr_f64("y")?,
        node.attr_f64("w").or_else(|| node.attr_f64("width"))?,
        node.attr_f64("h").or_else(|| node.attr_f64("height"))?,
    ))
}

fn fill_color(node: &Element) -> Option<String> {
    let fill = node.child("style")?.child("fillColor")?;
    let channel = |name: &str| fill.attr_f64(name).map(|v| v.clamp(0.0, 255.0) as u8);
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channel("r")?,
        channel("g")?,
        channel("b")?
    ))
}

impl MeffParser<'_> {
    fn synthetic_id(&mut self, prefix: &str) -> String {
        self.synthetic += 1;
        format!("{prefix}_synth_{}", self.synthetic)
    }

    fn properties(&self, owner: &Element) -> Vec<(String, String)> {
        let Some(container) = owner.child("properties") else {
            return Vec::new();
        };
        container
            .children_named("property")
            .filter_map(|property| {
                let reference = property
                    .attr_non_empty("propertyDefinitionRef")
                    .or_else(|| identifier_ref(property))?;
                let key = self
                    .property_names
                    .get(reference)
                    .cloned()
                    .unwrap_or_else(|| reference.to_string());
                let value = property.child_text("value").unwrap_or("").to_string();
                Some((key, value))
            })
            .collect()
    }

    fn element(&mut self, el: &Element) {
        let Some(id) = identifier(el) else {
            self.report.warn(
                "missing-id",
                "Element without identifier; skipped",
                sample(&[("name", &name_of(el))]),
            );
            return;
        };
        let type_name = xsi_type(el).unwrap_or("");
        let mut element = IrElement::new(id, type_name, name_of(el));
        element.documentation = documentation_of(el);
        for (key, value) in self.properties(el) {
            push_extension_tag(&mut element.meta, &key, &value);
        }
        self.ir.elements.push(element);
    }

    fn relationship(&mut self, rel: &Element) {
        let Some(id) = identifier(rel) else {
            self.report.warn(
                "missing-id",
                "Relationship without identifier; skipped",
                sample(&[("name", &name_of(rel))]),
            );
            return;
        };
        let mut relationship = IrRelationship::new(
            id,
            xsi_type(rel).unwrap_or(""),
            rel.attr("source").unwrap_or("").trim(),
            rel.attr("target").unwrap_or("").trim(),
        );
        let name = name_of(rel);
        relationship.name = (!name.is_empty()).then_some(name);
        relationship.documentation = documentation_of(rel);
        if let Some(access) = rel.attr_non_empty("accessType") {
            relationship.attrs.insert("accessType".to_string(), IrValue::from(access));
        }
        if let Some(modifier) = rel.attr_non_empty("modifier") {
            relationship
                .attrs
                .insert("influenceModifier".to_string(), IrValue::from(modifier));
        }
        if let Some(directed) = rel.attr_bool("isDirected") {
            relationship.attrs.insert("isDirected".to_string(), IrValue::from(directed));
        }
        for (key, value) in self.properties(rel) {
            push_extension_tag(&mut relationship.meta, &key, &value);
        }
        self.ir.relationships.push(relationship);
    }

    fn view(&mut self, view_el: &Element) {
        let id = match identifier(view_el) {
            Some(id) => id.to_string(),
            None => {
                let id = self.synthetic_id("meffView");
                self.report.warn(
                    "missing-id",
                    "View without identifier; generated one",
                    sample(&[("name", &name_of(view_el)), ("generatedId", &id)]),
                );
                id
            }
        };
        let mut view = IrView::new(id, name_of(view_el));
        view.documentation = documentation_of(view_el);
        view.viewpoint = view_el.attr_non_empty("viewpoint").map(str::to_string);
        for (key, value) in self.properties(view_el) {
            push_extension_tag(&mut view.meta, &key, &value);
        }
        for node in view_el.children_named("node") {
            self.view_node(node, None, &mut view);
        }
        for connection in view_el.descendants_named("connection") {
            self.view_connection(connection, &mut view);
        }
        self.ir.views.push(view);
    }

    fn view_node(&mut self, node_el: &Element, parent: Option<&str>, view: &mut IrView) {
        let id = match identifier(node_el) {
            Some(id) => id.to_string(),
            None => self.synthetic_id("meffNode"),
        };
        let element_ref = node_el
            .attr_non_empty("elementRef")
            .or_else(|| node_el.attr_non_empty("elementref"));
        let label = node_el.child_text("label").map(str::to_string);
        let mut node = match (element_ref, xsi_type(node_el)) {
            (Some(element_id), _) => IrViewNode::element(id.clone(), element_id),
            (None, Some("Container" | "Group")) => IrViewNode::free(id.clone(), IrViewNodeKind::Group, label),
            (None, Some("Note")) => IrViewNode::free(id.clone(), IrViewNodeKind::Note, label),
            (None, _) => IrViewNode::free(id.clone(), IrViewNodeKind::Label, label),
        };
        node.parent_node_id = parent.map(str::to_string);
        node.bounds = read_bounds(node_el);
        if let Some(color) = fill_color(node_el) {
            node.meta.insert("fillColor".to_string(), IrValue::from(color));
        }
        view.nodes.push(node);
        for child in node_el.children_named("node") {
            self.view_node(child, Some(id.as_str()), view);
        }
    }

    fn view_connection(&mut self, connection_el: &Element, view: &mut IrView) {
        let id = match identifier(connection_el) {
            Some(id) => id.to_string(),
            None => self.synthetic_id("meffConnection"),
        };
        let mut connection = IrViewConnection {
            id,
            relationship_id: connection_el
                .attr_non_empty("relationshipRef")
                .or_else(|| connection_el.attr_non_empty("relationshipref"))
                .map(str::to_string),
            source_node_id: connection_el.attr_non_empty("source").map(str::to_string),
            target_node_id: connection_el.attr_non_empty("target").map(str::to_string),
            label: connection_el.child_text("label").map(str::to_string),
            ..IrViewConnection::default()
        };
        connection.points = connection_el
            .children()
            .iter()
            .filter(|c| c.is("bendpoint"))
            .filter_map(|b| Some(IrPoint::new(b.attr_f64("x")?, b.attr_f64("y")?)))
            .collect();
        view.connections.push(connection);
    }

    /// Walk an organization item. Label items become folders; reference items
    /// place the referenced element or view, and their nested references
    /// become contained in that element.
    fn organization_item(&mut self, item: &Element, folder: Option<&str>, owner: Option<&str>) {
        if let Some(reference) = identifier_ref(item) {
            self.place(reference, folder, owner);
            for child in item.children_named("item") {
                self.organization_item(child, folder, Some(reference));
            }
            return;
        }

        let label = item.child_text("label").unwrap_or("");
        let id = match identifier(item) {
            Some(id) => id.to_string(),
            None => self.synthetic_id("meffFolder"),
        };
        let mut ir_folder = IrFolder::new(id.clone(), label);
        ir_folder.parent_id = folder.map(str::to_string);
        ir_folder.documentation = documentation_of(item);
        self.ir.folders.push(ir_folder);
        for child in item.children_named("item") {
            self.organization_item(child, Some(id.as_str()), None);
        }
    }

    fn place(&mut self, reference: &str, folder: Option<&str>, owner: Option<&str>) {
        if let Some(element) = self.ir.elements.iter_mut().find(|e| e.id == reference) {
            if element.folder_id.is_none() {
                element.folder_id = folder.map(str::to_string);
            }
            if element.parent_element_id.is_none() && owner != Some(reference) {
                element.parent_element_id = owner.map(str::to_string);
            }
            return;
        }
        if let Some(view) = self.ir.views.iter_mut().find(|v| v.id == reference) {
            if view.folder_id.is_none() {
                view.folder_id = folder.map(str::to_string);
            }
            if view.owner_element_id.is_none() {
                view.owner_element_id = owner.map(str::to_string);
            }
            return;
        }
        let known: FxHashSet<&str> = self.ir.relationships.iter().map(|r| r.id.as_str()).collect();
        if !known.contains(reference) {
            self.report.warn(
                "organization-dangling-ref",
                "Organization item references an unknown identifier",
                sample(&[("identifierRef", reference)]),
            );
        }
    }
}
