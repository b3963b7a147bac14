//! Enterprise Architect XMI (UML 2.x) → IR.
//!
//! The UML model tree supplies packages, classifiers and relationships. The
//! EA `xmi:Extension` block adds documentation, tagged values, stereotypes
//! and diagram geometry. Elements carrying an ArchiMate profile stereotype
//! keep the ArchiMate type token instead of a `uml.*` one.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::FORMAT;
use crate::import::ir::{
    IrAttrs, IrBounds, IrElement, IrFolder, IrPoint, IrRelationship, IrValue, IrView,
    IrViewConnection, IrViewNode, keys,
};
use crate::import::normalize::common::push_extension_tag;
use crate::import::report::sample;
use crate::import::xml::{Document, Element};
use crate::import::{ImportError, ImportReport, IrModel};

/// Suffix of the relationship half of an association class.
pub const ASSOCIATION_SUFFIX: &str = "__association";

/// A prefixed attribute (`xmi:id`, `xmi:type`) by local name, ignoring unprefixed ones.
fn prefixed_attr<'a>(el: &'a Element, local: &str) -> Option<&'a str> {
    el.attributes()
        .iter()
        .find(|a| a.name.contains(':') && a.local_name() == local)
        .map(|a| a.value.trim())
        .filter(|v| !v.is_empty())
}

fn xmi_id(el: &Element) -> Option<&str> {
    prefixed_attr(el, "id")
}

fn xmi_idref(el: &Element) -> Option<&str> {
    prefixed_attr(el, "idref")
}

/// `uml:Class` → `Class`.
fn uml_kind(el: &Element) -> Option<&str> {
    prefixed_attr(el, "type").map(|t| t.rsplit(':').next().unwrap_or(t))
}

/// `InformationFlow` → `informationFlow`.
pub fn lower_camel(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `ArchiMate3::ArchiMate_BusinessActor` or `ArchiMate_BusinessActor` → `BusinessActor`.
pub fn archimate_stereotype(stereotype: &str) -> Option<&str> {
    let local = stereotype.rsplit("::").next().unwrap_or(stereotype);
    let local = local.rsplit(':').next().unwrap_or(local);
    local
        .strip_prefix("ArchiMate_")
        .or_else(|| local.strip_prefix("Archimate_"))
        .filter(|t| !t.is_empty())
}

/// First id of a possibly space-separated id list attribute.
fn first_ref<'a>(el: &'a Element, name: &str) -> Option<&'a str> {
    el.attr_non_empty(name)
        .and_then(|v| v.split_whitespace().next())
        .or_else(|| el.child(name).and_then(xmi_idref))
}

/// Relationship kinds carried as standalone packaged elements: (source attr, target attr).
fn packaged_relationship(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        "Dependency" | "Realization" | "Usage" | "Abstraction" | "Substitution"
        | "ComponentRealization" | "Manifestation" => Some(("client", "supplier")),
        "InformationFlow" => Some(("informationSource", "informationTarget")),
        _ => None,
    }
}

/// Relationship kinds nested inside their source classifier: target attr.
fn nested_relationship(local: &str) -> Option<(&'static str, &'static str)> {
    match local {
        "generalization" => Some(("uml.generalization", "general")),
        "interfaceRealization" => Some(("uml.interfaceRealization", "contract")),
        "include" => Some(("uml.include", "addition")),
        "extend" => Some(("uml.extend", "extendedCase")),
        _ => None,
    }
}

fn multiplicity(end: &Element) -> Option<String> {
    let bound = |name: &str| end.child(name).and_then(|v| v.attr_non_empty("value"));
    match (bound("lowerValue"), bound("upperValue")) {
        (Some(lower), Some(upper)) if lower == upper => Some(lower.to_string()),
        (Some(lower), Some(upper)) => Some(format!("{lower}..{upper}")),
        (None, Some(upper)) => Some(upper.to_string()),
        (Some(lower), None) => Some(lower.to_string()),
        (None, None) => end.attr_non_empty("multiplicity").map(str::to_string),
    }
}

fn parse_geometry(geometry: &str) -> FxHashMap<&str, &str> {
    geometry
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

fn geometry_bounds(geometry: &str) -> Option<IrBounds> {
    let parts = parse_geometry(geometry);
    let value = |k: &str| parts.get(k).and_then(|v| v.parse::<f64>().ok());
    let (left, top) = (value("Left")?, value("Top")?);
    let (right, bottom) = (value("Right")?, value("Bottom")?);
    Some(IrBounds::new(left, top, right - left, bottom - top))
}

/// `Path=100:200$150:200$` → points.
fn geometry_path(geometry: &str) -> Vec<IrPoint> {
    let parts = parse_geometry(geometry);
    parts
        .get("Path")
        .map(|path| {
            path.split('$')
                .filter_map(|p| p.split_once(':'))
                .filter_map(|(x, y)| Some(IrPoint::new(x.trim().parse().ok()?, y.trim().parse().ok()?)))
                .collect()
        })
        .unwrap_or_default()
}

struct XmiParser<'d, 'r> {
    ir: IrModel,
    report: &'r mut ImportReport,
    by_id: FxHashMap<&'d str, &'d Element>,
    stereotypes: FxHashMap<String, String>,
    synthetic: usize,
}

/// Parse an EA-flavored XMI document.
pub fn parse_ea_xmi(doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
    let root = doc.root();
    if !(root.is("XMI") || root.is("Model")) {
        return Err(ImportError::missing_root(FORMAT, "XMI", root.name()));
    }

    let mut parser = XmiParser {
        ir: IrModel::new(),
        report,
        by_id: root
            .descendants()
            .filter_map(|el| Some((xmi_id(el)?, el)))
            .collect(),
        stereotypes: FxHashMap::default(),
        synthetic: 0,
    };
    parser.ir.meta.format = Some(FORMAT.to_string());
    if let Some(documentation) = root.child("Documentation") {
        parser.ir.meta.tool = documentation.attr_non_empty("exporter").map(str::to_string);
        parser.ir.meta.tool_version = documentation
            .attr_non_empty("exporterVersion")
            .map(str::to_string);
    }

    let model = if root.is("Model") {
        root
    } else {
        root.child("Model").unwrap_or(root)
    };
    parser.ir.meta.model_name = model.attr_non_empty("name").map(str::to_string);
    parser.members(model, None, None);

    parser.profile_applications(root);
    let extensions: Vec<&Element> = root.children_named("Extension").collect();
    for extension in &extensions {
        parser.extension_elements(extension);
        parser.extension_connectors(extension);
    }
    if !parser.has_uml_relationships() {
        for extension in &extensions {
            parser.legacy_links(extension);
        }
    }
    parser.apply_archimate_profile();
    for extension in &extensions {
        parser.diagrams(extension);
    }

    let ir = parser.ir;
    debug!(
        folders = ir.folders.len(),
        elements = ir.elements.len(),
        relationships = ir.relationships.len(),
        views = ir.views.len(),
        "parsed EA XMI document"
    );
    Ok(ir)
}

impl<'d> XmiParser<'d, '_> {
    fn synthetic_id(&mut self, prefix: &str) -> String {
        self.synthetic += 1;
        format!("{prefix}_synth_{}", self.synthetic)
    }

    fn id_or_synthetic(&mut self, el: &Element, prefix: &str, what: &str) -> String {
        if let Some(id) = xmi_id(el) {
            return id.to_string();
        }
        let id = self.synthetic_id(prefix);
        self.report.warn(
            "missing-id",
            format!("{what} has no xmi:id; generated one"),
            sample(&[("name", el.attr("name").unwrap_or("")), ("generatedId", &id)]),
        );
        id
    }

    fn has_uml_relationships(&self) -> bool {
        !self.ir.relationships.is_empty()
    }

    /// Walk the members of a package (or classifier).
    fn members(&mut self, container: &'d Element, folder: Option<&str>, owner: Option<&str>) {
        for child in container.children() {
            if !matches!(child.local_name(), "packagedElement" | "ownedMember" | "nestedClassifier") {
                continue;
            }
            let Some(kind) = uml_kind(child) else {
                continue;
            };
            match kind {
                "Package" | "Model" | "Profile" => {
                    let id = self.id_or_synthetic(child, "eaPkg", "Package");
                    let mut ir_folder = IrFolder::new(id.clone(), child.attr("name").unwrap_or(""));
                    ir_folder.parent_id = folder.map(str::to_string);
                    ir_folder.documentation = comment_body(child);
                    self.ir.folders.push(ir_folder);
                    self.members(child, Some(id.as_str()), None);
                }
                "Association" => self.association(child, false, folder),
                "AssociationClass" => self.association(child, true, folder),
                kind => match packaged_relationship(kind) {
                    Some((source_attr, target_attr)) => {
                        self.packaged_relationship(child, kind, source_attr, target_attr)
                    }
                    None => self.classifier(child, kind, folder, owner),
                },
            }
        }
    }

    fn classifier(&mut self, el: &'d Element, kind: &str, folder: Option<&str>, owner: Option<&str>) {
        let id = self.id_or_synthetic(el, "eaEl", "Element");
        let type_name = format!("uml.{}", lower_camel(kind));
        let mut element = IrElement::new(id.clone(), type_name, el.attr("name").unwrap_or(""));
        element.folder_id = folder.map(str::to_string);
        element.parent_element_id = owner.map(str::to_string);
        element.documentation = comment_body(el);
        for flag in ["isAbstract", "isLeaf", "isActive"] {
            if let Some(value) = el.attr_bool(flag) {
                element.attrs.insert(flag.to_string(), IrValue::from(value));
            }
        }
        if let Some(visibility) = el.attr_non_empty("visibility") {
            element.attrs.insert("visibility".to_string(), IrValue::from(visibility));
        }
        let attributes: Vec<IrValue> = el
            .children_named("ownedAttribute")
            .filter(|a| a.attr_non_empty("association").is_none())
            .filter_map(|a| a.attr_non_empty("name"))
            .map(IrValue::from)
            .collect();
        if !attributes.is_empty() {
            element.attrs.insert("attributes".to_string(), IrValue::List(attributes));
        }
        let operations: Vec<IrValue> = el
            .children_named("ownedOperation")
            .filter_map(|o| o.attr_non_empty("name"))
            .map(IrValue::from)
            .collect();
        if !operations.is_empty() {
            element.attrs.insert("operations".to_string(), IrValue::List(operations));
        }
        self.ir.elements.push(element);

        for child in el.children() {
            if let Some((type_name, target_attr)) = nested_relationship(child.local_name()) {
                let rel_id = self.id_or_synthetic(child, "eaRel", "Relationship");
                let target = first_ref(child, target_attr)
                    .or_else(|| first_ref(child, "supplier"))
                    .unwrap_or("");
                let source = first_ref(child, "client").unwrap_or(id.as_str());
                self.ir.relationships.push(IrRelationship::new(rel_id, type_name, source, target));
            }
        }
        self.members(el, folder, Some(id.as_str()));
    }

    fn packaged_relationship(&mut self, el: &Element, kind: &str, source_attr: &str, target_attr: &str) {
        let id = self.id_or_synthetic(el, "eaRel", "Relationship");
        let mut relationship = IrRelationship::new(
            id,
            format!("uml.{}", lower_camel(kind)),
            first_ref(el, source_attr).unwrap_or(""),
            first_ref(el, target_attr).unwrap_or(""),
        );
        relationship.name = el.attr_non_empty("name").map(str::to_string);
        relationship.documentation = comment_body(el);
        if let Some(conveyed) = el.attr_non_empty("conveyed") {
            relationship.attrs.insert("conveyed".to_string(), IrValue::from(conveyed));
        }
        self.ir.relationships.push(relationship);
    }

    /// Association ends in memberEnd order, resolved through the id index.
    fn association_ends(&self, association: &'d Element) -> Vec<&'d Element> {
        let mut ends: Vec<&'d Element> = association
            .children_named("memberEnd")
            .filter_map(|m| xmi_idref(m).or_else(|| m.attr_non_empty("idref")))
            .filter_map(|id| self.by_id.get(id).copied())
            .collect();
        if ends.is_empty() {
            ends = association.children_named("ownedEnd").collect();
        }
        // EA tags its end ids with src/dst; prefer that over memberEnd order.
        if ends.len() == 2 {
            let is_source = |e: &Element| xmi_id(e).map(|id| id.contains("src")).unwrap_or(false);
            if is_source(ends[1]) && !is_source(ends[0]) {
                ends.swap(0, 1);
            }
        }
        ends
    }

    fn end_attrs(&self, association: &Element, end: &Element) -> IrValue {
        let mut map = IrAttrs::new();
        if let Some(role) = end.attr_non_empty("name") {
            map.insert("role".to_string(), IrValue::from(role));
        }
        if let Some(multiplicity) = multiplicity(end) {
            map.insert("multiplicity".to_string(), IrValue::from(multiplicity));
        }
        let end_id = xmi_id(end).unwrap_or("");
        let navigable = end.is("ownedAttribute")
            || association
                .children_named("navigableOwnedEnd")
                .any(|n| xmi_idref(n) == Some(end_id))
            || end.attr_bool("isNavigable").unwrap_or(false);
        map.insert("navigable".to_string(), IrValue::from(navigable));
        if let Some(aggregation) = end.attr_non_empty("aggregation") {
            map.insert("aggregation".to_string(), IrValue::from(aggregation));
        }
        IrValue::Map(map)
    }

    fn association(&mut self, el: &'d Element, is_class: bool, folder: Option<&str>) {
        let id = self.id_or_synthetic(el, "eaRel", "Association");
        let ends = self.association_ends(el);
        let end_type = |end: &&Element| {
            end.attr_exact("type")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .or_else(|| end.child("type").and_then(xmi_idref))
                .unwrap_or("")
                .to_string()
        };
        let source = ends.first().map(end_type).unwrap_or_default();
        let target = ends.get(1).map(end_type).unwrap_or_default();
        if ends.len() != 2 {
            self.report.warn(
                "association-ends",
                "Association does not have exactly two ends",
                sample(&[("id", &id), ("ends", &ends.len().to_string())]),
            );
        }

        let relationship_id = if is_class {
            format!("{id}{ASSOCIATION_SUFFIX}")
        } else {
            id.clone()
        };
        let mut relationship =
            IrRelationship::new(relationship_id.clone(), "uml.association", source, target);
        relationship.name = el.attr_non_empty("name").map(str::to_string);
        relationship.documentation = comment_body(el);
        if let Some(end) = ends.first() {
            relationship.attrs.insert("sourceEnd".to_string(), self.end_attrs(el, end));
        }
        if let Some(end) = ends.get(1) {
            relationship.attrs.insert("targetEnd".to_string(), self.end_attrs(el, end));
        }

        if is_class {
            relationship.attrs.insert(
                keys::ASSOCIATION_CLASS_ELEMENT_ID.to_string(),
                IrValue::from(id.as_str()),
            );
            let mut element =
                IrElement::new(id.clone(), "uml.associationClass", el.attr("name").unwrap_or(""));
            element.folder_id = folder.map(str::to_string);
            element.documentation = relationship.documentation.clone();
            element.attrs.insert(
                keys::ASSOCIATION_RELATIONSHIP_ID.to_string(),
                IrValue::from(relationship_id),
            );
            self.ir.elements.push(element);
        }
        self.ir.relationships.push(relationship);
    }

    /// Top-level profile applications (`<ArchiMate3:ArchiMate_BusinessActor base_Class="..."/>`).
    fn profile_applications(&mut self, root: &Element) {
        for application in root.children() {
            let Some(archimate) = archimate_stereotype(application.local_name()) else {
                continue;
            };
            let base = application
                .attributes()
                .iter()
                .find(|a| a.local_name().starts_with("base_"))
                .map(|a| a.value.trim().to_string());
            if let Some(base) = base.filter(|b| !b.is_empty()) {
                self.stereotypes.insert(base, archimate.to_string());
            }
        }
    }

    fn record_stereotype(&mut self, id: &str, properties: Option<&Element>) -> Option<String> {
        let stereotype = properties?.attr_non_empty("stereotype")?;
        if let Some(archimate) = archimate_stereotype(stereotype) {
            self.stereotypes
                .entry(id.to_string())
                .or_insert_with(|| archimate.to_string());
        }
        Some(stereotype.to_string())
    }

    fn extension_elements(&mut self, extension: &Element) {
        let Some(elements) = extension.child("elements") else {
            return;
        };
        for entry in elements.children_named("element") {
            let Some(id) = xmi_idref(entry) else {
                continue;
            };
            let properties = entry.child("properties");
            let stereotype = self.record_stereotype(id, properties);
            let documentation = properties
                .and_then(|p| p.attr_non_empty("documentation"))
                .map(str::to_string);
            let tags = extension_tags(entry);
            let Some(element) = self.ir.elements.iter_mut().find(|e| e.id == id) else {
                continue;
            };
            if element.documentation.is_none() {
                element.documentation = documentation;
            }
            if let Some(stereotype) = stereotype {
                element.attrs.insert("stereotype".to_string(), IrValue::from(stereotype));
            }
            for (key, value) in tags {
                push_extension_tag(&mut element.meta, &key, &value);
            }
        }
    }

    fn extension_connectors(&mut self, extension: &Element) {
        let Some(connectors) = extension.child("connectors") else {
            return;
        };
        for connector in connectors.children_named("connector") {
            let Some(id) = xmi_idref(connector) else {
                continue;
            };
            let properties = connector.child("properties");
            let stereotype = self.record_stereotype(id, properties);
            let documentation = connector
                .child("documentation")
                .and_then(|d| d.attr_non_empty("value"))
                .map(str::to_string);
            let direction = properties
                .and_then(|p| p.attr_non_empty("direction"))
                .map(str::to_string);
            let tags = extension_tags(connector);
            let Some(relationship) = self.ir.relationships.iter_mut().find(|r| r.id == id) else {
                continue;
            };
            if relationship.documentation.is_none() {
                relationship.documentation = documentation;
            }
            if let Some(stereotype) = stereotype {
                relationship
                    .attrs
                    .insert("stereotype".to_string(), IrValue::from(stereotype));
            }
            if let Some(direction) = direction {
                relationship
                    .attrs
                    .insert("direction".to_string(), IrValue::from(direction));
            }
            for (key, value) in tags {
                push_extension_tag(&mut relationship.meta, &key, &value);
            }
        }
    }

    /// Pre-UML2 exports list relationships as `<links>` under each element.
    fn legacy_links(&mut self, extension: &Element) {
        let Some(elements) = extension.child("elements") else {
            return;
        };
        let mut added = 0usize;
        for entry in elements.children_named("element") {
            let Some(links) = entry.child("links") else {
                continue;
            };
            for link in links.children() {
                let Some(id) = xmi_id(link) else {
                    continue;
                };
                if self.ir.relationships.iter().any(|r| r.id == id) {
                    continue;
                }
                let relationship = IrRelationship::new(
                    id,
                    format!("uml.{}", lower_camel(link.local_name())),
                    link.attr("start").unwrap_or("").trim(),
                    link.attr("end").unwrap_or("").trim(),
                );
                self.ir.relationships.push(relationship);
                added += 1;
            }
        }
        if added > 0 {
            self.report.info(
                "legacy-links",
                "Relationships read from legacy <links> blocks",
                sample(&[("count", &added.to_string())]),
            );
        }
    }

    fn apply_archimate_profile(&mut self) {
        if self.stereotypes.is_empty() {
            return;
        }
        for element in &mut self.ir.elements {
            if let Some(archimate) = self.stereotypes.get(&element.id) {
                let uml_type = std::mem::replace(&mut element.type_name, archimate.clone());
                element.attrs.insert("umlType".to_string(), IrValue::from(uml_type));
            }
        }
        for relationship in &mut self.ir.relationships {
            if let Some(archimate) = self.stereotypes.get(&relationship.id) {
                let uml_type = std::mem::replace(&mut relationship.type_name, archimate.clone());
                relationship
                    .attrs
                    .insert("umlType".to_string(), IrValue::from(uml_type));
            }
        }
    }

    fn diagrams(&mut self, extension: &Element) {
        let Some(diagrams) = extension.child("diagrams") else {
            return;
        };
        for diagram in diagrams.children_named("diagram") {
            let id = self.id_or_synthetic(diagram, "eaDiagram", "Diagram");
            let properties = diagram.child("properties");
            let mut view = IrView::new(
                id.clone(),
                properties.and_then(|p| p.attr("name")).unwrap_or(""),
            );
            view.viewpoint = properties
                .and_then(|p| p.attr_non_empty("type"))
                .map(str::to_string);
            view.documentation = properties
                .and_then(|p| p.attr_non_empty("documentation"))
                .map(str::to_string);
            view.folder_id = diagram
                .child("model")
                .and_then(|m| m.attr_non_empty("package"))
                .map(str::to_string);
            if let Some(stereotype) = properties.and_then(|p| p.attr_non_empty("stereotype")) {
                view.meta.insert("stereotype".to_string(), IrValue::from(stereotype));
            }

            let Some(entries) = diagram.child("elements") else {
                self.ir.views.push(view);
                continue;
            };
            let mut node_of: FxHashMap<String, String> = FxHashMap::default();
            let mut pending_edges = Vec::new();
            for entry in entries.children_named("element") {
                let Some(subject) = entry.attr_non_empty("subject") else {
                    continue;
                };
                let geometry = entry.attr("geometry").unwrap_or("");
                if self.ir.element(subject).is_some() {
                    let mut node_id = format!("{id}:{subject}");
                    if node_of.contains_key(subject) {
                        node_id = format!("{node_id}#{}", view.nodes.len());
                    }
                    let mut node = IrViewNode::element(node_id.clone(), subject);
                    node.bounds = geometry_bounds(geometry);
                    node_of.entry(subject.to_string()).or_insert(node_id);
                    view.nodes.push(node);
                } else if self.ir.relationship(subject).is_some() {
                    pending_edges.push((subject, geometry_path(geometry)));
                }
            }
            for (subject, points) in pending_edges {
                let Some(relationship) = self.ir.relationship(subject) else {
                    continue;
                };
                let mut connection = IrViewConnection {
                    id: format!("{id}:{subject}"),
                    relationship_id: Some(subject.to_string()),
                    points,
                    ..IrViewConnection::default()
                };
                connection.source_node_id = node_of.get(&relationship.source_id).cloned();
                connection.target_node_id = node_of.get(&relationship.target_id).cloned();
                if connection.source_node_id.is_none() || connection.target_node_id.is_none() {
                    continue;
                }
                view.connections.push(connection);
            }
            self.ir.views.push(view);
        }
    }
}

/// Body of the first owned comment.
fn comment_body(el: &Element) -> Option<String> {
    let comment = el.child("ownedComment")?;
    comment
        .attr_non_empty("body")
        .or_else(|| comment.child_text("body"))
        .map(str::to_string)
}

fn extension_tags(entry: &Element) -> Vec<(String, String)> {
    let Some(tags) = entry.child("tags") else {
        return Vec::new();
    };
    tags.children_named("tag")
        .filter_map(|tag| {
            let name = tag.attr_non_empty("name")?;
            let value = tag
                .attr("value")
                .map(|v| v.split("#NOTES#").next().unwrap_or(v))
                .unwrap_or("");
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
