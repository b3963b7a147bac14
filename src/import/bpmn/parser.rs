//! BPMN 2.0 XML → IR.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{FORMAT, PROCESS_ID};
use crate::import::ir::{
    IrAttrs, IrBounds, IrElement, IrPoint, IrRelationship, IrValue, IrView, IrViewConnection,
    IrViewNode, keys,
};
use crate::import::normalize::common::push_extension_tag;
use crate::import::report::sample;
use crate::import::xml::{Document, Element};
use crate::import::{ImportError, ImportReport, IrModel};

/// Map a BPMN flow-node tag to its IR type token.
pub fn element_type(local: &str) -> Option<&'static str> {
    let token = match local {
        "participant" => "bpmn.pool",
        "lane" => "bpmn.lane",
        "task" => "bpmn.task",
        "userTask" => "bpmn.userTask",
        "serviceTask" => "bpmn.serviceTask",
        "scriptTask" => "bpmn.scriptTask",
        "manualTask" => "bpmn.manualTask",
        "businessRuleTask" => "bpmn.businessRuleTask",
        "sendTask" => "bpmn.sendTask",
        "receiveTask" => "bpmn.receiveTask",
        "callActivity" => "bpmn.callActivity",
        "subProcess" | "adHocSubProcess" => "bpmn.subProcess",
        "transaction" => "bpmn.transaction",
        "startEvent" => "bpmn.startEvent",
        "endEvent" => "bpmn.endEvent",
        "intermediateCatchEvent" => "bpmn.intermediateCatchEvent",
        "intermediateThrowEvent" => "bpmn.intermediateThrowEvent",
        "boundaryEvent" => "bpmn.boundaryEvent",
        "exclusiveGateway" => "bpmn.exclusiveGateway",
        "parallelGateway" => "bpmn.parallelGateway",
        "inclusiveGateway" => "bpmn.inclusiveGateway",
        "eventBasedGateway" => "bpmn.eventBasedGateway",
        "complexGateway" => "bpmn.complexGateway",
        "dataObject" => "bpmn.dataObject",
        "dataObjectReference" => "bpmn.dataObjectReference",
        "dataStoreReference" => "bpmn.dataStoreReference",
        "textAnnotation" => "bpmn.textAnnotation",
        "group" => "bpmn.group",
        _ => return None,
    };
    Some(token)
}

fn is_container(local: &str) -> bool {
    matches!(local, "subProcess" | "adHocSubProcess" | "transaction")
}

struct BpmnParser<'r> {
    ir: IrModel,
    report: &'r mut ImportReport,
    synthetic: usize,
}

/// Parse a BPMN 2.0 document.
pub fn parse_bpmn(doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
    let root = doc.root();
    if !root.is("definitions") {
        return Err(ImportError::missing_root(FORMAT, "definitions", root.name()));
    }

    let mut parser = BpmnParser {
        ir: IrModel::new(),
        report,
        synthetic: 0,
    };
    parser.ir.meta.format = Some(FORMAT.to_string());
    parser.ir.meta.tool = root.attr_non_empty("exporter").map(str::to_string);
    parser.ir.meta.tool_version = root.attr_non_empty("exporterVersion").map(str::to_string);
    parser.ir.meta.model_name = root.attr_non_empty("name").map(str::to_string);
    if let Some(namespace) = root.attr_non_empty("targetNamespace") {
        parser
            .ir
            .meta
            .extra
            .insert("targetNamespace".to_string(), IrValue::from(namespace));
    }

    for child in root.children() {
        match child.local_name() {
            "collaboration" => parser.collaboration(child),
            "process" => {
                let process_id = child.attr_non_empty("id").unwrap_or("").to_string();
                parser.flow_container(child, None, &process_id);
            }
            _ => {}
        }
    }
    for diagram in root.descendants_named("BPMNDiagram") {
        parser.diagram(diagram);
    }

    let ir = parser.ir;
    debug!(
        elements = ir.elements.len(),
        relationships = ir.relationships.len(),
        views = ir.views.len(),
        "parsed BPMN document"
    );
    Ok(ir)
}

fn documentation(el: &Element) -> Option<String> {
    let parts: Vec<&str> = el
        .children_named("documentation")
        .map(Element::text)
        .filter(|t| !t.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn event_definition(def: &Element) -> IrValue {
    let kind = def
        .local_name()
        .strip_suffix("EventDefinition")
        .unwrap_or(def.local_name());
    let mut map = IrAttrs::new();
    map.insert("kind".to_string(), IrValue::from(kind));
    for reference in ["messageRef", "errorRef", "signalRef", "escalationRef", "activityRef"] {
        if let Some(value) = def.attr_non_empty(reference) {
            map.insert(reference.to_string(), IrValue::from(value));
        }
    }
    for timer in ["timeDate", "timeDuration", "timeCycle"] {
        if let Some(value) = def.child_text(timer) {
            map.insert(timer.to_string(), IrValue::from(value));
        }
    }
    if let Some(condition) = def.child("condition").map(Element::text).filter(|t| !t.is_empty()) {
        map.insert("condition".to_string(), IrValue::from(condition));
    }
    IrValue::Map(map)
}

fn extension_pairs(el: &Element) -> Vec<(String, String)> {
    let Some(extensions) = el.child("extensionElements") else {
        return Vec::new();
    };
    extensions
        .descendants()
        .filter_map(|node| {
            let key = node.attr_non_empty("name").or_else(|| node.attr_non_empty("key"))?;
            let value = node
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| node.text().to_string());
            Some((key.to_string(), value))
        })
        .collect()
}

impl BpmnParser<'_> {
    fn next_synthetic(&mut self, prefix: &str) -> String {
        self.synthetic += 1;
        format!("{prefix}_synth_{}", self.synthetic)
    }

    fn element_id(&mut self, el: &Element, kind: &str) -> String {
        match el.attr_non_empty("id") {
            Some(id) => id.to_string(),
            None => {
                let id = self.next_synthetic("bpmn");
                self.report.warn(
                    "missing-id",
                    "BPMN node has no id; generated one",
                    sample(&[("tag", el.local_name()), ("kind", kind), ("generatedId", &id)]),
                );
                id
            }
        }
    }

    fn collaboration(&mut self, collaboration: &Element) {
        for child in collaboration.children() {
            match child.local_name() {
                "participant" => {
                    let id = self.element_id(child, "participant");
                    let mut element =
                        IrElement::new(id, "bpmn.pool", child.attr("name").unwrap_or(""));
                    element.documentation = documentation(child);
                    if let Some(process) = child.attr_non_empty("processRef") {
                        element.attrs.insert("processRef".to_string(), IrValue::from(process));
                    }
                    self.ir.elements.push(element);
                }
                "messageFlow" => {
                    let relationship = self.flow(child, "bpmn.messageFlow");
                    self.ir.relationships.push(relationship);
                }
                "association" => {
                    let relationship = self.flow(child, "bpmn.association");
                    self.ir.relationships.push(relationship);
                }
                "textAnnotation" | "group" => {
                    self.flow_node(child, None, None);
                }
                _ => {}
            }
        }
    }

    /// Walk a process or sub-process body.
    fn flow_container(&mut self, container: &Element, parent: Option<&str>, process_id: &str) {
        for child in container.children() {
            match child.local_name() {
                "laneSet" => self.lane_set(child, None, process_id),
                "sequenceFlow" => {
                    let relationship = self.flow(child, "bpmn.sequenceFlow");
                    self.ir.relationships.push(relationship);
                }
                "association" => {
                    let relationship = self.flow(child, "bpmn.association");
                    self.ir.relationships.push(relationship);
                }
                local if element_type(local).is_some() => {
                    let process = parent.is_none().then_some(process_id);
                    let id = self.flow_node(child, parent, process);
                    if is_container(local) {
                        if let Some(id) = id {
                            self.flow_container(child, Some(id.as_str()), process_id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn lane_set(&mut self, lane_set: &Element, parent_lane: Option<&str>, process_id: &str) {
        for lane in lane_set.children_named("lane") {
            let id = self.element_id(lane, "lane");
            let mut element = IrElement::new(id.clone(), "bpmn.lane", lane.attr("name").unwrap_or(""));
            element.documentation = documentation(lane);
            element.parent_element_id = parent_lane.map(str::to_string);
            let refs: Vec<IrValue> = lane
                .children_named("flowNodeRef")
                .map(Element::text)
                .filter(|t| !t.is_empty())
                .map(IrValue::from)
                .collect();
            if !refs.is_empty() {
                element.attrs.insert("flowNodeRefs".to_string(), IrValue::List(refs));
            }
            if parent_lane.is_none() && !process_id.is_empty() {
                element.meta.insert(PROCESS_ID.to_string(), IrValue::from(process_id));
            }
            self.ir.elements.push(element);
            if let Some(child_set) = lane.child("childLaneSet") {
                self.lane_set(child_set, Some(id.as_str()), process_id);
            }
        }
    }

    /// Push one flow node and its data associations; returns the id it was given.
    fn flow_node(
        &mut self,
        node: &Element,
        parent: Option<&str>,
        process_id: Option<&str>,
    ) -> Option<String> {
        let local = node.local_name();
        let type_name = element_type(local)?;
        let id = self.element_id(node, local);
        let name = match local {
            "textAnnotation" => node.child_text("text").unwrap_or(""),
            _ => node.attr("name").unwrap_or(""),
        };
        let mut element = IrElement::new(id.clone(), type_name, name);
        element.documentation = documentation(node);
        element.parent_element_id = parent.map(str::to_string);
        if let Some(process) = process_id.filter(|p| !p.is_empty()) {
            element.meta.insert(PROCESS_ID.to_string(), IrValue::from(process));
        }

        let definitions: Vec<IrValue> = node
            .children()
            .iter()
            .filter(|c| c.local_name().ends_with("EventDefinition"))
            .map(event_definition)
            .collect();
        if let Some(first) = definitions.first() {
            element.attrs.insert("eventDefinition".to_string(), first.clone());
        }
        if definitions.len() > 1 {
            element
                .attrs
                .insert("eventDefinitions".to_string(), IrValue::List(definitions));
        }

        if let Some(host) = node.attr_non_empty("attachedToRef") {
            element.attrs.insert(keys::ATTACHED_TO_REF.to_string(), IrValue::from(host));
        }
        if let Some(cancel) = node.attr_bool("cancelActivity") {
            element.attrs.insert("cancelActivity".to_string(), IrValue::from(cancel));
        }
        if let Some(default_flow) = node.attr_non_empty("default") {
            element.attrs.insert(keys::DEFAULT_FLOW.to_string(), IrValue::from(default_flow));
        }
        if let Some(direction) = node.attr_non_empty("gatewayDirection") {
            element.attrs.insert("gatewayDirection".to_string(), IrValue::from(direction));
        }
        if let Some(triggered) = node.attr_bool("triggeredByEvent") {
            element.attrs.insert("triggeredByEvent".to_string(), IrValue::from(triggered));
        }
        for reference in ["dataObjectRef", "dataStoreRef", "calledElement", "categoryValueRef"] {
            if let Some(value) = node.attr_non_empty(reference) {
                element.attrs.insert(reference.to_string(), IrValue::from(value));
            }
        }
        for (key, value) in extension_pairs(node) {
            push_extension_tag(&mut element.meta, &key, &value);
        }
        self.ir.elements.push(element);

        for association in node.children_named("dataInputAssociation") {
            let base = match association.attr_non_empty("id") {
                Some(id) => id.to_string(),
                None => self.next_synthetic(&format!("{id}_dataInput")),
            };
            for (n, source) in association
                .children_named("sourceRef")
                .map(Element::text)
                .enumerate()
            {
                let rel_id = match n {
                    0 => base.clone(),
                    n => format!("{base}_{n}"),
                };
                self.ir.relationships.push(IrRelationship::new(
                    rel_id,
                    "bpmn.dataInputAssociation",
                    source,
                    id.clone(),
                ));
            }
        }
        for association in node.children_named("dataOutputAssociation") {
            if let Some(target) = association.child_text("targetRef") {
                let rel_id = match association.attr_non_empty("id") {
                    Some(id) => id.to_string(),
                    None => self.next_synthetic(&format!("{id}_dataOutput")),
                };
                self.ir.relationships.push(IrRelationship::new(
                    rel_id,
                    "bpmn.dataOutputAssociation",
                    id.clone(),
                    target,
                ));
            }
        }
        Some(id)
    }

    fn flow(&mut self, flow: &Element, type_name: &str) -> IrRelationship {
        let id = self.element_id(flow, type_name);
        let mut relationship = IrRelationship::new(
            id,
            type_name,
            flow.attr("sourceRef").unwrap_or("").trim(),
            flow.attr("targetRef").unwrap_or("").trim(),
        );
        relationship.name = flow.attr_non_empty("name").map(str::to_string);
        relationship.documentation = documentation(flow);
        if let Some(condition) = flow
            .child("conditionExpression")
            .map(Element::text)
            .filter(|t| !t.is_empty())
        {
            relationship
                .attrs
                .insert("condition".to_string(), IrValue::from(condition));
        }
        for reference in ["messageRef", "associationDirection"] {
            if let Some(value) = flow.attr_non_empty(reference) {
                relationship.attrs.insert(reference.to_string(), IrValue::from(value));
            }
        }
        for (key, value) in extension_pairs(flow) {
            push_extension_tag(&mut relationship.meta, &key, &value);
        }
        relationship
    }

    fn diagram(&mut self, diagram: &Element) {
        let id = match diagram.attr_non_empty("id") {
            Some(id) => id.to_string(),
            None => self.next_synthetic("bpmnDiagram"),
        };
        let mut view = IrView::new(id, diagram.attr("name").unwrap_or(""));
        view.viewpoint = Some("bpmn".to_string());
        view.documentation = diagram.attr_non_empty("documentation").map(str::to_string);

        // Shape lookup by bpmnElement so edges without sourceElement/targetElement can be wired.
        let mut shape_of: FxHashMap<String, String> = FxHashMap::default();
        for plane in diagram.children_named("BPMNPlane") {
            for shape in plane.children_named("BPMNShape") {
                let Some(element_id) = shape.attr_non_empty("bpmnElement") else {
                    continue;
                };
                let node_id = shape
                    .attr_non_empty("id")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{element_id}_di"));
                let mut node = IrViewNode::element(node_id.clone(), element_id);
                node.bounds = shape.child("Bounds").and_then(read_bounds);
                if let Some(expanded) = shape.attr_bool("isExpanded") {
                    node.meta.insert("isExpanded".to_string(), IrValue::from(expanded));
                }
                if let Some(horizontal) = shape.attr_bool("isHorizontal") {
                    node.meta.insert("isHorizontal".to_string(), IrValue::from(horizontal));
                }
                shape_of.entry(element_id.to_string()).or_insert(node_id);
                view.nodes.push(node);
            }
        }

        let endpoints: FxHashMap<&str, (&str, &str)> = self
            .ir
            .relationships
            .iter()
            .map(|r| (r.id.as_str(), (r.source_id.as_str(), r.target_id.as_str())))
            .collect();
        let mut connections = Vec::new();
        for plane in diagram.children_named("BPMNPlane") {
            for edge in plane.children_named("BPMNEdge") {
                let relationship_id = edge.attr_non_empty("bpmnElement");
                let id = edge
                    .attr_non_empty("id")
                    .map(str::to_string)
                    .or_else(|| relationship_id.map(|r| format!("{r}_di")));
                let Some(id) = id else {
                    continue;
                };
                let mut connection = IrViewConnection {
                    id,
                    relationship_id: relationship_id.map(str::to_string),
                    ..IrViewConnection::default()
                };
                let (source_shape, target_shape) = match (
                    edge.attr_non_empty("sourceElement"),
                    edge.attr_non_empty("targetElement"),
                ) {
                    (Some(source), Some(target)) => (Some(source.to_string()), Some(target.to_string())),
                    _ => match relationship_id.and_then(|r| endpoints.get(r)) {
                        Some((source, target)) => {
                            (shape_of.get(*source).cloned(), shape_of.get(*target).cloned())
                        }
                        None => (None, None),
                    },
                };
                connection.source_node_id = source_shape;
                connection.target_node_id = target_shape;
                connection.points = edge
                    .children_named("waypoint")
                    .filter_map(|w| Some(IrPoint::new(w.attr_f64("x")?, w.attr_f64("y")?)))
                    .collect();
                connections.push(connection);
            }
        }
        view.connections = connections;
        self.ir.views.push(view);
    }
}

fn read_bounds(bounds: &Element) -> Option<IrBounds> {
    Some(IrBounds::new(
        bounds.attr_f64("x")?,
        bounds.attr_f64("y")?,
        bounds.attr_f64("width")?,
        bounds.attr_f64("height")?,
    ))
}
