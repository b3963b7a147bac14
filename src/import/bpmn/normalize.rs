//! BPMN-specific repair: pool and lane containment, then the shared tail.

use rustc_hash::FxHashMap;

use super::PROCESS_ID;
use crate::import::ir::IrValue;
use crate::import::normalize::NormalizeOptions;
use crate::import::normalize::common::finish_format_pass;
use crate::import::{ImportReport, IrModel};

/// The BPMN normalization pass.
pub fn normalize_bpmn(ir: IrModel, options: &NormalizeOptions, report: &mut ImportReport) -> IrModel {
    let ir = map_containment(ir);
    finish_format_pass(ir, options, report)
}

fn lane_depth(lane: &str, lane_parents: &FxHashMap<String, Option<String>>) -> usize {
    let mut depth = 0;
    let mut cursor = lane_parents.get(lane).cloned().flatten();
    while let Some(parent) = cursor {
        depth += 1;
        if depth > lane_parents.len() {
            break;
        }
        cursor = lane_parents.get(&parent).cloned().flatten();
    }
    depth
}

/// Project lane `flowNodeRef`s and pool `processRef`s onto `parent_element_id`.
///
/// The innermost lane listing a node wins. Nodes without a lane fall back to
/// the pool of their process. Nested sub-process content is left as parsed.
fn map_containment(mut ir: IrModel) -> IrModel {
    let pool_of_process: FxHashMap<String, String> = ir
        .elements
        .iter()
        .filter(|e| e.type_name == "bpmn.pool")
        .filter_map(|e| {
            let process = e.attrs.get("processRef").and_then(IrValue::as_str)?;
            Some((process.to_string(), e.id.clone()))
        })
        .collect();

    let lane_parents: FxHashMap<String, Option<String>> = ir
        .elements
        .iter()
        .filter(|e| e.type_name == "bpmn.lane")
        .map(|e| (e.id.clone(), e.parent_element_id.clone()))
        .collect();
    let mut lanes: Vec<(usize, String, Vec<String>)> = ir
        .elements
        .iter()
        .filter(|e| e.type_name == "bpmn.lane")
        .map(|e| {
            let refs = e
                .attrs
                .get("flowNodeRefs")
                .and_then(IrValue::as_list)
                .unwrap_or(&[])
                .iter()
                .filter_map(IrValue::as_str)
                .map(str::to_string)
                .collect();
            (lane_depth(&e.id, &lane_parents), e.id.clone(), refs)
        })
        .collect();
    lanes.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut lane_of: FxHashMap<String, String> = FxHashMap::default();
    for (_, lane_id, refs) in &lanes {
        for node in refs {
            if node != lane_id {
                lane_of.entry(node.clone()).or_insert_with(|| lane_id.clone());
            }
        }
    }

    for element in &mut ir.elements {
        let process = element
            .meta
            .shift_remove(PROCESS_ID)
            .and_then(|v| v.as_str().map(str::to_string));
        if element.parent_element_id.is_some() || element.type_name == "bpmn.pool" {
            continue;
        }
        if element.type_name != "bpmn.lane" {
            if let Some(lane) = lane_of.get(&element.id) {
                element.parent_element_id = Some(lane.clone());
                continue;
            }
        }
        if let Some(pool) = process.and_then(|p| pool_of_process.get(&p)) {
            element.parent_element_id = Some(pool.clone());
        }
    }
    ir
}
