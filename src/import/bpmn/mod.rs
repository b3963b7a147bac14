//! BPMN 2.0 importer.
//!
//! Reads `<definitions>` documents: collaborations (pools, message flows),
//! processes with their lanes, flow nodes, sequence flows and data
//! associations, and BPMNDI diagrams.

mod normalize;
mod parser;

pub use normalize::normalize_bpmn;
pub use parser::{element_type, parse_bpmn};

use super::importer::{ModelImporter, NormalizePass};
use super::sniff::SniffContext;
use super::xml::Document;
use super::{ImportError, ImportReport, IrModel};

/// Importer name and report source.
pub const FORMAT: &str = "bpmn2";

/// BPMN 2.0 semantic model namespace.
pub const BPMN_MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";

/// Parser-to-normalizer meta key: the process a top-level node belongs to.
pub(crate) const PROCESS_ID: &str = "bpmnProcessId";

/// Detect a BPMN 2.0 document.
pub fn sniff_bpmn(ctx: &SniffContext) -> bool {
    if !ctx.root_is("definitions") {
        return false;
    }
    ctx.contains(BPMN_MODEL_NS) || ctx.contains("<bpmn:definitions") || ctx.contains("<bpmn2:definitions")
}

/// Importer for BPMN 2.0 XML.
#[derive(Debug, Default, Clone, Copy)]
pub struct BpmnImporter;

impl ModelImporter for BpmnImporter {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "BPMN 2.0 process and collaboration diagrams"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["bpmn", "bpmn2", "xml"]
    }

    fn source_system(&self) -> &'static str {
        "bpmn"
    }

    fn sniff(&self, ctx: &SniffContext) -> bool {
        sniff_bpmn(ctx)
    }

    fn parse(&self, doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
        parse_bpmn(doc, report)
    }

    fn format_pass(&self) -> NormalizePass {
        normalize_bpmn
    }
}
