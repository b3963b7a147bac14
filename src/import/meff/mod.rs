//! ArchiMate Model Exchange File Format importer.

mod normalize;
mod parser;

pub use normalize::normalize_meff;
pub use parser::parse_meff;

use super::importer::{ModelImporter, NormalizePass};
use super::sniff::SniffContext;
use super::xml::Document;
use super::{ImportError, ImportReport, IrModel};

/// Importer name and report source.
pub const FORMAT: &str = "archimate-meff";

/// Namespace prefix shared by the 2.x and 3.x exchange schemas.
pub const ARCHIMATE_NS_PREFIX: &str = "http://www.opengroup.org/xsd/archimate";

pub(crate) const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Detect an ArchiMate exchange document, prefixed or not.
pub fn sniff_meff(ctx: &SniffContext) -> bool {
    ctx.root_is("model") && ctx.contains(ARCHIMATE_NS_PREFIX)
}

/// Importer for the Open Group ArchiMate exchange format.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeffImporter;

impl ModelImporter for MeffImporter {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "ArchiMate Model Exchange File Format (2.1 and 3.x)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn source_system(&self) -> &'static str {
        "archimate"
    }

    fn sniff(&self, ctx: &SniffContext) -> bool {
        sniff_meff(ctx)
    }

    fn parse(&self, doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError> {
        parse_meff(doc, report)
    }

    fn format_pass(&self) -> NormalizePass {
        normalize_meff
    }
}
