//! Model import pipeline.
//!
//! ```text
//! bytes ─ sniff ─▶ importer ─ parse ─▶ IrModel ─ format pass ─▶ generic pass ─▶ apply ─▶ ModelSink
//! ```
//!
//! The importer is picked by the first sniffer of the [`ImporterRegistry`]
//! that accepts a bounded prefix of the input. Malformed XML, a wrong root
//! element, an unrecognized format and a failed model allocation are the only
//! errors; every other defect is repaired and recorded in the
//! [`ImportReport`].
//!
//! ## Usage
//!
//! ```ignore
//! use archimport::import::import_bytes;
//! use archimport::{ImportConfig, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! let result = import_bytes(&bytes, "model.bpmn", None, &mut store, &ImportConfig::default())?;
//! let model = store.model(&result.model_id);
//! ```

pub mod apply;
pub mod bpmn;
mod error;
pub mod importer;
pub mod ir;
pub mod meff;
pub mod normalize;
pub mod report;
pub mod sniff;
pub mod xmi;
pub mod xml;

pub use apply::{ApplyOptions, ApplyResult, IdMappings, ModelSink, SinkError, apply_ir};
pub use error::ImportError;
pub use importer::{ImporterRegistry, ModelImporter, NormalizePass};
pub use ir::IrModel;
pub use normalize::{NormalizeOptions, normalize_ir};
pub use report::{ImportIssue, ImportReport, IssueLevel};
pub use sniff::SniffContext;

use std::path::Path;

use tracing::debug;

use crate::config::ImportConfig;
use xml::Document;

/// An IR that went through both normalization passes but not Apply.
#[derive(Debug, Clone)]
pub struct ParsedImport {
    /// Name of the importer that handled the input.
    pub importer: &'static str,
    /// `system` Apply will use for external ids.
    pub source_system: String,
    pub ir: IrModel,
    pub report: ImportReport,
}

/// Sniff, parse and normalize with the built-in importers.
pub fn parse_and_normalize(
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
    config: &ImportConfig,
) -> Result<ParsedImport, ImportError> {
    parse_and_normalize_with(&ImporterRegistry::with_defaults(), bytes, file_name, mime_type, config)
}

/// Sniff, parse and normalize with a caller-provided registry.
pub fn parse_and_normalize_with(
    registry: &ImporterRegistry,
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
    config: &ImportConfig,
) -> Result<ParsedImport, ImportError> {
    let ctx = SniffContext::from_bytes(bytes, file_name, mime_type, config.sniff_limit_bytes);
    let importer = registry
        .detect(&ctx)
        .ok_or_else(|| ImportError::UnsupportedFormat {
            file_name: file_name.to_string(),
        })?;
    debug!(importer = importer.name(), file = file_name, "format detected");

    let mut report =
        ImportReport::new(importer.name()).with_max_samples(config.max_issue_samples);
    let doc = Document::parse(bytes)?;
    let ir = importer.parse(&doc, &mut report)?;
    debug!(
        folders = ir.folders.len(),
        elements = ir.elements.len(),
        relationships = ir.relationships.len(),
        views = ir.views.len(),
        "parsed"
    );

    let options = NormalizeOptions::from(config);
    let ir = normalize::run_passes(
        ir,
        &[importer.format_pass(), normalize_ir],
        &options,
        &mut report,
    );

    Ok(ParsedImport {
        importer: importer.name(),
        source_system: config
            .source_system
            .clone()
            .unwrap_or_else(|| importer.source_system().to_string()),
        ir,
        report,
    })
}

/// Run the whole pipeline on an in-memory file.
pub fn import_bytes<S: ModelSink + ?Sized>(
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ApplyResult, ImportError> {
    import_bytes_with(
        &ImporterRegistry::with_defaults(),
        bytes,
        file_name,
        mime_type,
        sink,
        config,
    )
}

/// Run the whole pipeline with a caller-provided registry.
pub fn import_bytes_with<S: ModelSink + ?Sized>(
    registry: &ImporterRegistry,
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ApplyResult, ImportError> {
    let parsed = parse_and_normalize_with(registry, bytes, file_name, mime_type, config)?;
    let mut options = ApplyOptions::from_config(config, &parsed.source_system);
    if !file_name.is_empty() {
        options = options.with_metadata("sourceFile", file_name);
    }
    apply_ir(parsed.ir, sink, &options, Some(parsed.report))
}

/// Read a file and run the whole pipeline on it.
pub fn import_file<S: ModelSink + ?Sized>(
    path: impl AsRef<Path>,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ApplyResult, ImportError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Importing {}", path.display());
    import_bytes(&bytes, &file_name, None, sink, config)
}
