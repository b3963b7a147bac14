//! # archimport
//!
//! Import pipeline for enterprise-architecture model files.
//!
//! ## Module Structure
//!
//! ```text
//! import    → sniff, parse (BPMN 2.0, ArchiMate MEFF, EA XMI), normalize, apply
//!   ↓
//! model     → domain model, ModelSink implementations
//!   ↓
//! config    → ImportConfig
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Import configuration
pub mod config;

/// Sniffers, parsers, normalizers and the Apply stage
pub mod import;

/// Domain model produced by Apply
pub mod model;

// Re-export the pipeline entry points
pub use config::{ImportConfig, TagLimits, UnknownTypePolicy};
pub use import::{
    ApplyOptions, ApplyResult, IdMappings, ImportError, ImportReport, ImporterRegistry, IrModel,
    ModelSink, ParsedImport, SinkError, import_bytes, import_file, parse_and_normalize,
};
pub use model::{MemoryStore, Model, ModelId};
