//! Common trait for dialect importers and the registry that picks one.

use super::normalize::NormalizeOptions;
use super::sniff::SniffContext;
use super::xml::Document;
use super::{ImportError, ImportReport, IrModel};

/// A normalization pass: consumes an IR and returns a repaired one.
pub type NormalizePass = fn(IrModel, &NormalizeOptions, &mut ImportReport) -> IrModel;

/// Trait for source dialect importers.
///
/// An importer owns the first half of the pipeline for its dialect:
/// detection, parsing into the IR, and the dialect-specific repair pass.
/// The generic normalizer and the Apply stage are shared.
pub trait ModelImporter: Send + Sync {
    /// Stable importer name (`bpmn2`, `archimate-meff`, `ea-xmi`).
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str {
        ""
    }

    /// File extensions commonly used by this dialect.
    fn extensions(&self) -> &'static [&'static str];

    /// Default `system` used for external ids and unknown-type namespaces.
    fn source_system(&self) -> &'static str;

    /// Quick detection on a bounded prefix. Must not fail or panic.
    fn sniff(&self, ctx: &SniffContext) -> bool;

    /// Parse a document into an unnormalized IR.
    ///
    /// Only a structural precondition (missing root element) is an error;
    /// everything else is recorded in `report` and left to normalization.
    fn parse(&self, doc: &Document, report: &mut ImportReport) -> Result<IrModel, ImportError>;

    /// The dialect-specific normalization pass.
    fn format_pass(&self) -> NormalizePass;
}

/// Ordered list of importers; the first sniffer to match wins.
pub struct ImporterRegistry {
    importers: Vec<Box<dyn ModelImporter>>,
}

impl ImporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Register an importer. An importer with the same name is replaced in place.
    pub fn register<I: ModelImporter + 'static>(&mut self, importer: I) {
        match self
            .importers
            .iter_mut()
            .find(|existing| existing.name() == importer.name())
        {
            Some(slot) => *slot = Box::new(importer),
            None => self.importers.push(Box::new(importer)),
        }
    }

    /// Create a registry with the built-in importers (BPMN2, MEFF, EA-XMI).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::bpmn::BpmnImporter);
        registry.register(super::meff::MeffImporter);
        registry.register(super::xmi::EaXmiImporter);
        registry
    }

    /// Get an importer by name.
    pub fn get(&self, name: &str) -> Option<&dyn ModelImporter> {
        self.importers
            .iter()
            .find(|i| i.name() == name)
            .map(|i| i.as_ref())
    }

    /// Pick the first importer whose sniffer accepts the input.
    pub fn detect(&self, ctx: &SniffContext) -> Option<&dyn ModelImporter> {
        self.importers
            .iter()
            .find(|i| i.sniff(ctx))
            .map(|i| i.as_ref())
    }

    /// Registered importer names, in detection order.
    pub fn names(&self) -> Vec<&'static str> {
        self.importers.iter().map(|i| i.name()).collect()
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
