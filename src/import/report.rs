//! Import diagnostics.
//!
//! Every non-fatal condition met by the parsers, normalizers and the Apply
//! stage ends up here. Issues are deduplicated on `(level, code, message)`
//! and counted; a bounded number of context samples is kept per issue. The
//! flat `warnings` list keeps one line per occurrence for legacy consumers.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default number of context samples retained per issue.
pub const DEFAULT_MAX_SAMPLES: usize = 5;

/// Severity of an import issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Info,
    Warn,
    Error,
}

/// Context attached to one occurrence of an issue (`id`, `name`, ...).
pub type IssueSample = IndexMap<String, String>;

/// Build an [`IssueSample`] from key/value pairs.
pub fn sample(pairs: &[(&str, &str)]) -> IssueSample {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// A deduplicated, counted issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub level: IssueLevel,
    pub code: String,
    pub message: String,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<IssueSample>,
}

/// Diagnostics for one import run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Importer that produced the report (`bpmn2`, `archimate-meff`, `ea-xmi`).
    pub source: String,
    /// One line per warning occurrence.
    pub warnings: Vec<String>,
    pub issues: Vec<ImportIssue>,
    /// Residual unknown element types keyed by `"ns:name"`.
    pub unknown_element_types: BTreeMap<String, usize>,
    /// Residual unknown relationship types keyed by `"ns:name"`.
    pub unknown_relationship_types: BTreeMap<String, usize>,
    #[serde(skip, default = "default_max_samples")]
    max_samples: usize,
}

fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new("")
    }
}

impl ImportReport {
    /// Create an empty report for the given importer.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            warnings: Vec::new(),
            issues: Vec::new(),
            unknown_element_types: BTreeMap::new(),
            unknown_relationship_types: BTreeMap::new(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Set how many samples are retained per issue.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Record an issue occurrence.
    pub fn record(
        &mut self,
        level: IssueLevel,
        code: &str,
        message: impl Into<String>,
        context: IssueSample,
    ) {
        let message = message.into();
        if level == IssueLevel::Warn {
            self.warnings.push(render_line(&message, &context));
        }

        let existing = self
            .issues
            .iter_mut()
            .find(|i| i.level == level && i.code == code && i.message == message);
        match existing {
            Some(issue) => {
                issue.count += 1;
                if !context.is_empty() && issue.samples.len() < self.max_samples {
                    issue.samples.push(context);
                }
            }
            None => {
                let mut samples = Vec::new();
                if !context.is_empty() && self.max_samples > 0 {
                    samples.push(context);
                }
                self.issues.push(ImportIssue {
                    level,
                    code: code.to_string(),
                    message,
                    count: 1,
                    samples,
                });
            }
        }
    }

    /// Record a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, context: IssueSample) {
        self.record(IssueLevel::Warn, code, message, context);
    }

    /// Record an informational note.
    pub fn info(&mut self, code: &str, message: impl Into<String>, context: IssueSample) {
        self.record(IssueLevel::Info, code, message, context);
    }

    /// Record an error-level issue (the item was lost).
    pub fn error(&mut self, code: &str, message: impl Into<String>, context: IssueSample) {
        self.record(IssueLevel::Error, code, message, context);
    }

    /// Number of warning occurrences.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether anything was recorded.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Find an issue by code.
    pub fn issue(&self, code: &str) -> Option<&ImportIssue> {
        self.issues.iter().find(|i| i.code == code)
    }

    /// Total occurrences recorded under `code`, across levels and messages.
    pub fn count_of(&self, code: &str) -> usize {
        self.issues
            .iter()
            .filter(|i| i.code == code)
            .map(|i| i.count)
            .sum()
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ImportReport) {
        self.warnings.extend(other.warnings);
        for issue in other.issues {
            let existing = self.issues.iter_mut().find(|i| {
                i.level == issue.level && i.code == issue.code && i.message == issue.message
            });
            match existing {
                Some(mine) => {
                    mine.count += issue.count;
                    let room = self.max_samples.saturating_sub(mine.samples.len());
                    mine.samples.extend(issue.samples.into_iter().take(room));
                }
                None => self.issues.push(issue),
            }
        }
        merge_counts_max(&mut self.unknown_element_types, other.unknown_element_types);
        merge_counts_max(
            &mut self.unknown_relationship_types,
            other.unknown_relationship_types,
        );
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Merge counts keeping the larger value per key (a scan may observe the same
/// unknown types a previous pass already counted).
pub(crate) fn merge_counts_max(into: &mut BTreeMap<String, usize>, from: BTreeMap<String, usize>) {
    for (key, count) in from {
        let slot = into.entry(key).or_insert(0);
        *slot = (*slot).max(count);
    }
}

fn render_line(message: &str, context: &IssueSample) -> String {
    if context.is_empty() {
        return message.to_string();
    }
    let details: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{message} ({})", details.join(", "))
}
