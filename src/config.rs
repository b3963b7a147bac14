//! Import configuration.
//!
//! Every field has a default, so a partial JSON document such as
//! `{"unknownTypePolicy": "skip"}` is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::import::ImportError;
use crate::import::sniff::DEFAULT_SNIFF_LIMIT;

/// What Apply does with a type token no taxonomy recognizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownTypePolicy {
    /// Create the item with type `Unknown` and keep the original token.
    #[default]
    ImportAsUnknown,
    /// Drop the item with a warning.
    Skip,
}

/// Caps applied when extension tags are turned into tagged values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagLimits {
    pub max_tags: usize,
    pub max_key_length: usize,
    pub max_value_length: usize,
}

impl Default for TagLimits {
    fn default() -> Self {
        Self {
            max_tags: 50,
            max_key_length: 80,
            max_value_length: 500,
        }
    }
}

/// Configuration for one import run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfig {
    /// Bytes inspected by the sniffers.
    pub sniff_limit_bytes: usize,
    /// Overrides the importer's default source system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    pub unknown_type_policy: UnknownTypePolicy,
    pub remove_dangling_relationships: bool,
    pub tags: TagLimits,
    pub max_issue_samples: usize,
    /// Name for the allocated model; defaults to the document's model name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sniff_limit_bytes: DEFAULT_SNIFF_LIMIT,
            source_system: None,
            unknown_type_policy: UnknownTypePolicy::default(),
            remove_dangling_relationships: true,
            tags: TagLimits::default(),
            max_issue_samples: crate::import::report::DEFAULT_MAX_SAMPLES,
            model_name: None,
        }
    }
}

impl ImportConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, ImportError> {
        serde_json::from_str(input).map_err(|e| ImportError::config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!("Loaded import config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Set the source system override.
    pub fn with_source_system(mut self, system: impl Into<String>) -> Self {
        self.source_system = Some(system.into());
        self
    }

    /// Set the unknown type policy.
    pub fn with_unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_type_policy = policy;
        self
    }

    /// Keep relationships whose endpoints do not resolve.
    pub fn keep_dangling_relationships(mut self) -> Self {
        self.remove_dangling_relationships = false;
        self
    }

    /// Set the model name override.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }
}
