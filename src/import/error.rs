//! Error types for import operations.

use thiserror::Error;

use super::apply::SinkError;

/// Fatal errors that abort the import of a file.
///
/// Everything recoverable (dangling references, empty names, unknown types)
/// is recorded in the [`ImportReport`](super::ImportReport) instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error while reading the input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A structural precondition of the dialect is violated (e.g. missing root element).
    #[error("{format}: expected root element <{expected}>, found <{found}>")]
    Structural {
        format: &'static str,
        expected: &'static str,
        found: String,
    },

    /// No registered importer recognized the input.
    #[error("Unsupported format: {file_name}")]
    UnsupportedFormat { file_name: String },

    /// Invalid import configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model sink could not allocate a new model.
    #[error("Failed to allocate model: {0}")]
    ModelAllocation(#[source] SinkError),
}

impl ImportError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a structural error for a missing or wrong root element.
    pub fn missing_root(format: &'static str, expected: &'static str, found: impl Into<String>) -> Self {
        Self::Structural {
            format,
            expected,
            found: found.into(),
        }
    }

    /// Returns true for errors raised by a dialect's structural precondition.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}
