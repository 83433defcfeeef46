//! Error types for confkit-schema

/// Result type for confkit-schema operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised for malformed schemas and paths.
///
/// Data that fails validation is never reported through this type; it is
/// carried by [`crate::ValidationResult::errors`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schema document is structurally invalid
    #[error("Invalid schema at {pointer}: {message}")]
    InvalidSchema { pointer: String, message: String },

    /// A `$ref` does not name a known definition
    #[error("Unresolved schema reference {reference} at {pointer}")]
    UnresolvedReference { pointer: String, reference: String },

    /// A `pattern` constraint is not a valid regular expression
    #[error("Invalid pattern {pattern:?} at {pointer}: {source}")]
    InvalidPattern {
        pointer: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A dotted path could not be parsed
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// A path walks through a value of the wrong shape
    #[error("Cannot address '{path}': {message}")]
    PathConflict { path: String, message: String },

    /// JSON parsing error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(pointer: &str, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            pointer: pointer.to_string(),
            message: message.into(),
        }
    }
}
