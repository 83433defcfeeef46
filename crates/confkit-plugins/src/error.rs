//! Error types for confkit-plugins

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid plugin spec '{0}'")]
    InvalidSpec(String),

    #[error("Invalid plugin manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error(transparent)]
    Core(#[from] confkit_core::Error),

    #[error(transparent)]
    Schema(#[from] confkit_schema::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// A spec that parsed but cannot be turned into a plugin.
    pub fn load(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Core(confkit_core::Error::PluginLoad {
            spec: spec.into(),
            reason: reason.into(),
        })
    }
}

impl From<Error> for confkit_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Core(inner) => inner,
            Error::Schema(inner) => inner.into(),
            Error::Io(inner) => inner.into(),
            Error::Json(inner) => inner.into(),
            other => confkit_core::Error::plugin(other.to_string()),
        }
    }
}
