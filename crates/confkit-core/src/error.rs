//! Error types for confkit-core

use std::path::PathBuf;

use confkit_schema::ValidationError;

use crate::source::SourceKind;

/// Result type for confkit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving configuration or driving plugins
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration source failed to load
    #[error("Failed to load {kind} source '{name}': {source}")]
    SourceLoad {
        kind: SourceKind,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A source produced something other than a mapping
    #[error("Expected a mapping in {name}, found {found}")]
    NotAMapping { name: String, found: &'static str },

    /// A file extension that no document parser handles
    #[error("Unsupported configuration format for {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Merged configuration failed schema validation
    #[error("Configuration is invalid ({} error(s)):{}", .errors.len(), list_errors(.errors))]
    Validation { errors: Vec<ValidationError> },

    /// A plugin could not be registered
    #[error("Cannot register plugin '{name}': {reason}")]
    PluginRegistration { name: String, reason: String },

    /// No plugin with this name is registered
    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String },

    /// A plugin's setup step failed
    #[error("Setup failed for plugin '{name}': {source}")]
    PluginSetup {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A hook returned an error; later hooks under the same name did not run
    #[error("Hook '{hook}' from plugin '{plugin}' failed: {source}")]
    HookFailed {
        hook: String,
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    /// A plugin specifier could not be turned into a plugin
    #[error("Cannot load plugin '{spec}': {reason}")]
    PluginLoad { spec: String, reason: String },

    /// Failure reported by plugin code
    #[error("{message}")]
    Plugin { message: String },

    /// A transformer rejected the merged configuration
    #[error("Transformer '{name}' failed: {source}")]
    Transform {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Output format identifier not recognized
    #[error("Unknown output format '{0}' (expected json, yaml, ts or js)")]
    UnknownFormat(String),

    /// A `path=value` override without `=`
    #[error("Invalid override '{0}', expected <path>=<value>")]
    InvalidOverride(String),

    /// Toolkit settings file is malformed
    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Schema or path error from confkit-schema
    #[error(transparent)]
    Schema(#[from] confkit_schema::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// An error raised from plugin code such as a hook or a setup step.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin {
            message: message.into(),
        }
    }
}

fn list_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("\n  - {}", error))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_schema::ConfigPath;

    #[test]
    fn validation_error_lists_every_failure() {
        let error = Error::Validation {
            errors: vec![
                ValidationError {
                    path: ConfigPath::parse("x").unwrap(),
                    message: "missing required property".into(),
                },
                ValidationError {
                    path: ConfigPath::parse("y").unwrap(),
                    message: "missing required property".into(),
                },
            ],
        };

        let display = error.to_string();
        assert!(display.contains("(2 error(s))"), "got: {}", display);
        assert!(display.contains("\n  - x: missing required property"));
        assert!(display.contains("\n  - y: missing required property"));
    }

    #[test]
    fn source_load_error_names_the_source() {
        let error = Error::SourceLoad {
            kind: SourceKind::File,
            name: "confkit.config.toml".into(),
            source: Box::new(Error::plugin("boom")),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load file source 'confkit.config.toml': boom"
        );
    }
}
