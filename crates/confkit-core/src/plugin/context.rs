//! Capabilities handed to a plugin during setup

use std::fmt;
use std::path::Path;

use confkit_schema::{ConfigPath, Schema, SchemaValidator, ValidationResult};
use serde_json::Value;

use crate::merge::ConfigFragment;
use crate::transform::Transformer;
use crate::{Error, Result};

/// Logger that tags every event with the plugin's name
#[derive(Debug, Clone)]
pub struct PluginLogger {
    plugin: String,
}

impl PluginLogger {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(plugin = %self.plugin, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(plugin = %self.plugin, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(plugin = %self.plugin, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(plugin = %self.plugin, "{}", message);
    }
}

/// Context passed to [`super::Plugin::setup`].
///
/// The context works on a copy of the toolkit's base configuration; the
/// toolkit adopts the copy and any registered transformers only if setup
/// succeeds.
#[derive(Debug)]
pub struct PluginContext {
    plugin: String,
    config: ConfigFragment,
    validator: SchemaValidator,
    transformers: Vec<Transformer>,
    logger: PluginLogger,
}

impl PluginContext {
    pub fn new(plugin: impl Into<String>, config: ConfigFragment, validator: SchemaValidator) -> Self {
        let plugin = plugin.into();
        Self {
            logger: PluginLogger::new(plugin.clone()),
            plugin,
            config,
            validator,
            transformers: Vec::new(),
        }
    }

    /// Name of the plugin being set up
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The base configuration as seen so far.
    pub fn config(&self) -> &ConfigFragment {
        &self.config
    }

    /// Read a value by dotted path.
    pub fn get(&self, path: &str) -> Result<Option<&Value>> {
        let path = ConfigPath::parse(path)?;
        Ok(path.get_in(&self.config))
    }

    /// Write a value into the base configuration by dotted path.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let path = ConfigPath::parse(path)?;
        if path.is_root() {
            return Err(Error::plugin("cannot replace the configuration root"));
        }
        let mut root = Value::Object(std::mem::take(&mut self.config));
        let outcome = path.set(&mut root, value);
        if let Value::Object(map) = root {
            self.config = map;
        }
        outcome.map_err(Error::from)
    }

    /// Parse a schema document.
    pub fn load_schema(&self, document: &Value) -> Result<Schema> {
        Ok(Schema::from_value(document)?)
    }

    /// Read and parse a JSON schema file.
    pub async fn load_schema_file(&self, path: &Path) -> Result<Schema> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Schema::from_json_str(&content)?)
    }

    /// Validate `data` with the toolkit's shared validator.
    pub fn validate(&self, data: &Value, schema: &Schema) -> Result<ValidationResult> {
        Ok(self.validator.validate(data, schema)?)
    }

    pub fn logger(&self) -> &PluginLogger {
        &self.logger
    }

    /// Register a transformer that runs on every merged configuration.
    pub fn register_transformer<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(ConfigFragment) -> Result<ConfigFragment> + Send + Sync + 'static,
    {
        let transformer = Transformer::new(name, transform).owned_by(self.plugin.clone());
        self.logger
            .debug(format_args!("Registered transformer '{}'", transformer.name()));
        self.transformers.push(transformer);
    }

    /// Hand the adopted state back to the toolkit.
    pub(crate) fn into_parts(self) -> (ConfigFragment, Vec<Transformer>) {
        (self.config, self.transformers)
    }
}
