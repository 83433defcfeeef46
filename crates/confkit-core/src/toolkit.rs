//! The explicitly constructed toolkit context
//!
//! A `Toolkit` owns the plugin registry, the shared validator, the base
//! defaults and every transformer plugins registered. Nothing here is
//! process-global; tests build as many isolated toolkits as they like.

use std::sync::Arc;

use confkit_schema::{Schema, SchemaValidator};
use serde_json::{Value, json};

use crate::merge::{ConfigFragment, ConfigMerger};
use crate::plugin::{
    GENERATE_AFTER, GENERATE_BEFORE, GeneratedFile, HookContext, Plugin, PluginContext,
    PluginRegistry, RESOLVE_AFTER, RESOLVE_BEFORE,
};
use crate::resolver::{ConfigResolver, ResolvedConfig};
use crate::settings::Settings;
use crate::source::{ConfigSource, PluginDefaultsSource, Precedence, StaticSource};
use crate::transform::Transformer;
use crate::{Error, Result};

/// Name of the built-in defaults source
const BASE_SOURCE: &str = "built-in defaults";

#[derive(Debug, Default)]
pub struct Toolkit {
    registry: PluginRegistry,
    validator: SchemaValidator,
    precedence: Precedence,
    merger: ConfigMerger,
    base: ConfigFragment,
    transformers: Vec<Transformer>,
}

impl Toolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// A toolkit configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new()
            .with_validator(settings.validator())
            .with_precedence(settings.precedence.clone())
            .with_merger(settings.merger()?))
    }

    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_merger(mut self, merger: ConfigMerger) -> Self {
        self.merger = merger;
        self
    }

    /// Built-in defaults, the lowest-precedence layer.
    pub fn with_base(mut self, base: ConfigFragment) -> Self {
        self.base = base;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn base(&self) -> &ConfigFragment {
        &self.base
    }

    pub fn transformers(&self) -> &[Transformer] {
        &self.transformers
    }

    /// Register `plugin` and run its setup.
    ///
    /// If setup fails the plugin is unregistered again and nothing it did
    /// through its context is kept.
    pub async fn install(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.registry.register(Arc::clone(&plugin))?;
        let name = plugin.name().to_string();

        let mut context = PluginContext::new(name.clone(), self.base.clone(), self.validator.clone());
        if let Err(source) = plugin.setup(&mut context).await {
            self.registry.unregister(&name)?;
            return Err(Error::PluginSetup {
                name,
                source: Box::new(source),
            });
        }

        let (base, transformers) = context.into_parts();
        self.base = base;
        self.transformers.extend(transformers);
        Ok(())
    }

    /// Remove a plugin together with its hooks and transformers.
    pub fn uninstall(&mut self, name: &str) -> Result<()> {
        self.registry.unregister(name)?;
        self.transformers.retain(|t| t.owner() != Some(name));
        Ok(())
    }

    /// Root schema with each plugin's schema under its name.
    pub fn schema(&self) -> Schema {
        self.registry.combined_schema()
    }

    /// A resolver wired with this toolkit's policy, schema and transformers.
    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new()
            .with_precedence(self.precedence.clone())
            .with_merger(self.merger.clone())
            .with_validator(self.validator.clone())
            .with_schema(self.schema())
            .with_transformers(self.transformers.clone())
    }

    /// Resolve `sources` plus plugin defaults and the base defaults.
    ///
    /// The toolkit's own layers are appended after `sources`, so a caller's
    /// source of the same kind outranks them.
    pub async fn resolve(&self, sources: Vec<Box<dyn ConfigSource>>) -> Result<ResolvedConfig> {
        let mut all = sources;
        all.push(Box::new(PluginDefaultsSource::new(&self.registry)));
        all.push(Box::new(StaticSource::defaults(BASE_SOURCE, self.base.clone())));

        let names: Vec<&str> = all.iter().map(|s| s.name()).collect();
        let payload = json!({ "sources": names });

        let resolved = self
            .resolver()
            .resolve_with(&all, |merged| {
                let mut context =
                    HookContext::new(RESOLVE_BEFORE, std::mem::take(merged)).with_payload(payload);
                let outcome = self.registry.call_hook(RESOLVE_BEFORE, &mut context);
                *merged = context.config;
                outcome.map(|_| ())
            })
            .await?;

        let mut context = HookContext::new(RESOLVE_AFTER, resolved.values().clone())
            .with_payload(resolved.provenance_value());
        self.registry.call_hook(RESOLVE_AFTER, &mut context)?;

        Ok(resolved)
    }

    /// Collect generated files from every plugin in registration order.
    pub fn generate(&self, config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        let mut context = HookContext::new(GENERATE_BEFORE, config.values().clone());
        self.registry.call_hook(GENERATE_BEFORE, &mut context)?;

        let mut files = Vec::new();
        for plugin in self.registry.iter() {
            let generated = plugin.generate(config)?;
            tracing::debug!(plugin = plugin.name(), files = generated.len(), "Generated files");
            files.extend(generated);
        }

        let paths: Vec<Value> = files
            .iter()
            .map(|f| Value::String(f.path.display().to_string()))
            .collect();
        let mut context = HookContext::new(GENERATE_AFTER, config.values().clone())
            .with_payload(Value::Array(paths));
        self.registry.call_hook(GENERATE_AFTER, &mut context)?;

        Ok(files)
    }
}
