//! Plugin registry storage and hook dispatch

use std::fmt;
use std::sync::Arc;

use confkit_schema::Schema;
use serde_json::Value;

use super::Plugin;
use super::hooks::{HookContext, RegisteredHook};
use crate::merge::ConfigFragment;
use crate::{Error, Result};

/// Central registry of plugins, in registration order.
///
/// Registration is all-or-nothing: a rejected plugin leaves the registry
/// exactly as it was.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    hooks: Vec<RegisteredHook>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin and its hooks.
    ///
    /// Fails on an empty name, a name with surrounding whitespace, a
    /// duplicate name, a version that is not semver, or a hook with an
    /// empty name.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        let rejected = |reason: String| Error::PluginRegistration {
            name: if name.trim().is_empty() {
                "<unnamed>".to_string()
            } else {
                name.clone()
            },
            reason,
        };

        if name.trim().is_empty() {
            return Err(rejected("plugin has no name".into()));
        }
        if name.trim() != name {
            return Err(rejected(
                "plugin name has leading or trailing whitespace".into(),
            ));
        }
        if self.contains(&name) {
            return Err(rejected("a plugin with this name is already registered".into()));
        }
        if let Err(e) = semver::Version::parse(plugin.version()) {
            return Err(rejected(format!(
                "invalid version '{}': {}",
                plugin.version(),
                e
            )));
        }

        let hooks = plugin.hooks();
        if hooks.iter().any(|(hook_name, _)| hook_name.trim().is_empty()) {
            return Err(rejected("hook registered with an empty name".into()));
        }

        tracing::info!(
            plugin = %name,
            version = plugin.version(),
            hooks = hooks.len(),
            "Registered plugin"
        );

        self.hooks
            .extend(hooks.into_iter().map(|(hook_name, hook)| RegisteredHook {
                plugin: name.clone(),
                name: hook_name,
                hook,
            }));
        self.plugins.push(plugin);
        Ok(())
    }

    /// Remove a plugin and every hook it contributed.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<dyn Plugin>> {
        let index = self
            .plugins
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| Error::PluginNotFound {
                name: name.to_string(),
            })?;

        self.hooks.retain(|hook| hook.plugin != name);
        let plugin = self.plugins.remove(index);
        tracing::info!(plugin = %name, "Unregistered plugin");
        Ok(plugin)
    }

    /// Get a plugin by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// Check if a plugin is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Plugin names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Iterate over plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Number of hooks registered under `hook`.
    pub fn hook_count(&self, hook: &str) -> usize {
        self.hooks.iter().filter(|h| h.name == hook).count()
    }

    /// Run every hook registered under `hook`, in registration order.
    ///
    /// Stops at the first failing hook; hooks after it do not run.
    pub fn call_hook(&self, hook: &str, context: &mut HookContext) -> Result<Vec<Value>> {
        let mut results = Vec::new();

        for registered in self.hooks.iter().filter(|h| h.name == hook) {
            tracing::debug!(hook, plugin = %registered.plugin, "Running hook");
            match (registered.hook)(&mut *context) {
                Ok(value) => results.push(value),
                Err(source) => {
                    return Err(Error::HookFailed {
                        hook: hook.to_string(),
                        plugin: registered.plugin.clone(),
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(results)
    }

    /// Every plugin's defaults, nested under the plugin's name.
    pub fn defaults(&self) -> ConfigFragment {
        let mut fragment = ConfigFragment::new();
        for plugin in &self.plugins {
            if let Some(defaults) = plugin.defaults() {
                fragment.insert(plugin.name().to_string(), Value::Object(defaults));
            }
        }
        fragment
    }

    /// A root object schema whose properties are the plugins' schemas by
    /// plugin name. Keys without a plugin schema are allowed.
    pub fn combined_schema(&self) -> Schema {
        self.plugins
            .iter()
            .filter_map(|plugin| plugin.schema().map(|schema| (plugin.name(), schema)))
            .fold(Schema::object(), |root, (name, schema)| {
                root.property(name, schema)
            })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.list())
            .field("hooks", &self.hooks)
            .finish()
    }
}
