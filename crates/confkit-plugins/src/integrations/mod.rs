//! First-party integrations
//!
//! Each integration is an independent [`Plugin`] with its own schema,
//! defaults and generated file. [`builtin_registrations`] is the single
//! table the loader's registry catalog is built from.

mod github_actions;
mod prettier;
mod renovate;
mod vite;

use std::sync::Arc;

use confkit_core::{ConfigFragment, Error, Plugin, ResolvedConfig, Result};
use serde_json::Value;

pub use github_actions::GithubActionsPlugin;
pub use prettier::PrettierPlugin;
pub use renovate::RenovatePlugin;
pub use vite::VitePlugin;

/// Version reported by every first-party integration
pub const INTEGRATION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A built-in plugin the registry catalog can hand out.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRegistration {
    pub name: &'static str,
    pub category: &'static str,
    create: fn() -> Arc<dyn Plugin>,
}

impl BuiltinRegistration {
    const fn new(name: &'static str, category: &'static str, create: fn() -> Arc<dyn Plugin>) -> Self {
        Self {
            name,
            category,
            create,
        }
    }

    /// A fresh instance of the plugin.
    pub fn create(&self) -> Arc<dyn Plugin> {
        (self.create)()
    }
}

/// All first-party integrations.
pub fn builtin_registrations() -> &'static [BuiltinRegistration] {
    const REGISTRATIONS: &[BuiltinRegistration] = &[
        BuiltinRegistration::new(prettier::NAME, "formatter", prettier::create),
        BuiltinRegistration::new(vite::NAME, "build tool", vite::create),
        BuiltinRegistration::new(github_actions::NAME, "ci workflow", github_actions::create),
        BuiltinRegistration::new(renovate::NAME, "dependency updates", renovate::create),
    ];
    REGISTRATIONS
}

/// Look up a first-party integration by name.
pub fn builtin(name: &str) -> Option<Arc<dyn Plugin>> {
    builtin_registrations()
        .iter()
        .find(|r| r.name == name)
        .map(BuiltinRegistration::create)
}

/// Names of every first-party integration, in catalog order.
pub fn builtin_names() -> Vec<&'static str> {
    builtin_registrations().iter().map(|r| r.name).collect()
}

/// The plugin's own section of the resolved configuration.
fn section<'a>(config: &'a ResolvedConfig, plugin: &str) -> Result<&'a ConfigFragment> {
    match config.section(plugin) {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::plugin(format!(
            "'{}' configuration must be a mapping",
            plugin
        ))),
        None => Err(Error::plugin(format!(
            "missing '{}' configuration section",
            plugin
        ))),
    }
}

fn fragment(value: Value) -> ConfigFragment {
    match value {
        Value::Object(map) => map,
        _ => ConfigFragment::new(),
    }
}

fn string_list(section: &ConfigFragment, key: &str) -> Vec<String> {
    section
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names() {
        assert_eq!(
            builtin_names(),
            vec!["prettier", "vite", "github-actions", "renovate"]
        );
    }

    #[test]
    fn test_created_plugins_match_catalog() {
        for registration in builtin_registrations() {
            let plugin = registration.create();
            assert_eq!(plugin.name(), registration.name);
            assert_eq!(plugin.version(), INTEGRATION_VERSION);
            assert!(plugin.schema().is_some());
            assert!(plugin.defaults().is_some());
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin("webpack").is_none());
    }
}
