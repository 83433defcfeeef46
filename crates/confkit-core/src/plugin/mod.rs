//! Plugin contract and registry
//!
//! A plugin is a capability set: a name and semver version, plus any of an
//! optional schema, optional defaults, named hooks, an async `setup` step and
//! file generation. Integrations implement [`Plugin`] as independent structs
//! and are composed through the [`PluginRegistry`].

mod context;
mod hooks;
mod registry;

pub use context::{PluginContext, PluginLogger};
pub use hooks::{
    GENERATE_AFTER, GENERATE_BEFORE, Hook, HookContext, RESOLVE_AFTER, RESOLVE_BEFORE,
    WELL_KNOWN_HOOKS, hook,
};
pub use registry::PluginRegistry;

use std::path::PathBuf;

use async_trait::async_trait;
use confkit_schema::Schema;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::merge::ConfigFragment;
use crate::resolver::ResolvedConfig;

/// A file produced by a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Path relative to the project root
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// The plugin capability set.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique, non-empty name; also the key of the plugin's configuration section
    fn name(&self) -> &str;

    /// Semantic version string
    fn version(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Schema for the plugin's configuration section
    fn schema(&self) -> Option<Schema> {
        None
    }

    /// Defaults for the plugin's configuration section
    fn defaults(&self) -> Option<ConfigFragment> {
        None
    }

    /// Hooks keyed by hook name, in the order they should run
    fn hooks(&self) -> Vec<(String, Hook)> {
        Vec::new()
    }

    /// One-time initialization after registration.
    async fn setup(&self, _context: &mut PluginContext) -> Result<()> {
        Ok(())
    }

    /// Files derived from the resolved configuration.
    fn generate(&self, _config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        Ok(Vec::new())
    }
}
