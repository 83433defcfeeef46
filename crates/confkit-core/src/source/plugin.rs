//! Defaults declared by registered plugins

use async_trait::async_trait;

use super::{ConfigSource, SourceKind};
use crate::Result;
use crate::merge::ConfigFragment;
use crate::plugin::PluginRegistry;

/// Snapshot of every plugin's defaults, each nested under its plugin name.
#[derive(Debug, Clone)]
pub struct PluginDefaultsSource {
    fragment: ConfigFragment,
}

impl PluginDefaultsSource {
    pub fn new(registry: &PluginRegistry) -> Self {
        Self {
            fragment: registry.defaults(),
        }
    }
}

#[async_trait]
impl ConfigSource for PluginDefaultsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Plugin
    }

    fn name(&self) -> &str {
        "plugin defaults"
    }

    async fn load(&self) -> Result<ConfigFragment> {
        Ok(self.fragment.clone())
    }
}
