//! First-party plugins for confkit
//!
//! - [`integrations`]: formatter, build tool, CI workflow and dependency bot
//!   plugins, each an independent [`confkit_core::Plugin`]
//! - [`manifest`]: declarative plugins read from a JSON, YAML or TOML file
//! - [`loader`]: [`PluginSpec`] parsing and loading

pub mod error;
pub mod integrations;
pub mod loader;
pub mod manifest;

pub use error::{Error, Result};
pub use integrations::{
    GithubActionsPlugin, PrettierPlugin, RenovatePlugin, VitePlugin, builtin, builtin_names,
    builtin_registrations,
};
pub use loader::{PluginLoader, PluginSpec};
pub use manifest::{ManifestPlugin, PluginManifest};
