//! Configuration sources
//!
//! A source produces one [`ConfigFragment`] per resolution. Sources are
//! loaded sequentially in [`Precedence`] order:
//!
//! | kind | source | default rank |
//! |---|---|---|
//! | `args` | [`ArgsSource`] | 1 (highest) |
//! | `env` | [`EnvSource`] | 2 |
//! | `file` | [`FileSource`] | 3 |
//! | `plugin` | [`PluginDefaultsSource`] | 4 |
//! | `defaults` | [`StaticSource`], [`FileSource::user_global`] | 5 (lowest) |

mod args;
mod env;
mod file;
mod memory;
mod plugin;

pub use args::{ArgsSource, parse_value};
pub use env::{DEFAULT_ENV_PREFIX, EnvSource};
pub use file::{DocumentFormat, FileSource, parse_fragment};
pub use memory::StaticSource;
pub use plugin::PluginDefaultsSource;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::merge::ConfigFragment;

/// Category of a configuration source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Command-line overrides
    Args,
    /// Environment variables
    Env,
    /// Project configuration files
    File,
    /// Defaults declared by plugins
    Plugin,
    /// Built-in and user-global defaults
    Defaults,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Args => "args",
            Self::Env => "env",
            Self::File => "file",
            Self::Plugin => "plugin",
            Self::Defaults => "defaults",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "args" => Ok(Self::Args),
            "env" => Ok(Self::Env),
            "file" => Ok(Self::File),
            "plugin" => Ok(Self::Plugin),
            "defaults" => Ok(Self::Defaults),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// One input to resolution.
///
/// `load` may suspend on I/O. A failing optional source is replaced by an
/// empty fragment; a failing required source aborts resolution.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Human-readable identifier used in logs and errors
    fn name(&self) -> &str;

    fn is_required(&self) -> bool {
        false
    }

    async fn load(&self) -> Result<ConfigFragment>;
}

/// Ordered list of source kinds, highest precedence first.
///
/// Sources of the same kind keep their relative order, so the earlier one
/// wins. Kinds missing from the list rank below every listed kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Precedence(Vec<SourceKind>);

impl Precedence {
    /// Build a precedence list, dropping repeated kinds.
    pub fn new(kinds: impl IntoIterator<Item = SourceKind>) -> Self {
        let mut order = Vec::new();
        for kind in kinds {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
        Self(order)
    }

    pub fn kinds(&self) -> &[SourceKind] {
        &self.0
    }

    /// Position of `kind`; lower means higher precedence.
    pub fn rank(&self, kind: SourceKind) -> usize {
        self.0
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.0.len())
    }

    /// Sort `sources` highest precedence first.
    pub fn order<'a>(&self, sources: &'a [Box<dyn ConfigSource>]) -> Vec<&'a dyn ConfigSource> {
        let mut ordered: Vec<&dyn ConfigSource> = sources.iter().map(|s| s.as_ref()).collect();
        ordered.sort_by_key(|source| self.rank(source.kind()));
        ordered
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Self(vec![
            SourceKind::Args,
            SourceKind::Env,
            SourceKind::File,
            SourceKind::Plugin,
            SourceKind::Defaults,
        ])
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(SourceKind::as_str).collect();
        f.write_str(&names.join(" > "))
    }
}
