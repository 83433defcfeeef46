//! Toolkit settings read from `.confkit/settings.toml`

use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confkit_schema::{ConfigPath, SchemaValidator, ValidateOptions, ValidatorCache};
use serde::{Deserialize, Serialize};

use crate::merge::{ArrayStrategy, ConfigMerger};
use crate::source::{DEFAULT_ENV_PREFIX, Precedence};
use crate::{Error, Result};

/// Settings file location relative to the project root
pub const SETTINGS_PATH: &str = ".confkit/settings.toml";

fn default_env_prefix() -> String {
    DEFAULT_ENV_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

/// How the toolkit itself behaves
///
/// ```toml
/// env_prefix = "APP_"
/// coerce = true
/// apply_defaults = true
/// cache_capacity = 64
/// precedence = ["args", "env", "file", "plugin", "defaults"]
///
/// [array_strategies]
/// "build.plugins" = "append"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Prefix for environment variable overrides
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// Coerce string inputs during validation
    #[serde(default = "default_true")]
    pub coerce: bool,

    /// Fill schema defaults for missing optional properties
    #[serde(default = "default_true")]
    pub apply_defaults: bool,

    /// Bound on cached validators; unbounded when absent
    #[serde(default)]
    pub cache_capacity: Option<NonZeroUsize>,

    /// Source kinds, highest precedence first
    #[serde(default)]
    pub precedence: Precedence,

    /// Array merge strategy by dotted path
    #[serde(default)]
    pub array_strategies: BTreeMap<String, ArrayStrategy>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env_prefix: default_env_prefix(),
            coerce: true,
            apply_defaults: true,
            cache_capacity: None,
            precedence: Precedence::default(),
            array_strategies: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML content
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `<root>/.confkit/settings.toml`, or defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "No settings file found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(path = %path.display(), "Loading settings");
        let content = fs::read_to_string(&path)?;
        Self::parse(&content).map_err(|e| Error::Settings {
            path,
            message: e.to_string(),
        })
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(SETTINGS_PATH)
    }

    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            coerce: self.coerce,
            apply_defaults: self.apply_defaults,
        }
    }

    /// A validator with its own cache sized by `cache_capacity`.
    pub fn validator(&self) -> SchemaValidator {
        let cache = match self.cache_capacity {
            Some(capacity) => ValidatorCache::new().with_capacity(capacity),
            None => ValidatorCache::new(),
        };
        SchemaValidator::new(Arc::new(cache)).with_options(self.validate_options())
    }

    /// A merger carrying the configured array strategies.
    pub fn merger(&self) -> Result<ConfigMerger> {
        self.array_strategies
            .iter()
            .try_fold(ConfigMerger::new(), |merger, (path, strategy)| {
                Ok(merger.with_strategy(ConfigPath::parse(path)?, *strategy))
            })
    }
}
