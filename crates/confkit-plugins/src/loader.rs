//! Turning plugin specs into plugin instances
//!
//! A spec names where a plugin comes from:
//!
//! | spec | kind |
//! |---|---|
//! | `./docs.toml`, `../shared/lint.yaml`, `/opt/p.json`, `team.plugin.json` | local manifest |
//! | `https://example.com/plugin.json` | remote (not supported) |
//! | `vite`, `github-actions` | built-in registry catalog |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use confkit_core::Plugin;

use crate::error::{Error, Result};
use crate::integrations;
use crate::manifest::ManifestPlugin;

/// Where a plugin is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSpec {
    /// A manifest file on disk
    Local(PathBuf),
    /// A name in the built-in catalog
    Registry(String),
    /// A URL; recognized but never fetched
    Remote(String),
}

impl PluginSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(Error::InvalidSpec(spec.to_string()));
        }
        if spec.starts_with("http://") || spec.starts_with("https://") {
            return Ok(Self::Remote(spec.to_string()));
        }
        let looks_local = spec.starts_with("./")
            || spec.starts_with("../")
            || spec.starts_with('/')
            || Path::new(spec).extension().is_some();
        if looks_local {
            Ok(Self::Local(PathBuf::from(spec)))
        } else {
            Ok(Self::Registry(spec.to_string()))
        }
    }

    /// The spec's kind as a lowercase word
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Registry(_) => "registry",
            Self::Remote(_) => "remote",
        }
    }
}

impl FromStr for PluginSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Registry(name) | Self::Remote(name) => f.write_str(name),
        }
    }
}

/// Resolves [`PluginSpec`]s relative to a project root.
#[derive(Debug, Clone)]
pub struct PluginLoader {
    root: PathBuf,
}

impl PluginLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the plugin `spec` points at.
    pub async fn load(&self, spec: &PluginSpec) -> Result<Arc<dyn Plugin>> {
        tracing::debug!(spec = %spec, kind = spec.kind(), "Loading plugin");
        match spec {
            PluginSpec::Local(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.root.join(path)
                };
                if !path.is_file() {
                    return Err(Error::load(spec.to_string(), "manifest file not found"));
                }
                Ok(Arc::new(ManifestPlugin::from_path(&path).await?))
            }
            PluginSpec::Registry(name) => integrations::builtin(name).ok_or_else(|| {
                Error::load(
                    name.clone(),
                    format!(
                        "not in the plugin catalog (available: {})",
                        integrations::builtin_names().join(", ")
                    ),
                )
            }),
            PluginSpec::Remote(url) => Err(Error::load(
                url.clone(),
                "remote plugins are not supported",
            )),
        }
    }

    /// Parse and load a spec string.
    pub async fn load_str(&self, spec: &str) -> Result<Arc<dyn Plugin>> {
        self.load(&PluginSpec::parse(spec)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("./docs.toml", PluginSpec::Local(PathBuf::from("./docs.toml")))]
    #[case("../shared/lint", PluginSpec::Local(PathBuf::from("../shared/lint")))]
    #[case("/opt/plugin.json", PluginSpec::Local(PathBuf::from("/opt/plugin.json")))]
    #[case("team.plugin.yaml", PluginSpec::Local(PathBuf::from("team.plugin.yaml")))]
    #[case("vite", PluginSpec::Registry("vite".into()))]
    #[case("github-actions", PluginSpec::Registry("github-actions".into()))]
    #[case("https://example.com/p.json", PluginSpec::Remote("https://example.com/p.json".into()))]
    #[case("http://example.com/p", PluginSpec::Remote("http://example.com/p".into()))]
    fn test_parse_spec(#[case] input: &str, #[case] expected: PluginSpec) {
        assert_eq!(PluginSpec::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_empty_spec_is_invalid() {
        assert!(matches!(PluginSpec::parse("  "), Err(Error::InvalidSpec(_))));
    }

    #[tokio::test]
    async fn test_load_registry_plugin() {
        let loader = PluginLoader::new(".");
        let plugin = loader.load_str("prettier").await.unwrap();
        assert_eq!(plugin.name(), "prettier");
    }

    #[tokio::test]
    async fn test_unknown_registry_plugin() {
        let err = PluginLoader::new(".").load_str("webpack").await.err().unwrap();
        assert!(matches!(
            err,
            Error::Core(confkit_core::Error::PluginLoad { .. })
        ));
        assert!(err.to_string().contains("available: prettier, vite"));
    }

    #[tokio::test]
    async fn test_remote_plugin_is_unsupported() {
        let err = PluginLoader::new(".")
            .load_str("https://example.com/plugin.json")
            .await
            .err().unwrap();
        assert!(matches!(
            err,
            Error::Core(confkit_core::Error::PluginLoad { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_local_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = PluginLoader::new(temp.path())
            .load_str("./missing.toml")
            .await
            .err().unwrap();
        assert!(err.to_string().contains("manifest file not found"));
    }
}
