//! Declarative plugins described by a manifest file
//!
//! A manifest is a JSON, YAML or TOML document:
//!
//! ```toml
//! name = "docs"
//! version = "1.0.0"
//!
//! [schema.properties.title]
//! type = "string"
//!
//! [defaults]
//! title = "Handbook"
//!
//! [output]
//! path = "docs.json"
//! ```
//!
//! `schema` and `defaults` describe the plugin's configuration section. With
//! an `output` table the plugin renders its section to that file; the format
//! comes from `output.format` or the file extension.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use confkit_core::source::{DocumentFormat, parse_fragment};
use confkit_core::{ConfigFragment, GeneratedFile, OutputFormat, Plugin, ResolvedConfig, render};
use confkit_schema::Schema;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Raw manifest contents
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub defaults: Option<ConfigFragment>,
    #[serde(default)]
    pub output: Option<ManifestOutput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestOutput {
    /// Path relative to the project root
    pub path: PathBuf,
    #[serde(default)]
    pub format: Option<String>,
}

/// A plugin built from a [`PluginManifest`].
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    manifest: PluginManifest,
    schema: Option<Schema>,
    output: Option<(PathBuf, OutputFormat)>,
    origin: PathBuf,
}

impl ManifestPlugin {
    /// Read and parse the manifest at `path`.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        let plugin = Self::parse(&content, format, path)?;
        tracing::debug!(plugin = %plugin.manifest.name, path = %path.display(), "Loaded plugin manifest");
        Ok(plugin)
    }

    /// Parse manifest `content`; `origin` is used in error messages.
    pub fn parse(content: &str, format: DocumentFormat, origin: &Path) -> Result<Self> {
        let document = parse_fragment(content, format, &origin.display().to_string())?;
        let manifest: PluginManifest = serde_json::from_value(Value::Object(document))
            .map_err(|e| manifest_error(origin, e))?;
        Self::from_manifest(manifest, origin)
    }

    pub fn from_manifest(manifest: PluginManifest, origin: &Path) -> Result<Self> {
        let schema = manifest
            .schema
            .as_ref()
            .map(Schema::from_value)
            .transpose()
            .map_err(|e| manifest_error(origin, e))?;

        let output = match &manifest.output {
            Some(output) => {
                let format = match &output.format {
                    Some(name) => name.parse::<OutputFormat>(),
                    None => output
                        .path
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or_default()
                        .parse::<OutputFormat>(),
                };
                let format = format.map_err(|e| manifest_error(origin, e))?;
                Some((output.path.clone(), format))
            }
            None => None,
        };

        Ok(Self {
            manifest,
            schema,
            output,
            origin: origin.to_path_buf(),
        })
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// File the manifest was read from
    pub fn origin(&self) -> &Path {
        &self.origin
    }
}

fn manifest_error(origin: &Path, error: impl std::fmt::Display) -> Error {
    Error::Manifest {
        path: origin.to_path_buf(),
        message: error.to_string(),
    }
}

#[async_trait]
impl Plugin for ManifestPlugin {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn version(&self) -> &str {
        &self.manifest.version
    }

    fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    fn schema(&self) -> Option<Schema> {
        self.schema.clone()
    }

    fn defaults(&self) -> Option<ConfigFragment> {
        self.manifest.defaults.clone()
    }

    fn generate(&self, config: &ResolvedConfig) -> confkit_core::Result<Vec<GeneratedFile>> {
        let Some((path, format)) = &self.output else {
            return Ok(Vec::new());
        };
        let section = config
            .section(self.name())
            .cloned()
            .unwrap_or_else(|| Value::Object(ConfigFragment::new()));
        Ok(vec![GeneratedFile::new(path.clone(), render(&section, *format)?)])
    }
}
