//! The project a command operates on

use std::path::{Path, PathBuf};

use confkit_core::source::{ArgsSource, DocumentFormat, EnvSource, FileSource, parse_fragment};
use confkit_core::{ConfigSource, ResolvedConfig, Settings, Toolkit};
use confkit_plugins::PluginLoader;
use serde_json::Value;

use crate::cli::{CLI_ENV_VARS, GlobalArgs};
use crate::error::{CliError, Result};

/// Key of the plugin list in the project configuration file
const PLUGINS_KEY: &str = "plugins";

/// Root directory named by `--dir`, or the current directory.
pub fn project_root(global: &GlobalArgs) -> Result<PathBuf> {
    match &global.dir {
        Some(dir) if dir.is_dir() => Ok(dir.clone()),
        Some(dir) => Err(CliError::user(format!(
            "Project directory not found: {}",
            dir.display()
        ))),
        None => Ok(std::env::current_dir()?),
    }
}

/// Settings, toolkit and overrides for one invocation.
pub struct Project {
    root: PathBuf,
    settings: Settings,
    toolkit: Toolkit,
    overrides: Vec<String>,
}

impl Project {
    /// Load settings and install every declared plugin.
    pub async fn open(global: &GlobalArgs) -> Result<Self> {
        let root = project_root(global)?;
        let mut settings = Settings::load(&root)?;
        if let Some(prefix) = &global.env_prefix {
            settings.env_prefix = prefix.clone();
        }
        if global.no_coerce {
            settings.coerce = false;
        }

        let mut toolkit = Toolkit::from_settings(&settings)?;
        let loader = PluginLoader::new(&root);
        for spec in plugin_specs(&root, &global.plugins)? {
            let plugin = loader.load_str(&spec).await?;
            toolkit.install(plugin).await?;
        }

        Ok(Self {
            root,
            settings,
            toolkit,
            overrides: global.overrides.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Command line, environment, project files and the user's global file.
    pub fn sources(&self) -> Result<Vec<Box<dyn ConfigSource>>> {
        let mut sources: Vec<Box<dyn ConfigSource>> = Vec::new();
        sources.push(Box::new(ArgsSource::parse(&self.overrides)?));
        sources.push(Box::new(
            EnvSource::with_prefix(self.settings.env_prefix.clone())
                .ignoring(CLI_ENV_VARS.iter().copied()),
        ));
        // Discovered files exist, so a parse failure is fatal
        for file in FileSource::discover(&self.root) {
            sources.push(Box::new(file.required()));
        }
        if let Some(global) = FileSource::user_global() {
            sources.push(Box::new(global));
        }
        Ok(sources)
    }

    pub async fn resolve(&self) -> Result<ResolvedConfig> {
        Ok(self.toolkit.resolve(self.sources()?).await?)
    }
}

/// Plugins declared in the project file followed by those given on the
/// command line, without repeats.
fn plugin_specs(root: &Path, extra: &[String]) -> Result<Vec<String>> {
    let mut specs = declared_plugins(root)?;
    for spec in extra {
        if !specs.contains(spec) {
            specs.push(spec.clone());
        }
    }
    Ok(specs)
}

fn declared_plugins(root: &Path) -> Result<Vec<String>> {
    let Some(path) = FileSource::project_file(root) else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(&path)?;
    let format = DocumentFormat::from_path(&path)?;
    let document = parse_fragment(&content, format, &path.display().to_string())?;

    match document.get(PLUGINS_KEY) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    CliError::user(format!(
                        "'{}' in {} must list plugin specs as strings",
                        PLUGINS_KEY,
                        path.display()
                    ))
                })
            })
            .collect(),
        Some(_) => Err(CliError::user(format!(
            "'{}' in {} must be an array",
            PLUGINS_KEY,
            path.display()
        ))),
    }
}
