//! Configuration files (JSON, YAML, TOML)

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{ConfigSource, SourceKind};
use crate::merge::ConfigFragment;
use crate::{Error, Result};

/// File stems searched by [`FileSource::discover`], highest precedence first
const PROJECT_STEMS: &[&str] = &["confkit.local", "confkit.config"];

/// Document syntaxes understood by file sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [Self::Json, Self::Yaml, Self::Toml];

    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Extensions tried during discovery.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
            Self::Toml => &["toml"],
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
            Self::Toml => write!(f, "TOML"),
        }
    }
}

/// Parse `content` into a fragment.
///
/// An empty YAML document is an empty fragment; any other non-mapping
/// document is an error.
pub fn parse_fragment(content: &str, format: DocumentFormat, name: &str) -> Result<ConfigFragment> {
    let value: Value = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        DocumentFormat::Toml => toml::from_str(content)?,
    };
    match value {
        Value::Object(fragment) => Ok(fragment),
        Value::Null => Ok(ConfigFragment::new()),
        other => Err(Error::NotAMapping {
            name: name.to_string(),
            found: confkit_schema::value::type_name(&other),
        }),
    }
}

/// A configuration file on disk.
///
/// Optional by default: a missing optional file loads as an empty fragment.
/// A file that exists but does not parse is always an error.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    kind: SourceKind,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            name,
            kind: SourceKind::File,
            required: false,
        }
    }

    /// Fail resolution if this file is missing.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project files under `root`: every `confkit.local.<ext>` then every
    /// `confkit.config.<ext>` that exists.
    pub fn discover(root: &Path) -> Vec<FileSource> {
        let mut found = Vec::new();
        for stem in PROJECT_STEMS {
            for format in DocumentFormat::ALL {
                for extension in format.extensions() {
                    let candidate = root.join(format!("{}.{}", stem, extension));
                    if candidate.is_file() {
                        tracing::debug!(path = %candidate.display(), "Discovered configuration file");
                        found.push(FileSource::new(candidate));
                    }
                }
            }
        }
        found
    }

    /// The project file `set` should edit: the first existing
    /// `confkit.config.<ext>`, if any.
    pub fn project_file(root: &Path) -> Option<PathBuf> {
        Self::discover(root)
            .into_iter()
            .map(|source| source.path)
            .find(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem == "confkit.config")
            })
    }

    /// `<config_dir>/confkit/config.toml` as a `defaults` source.
    pub fn user_global() -> Option<FileSource> {
        dirs::config_dir().map(|dir| Self::user_global_in(&dir))
    }

    /// The user-global file below an explicit configuration directory.
    pub fn user_global_in(config_dir: &Path) -> FileSource {
        FileSource::new(config_dir.join("confkit").join("config.toml")).with_kind(SourceKind::Defaults)
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_required(&self) -> bool {
        self.required
    }

    async fn load(&self) -> Result<ConfigFragment> {
        let format = DocumentFormat::from_path(&self.path)?;
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                tracing::debug!(path = %self.path.display(), "Optional configuration file not found, skipping");
                return Ok(ConfigFragment::new());
            }
            Err(e) => return Err(e.into()),
        };
        parse_fragment(&content, format, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    #[rstest]
    #[case("a.json", DocumentFormat::Json)]
    #[case("a.yaml", DocumentFormat::Yaml)]
    #[case("a.YML", DocumentFormat::Yaml)]
    #[case("a.toml", DocumentFormat::Toml)]
    fn format_from_extension(#[case] file: &str, #[case] expected: DocumentFormat) {
        assert_eq!(DocumentFormat::from_path(Path::new(file)).unwrap(), expected);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            DocumentFormat::from_path(Path::new("config.ini")),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[rstest]
    #[case(DocumentFormat::Json, r#"{"output": {"path": "x.json"}}"#)]
    #[case(DocumentFormat::Yaml, "output:\n  path: x.json\n")]
    #[case(DocumentFormat::Toml, "[output]\npath = \"x.json\"\n")]
    fn every_format_yields_the_same_fragment(#[case] format: DocumentFormat, #[case] content: &str) {
        let fragment = parse_fragment(content, format, "test").unwrap();
        assert_eq!(Value::Object(fragment), json!({"output": {"path": "x.json"}}));
    }

    #[test]
    fn empty_yaml_is_empty_fragment() {
        assert!(parse_fragment("", DocumentFormat::Yaml, "empty").unwrap().is_empty());
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            parse_fragment("42", DocumentFormat::Json, "n"),
            Err(Error::NotAMapping { .. })
        ));
    }

    #[tokio::test]
    async fn missing_optional_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path().join("confkit.config.toml"));
        assert!(source.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_required_file_fails() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path().join("confkit.config.toml")).required();
        assert!(matches!(source.load().await, Err(Error::Io(_))));
    }

    #[test]
    fn discover_orders_local_before_project() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("confkit.config.yaml"), "a: 1\n").unwrap();
        std::fs::write(temp.path().join("confkit.local.json"), "{}").unwrap();
        std::fs::write(temp.path().join("unrelated.json"), "{}").unwrap();

        let names: Vec<_> = FileSource::discover(temp.path())
            .iter()
            .map(|s| s.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["confkit.local.json", "confkit.config.yaml"]);
        assert_eq!(
            FileSource::project_file(temp.path()),
            Some(temp.path().join("confkit.config.yaml"))
        );
    }

    #[test]
    fn user_global_is_a_defaults_source() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::user_global_in(temp.path());
        assert_eq!(source.kind(), SourceKind::Defaults);
        assert!(source.path().ends_with("confkit/config.toml"));
    }
}
