//! Environment variable overrides

use std::ffi::OsString;

use async_trait::async_trait;
use confkit_schema::{ConfigPath, PathSegment};
use serde_json::Value;

use super::{ConfigSource, SourceKind};
use crate::Result;
use crate::merge::ConfigFragment;

/// Prefix used when none is configured
pub const DEFAULT_ENV_PREFIX: &str = "CONFKIT_";

/// Variables named `<PREFIX><KEY>[__<KEY>...]`.
///
/// `__` separates nesting levels and keys are lower-cased, so
/// `CONFKIT_OUTPUT__FORMAT=yaml` becomes `{"output": {"format": "yaml"}}`.
/// Values stay strings; schema coercion turns them into numbers or booleans.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: Option<Vec<(String, String)>>,
    ignored: Vec<String>,
}

impl EnvSource {
    /// Read the process environment with [`DEFAULT_ENV_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
            ignored: Vec::new(),
        }
    }

    /// Read from `vars` instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Skip these variable names even when they carry the prefix.
    pub fn ignoring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn path_for(&self, name: &str) -> Option<ConfigPath> {
        if self.ignored.iter().any(|ignored| ignored == name) {
            return None;
        }
        let rest = name.strip_prefix(&self.prefix)?;
        if rest.is_empty() {
            return None;
        }
        let mut path = ConfigPath::root();
        for part in rest.split("__") {
            if part.is_empty() {
                return None;
            }
            path.push(PathSegment::Key(part.to_lowercase()));
        }
        Some(path)
    }
}

/// Keep variables whose name and value are both valid UTF-8.
fn unicode_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                tracing::trace!(
                    variable = %name.unwrap_or_else(|n| n.to_string_lossy().into_owned()),
                    "Skipping non-UTF-8 environment variable"
                );
                None
            }
        })
        .collect()
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigSource for EnvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Env
    }

    fn name(&self) -> &str {
        "environment"
    }

    async fn load(&self) -> Result<ConfigFragment> {
        let mut vars = match &self.vars {
            Some(vars) => vars.clone(),
            None => unicode_vars(std::env::vars_os()),
        };
        // Deterministic regardless of environment ordering
        vars.sort();

        let mut root = Value::Object(ConfigFragment::new());
        for (name, value) in vars {
            let Some(path) = self.path_for(&name) else {
                continue;
            };
            tracing::trace!(variable = %name, path = %path, "Mapped environment variable");
            path.set(&mut root, Value::String(value))?;
        }

        match root {
            Value::Object(fragment) => Ok(fragment),
            _ => Ok(ConfigFragment::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn nested_keys_from_double_underscore() {
        let source = EnvSource::new().with_vars([
            ("CONFKIT_OUTPUT__FORMAT", "yaml"),
            ("CONFKIT_PORT", "8080"),
            ("OTHER_VAR", "ignored"),
            ("CONFKIT_", "ignored"),
            ("CONFKIT_BAD____KEY", "ignored"),
        ]);

        let fragment = source.load().await.unwrap();

        assert_eq!(
            Value::Object(fragment),
            json!({"output": {"format": "yaml"}, "port": "8080"})
        );
    }

    #[tokio::test]
    async fn custom_prefix() {
        let source = EnvSource::with_prefix("APP_").with_vars([("APP_DEBUG", "true")]);
        let fragment = source.load().await.unwrap();
        assert_eq!(fragment.get("debug"), Some(&json!("true")));
    }

    #[tokio::test]
    async fn ignored_names_are_skipped() {
        let source = EnvSource::new()
            .with_vars([("CONFKIT_DIR", "/tmp"), ("CONFKIT_PORT", "1")])
            .ignoring(["CONFKIT_DIR"]);
        let fragment = source.load().await.unwrap();
        assert_eq!(Value::Object(fragment), json!({"port": "1"}));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = unicode_vars([
            (OsString::from("CONFKIT_PORT"), OsString::from("1")),
            (OsString::from("CONFKIT_BAD"), OsString::from_vec(vec![0x66, 0x6f, 0xff])),
            (OsString::from_vec(vec![0x43, 0xff]), OsString::from("x")),
        ]);

        assert_eq!(vars, vec![("CONFKIT_PORT".to_string(), "1".to_string())]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_environment_with_non_unicode_value_loads() {
        use std::os::unix::ffi::OsStringExt;

        let name = "CONFKIT_ENV_SOURCE_TEST_LATIN1";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(name, OsString::from_vec(vec![0x66, 0x6f, 0xff])) };
        let loaded = EnvSource::with_prefix("CONFKIT_ENV_SOURCE_TEST_").load().await;
        unsafe { std::env::remove_var(name) };

        assert_eq!(loaded.unwrap(), ConfigFragment::new());
    }

    #[tokio::test]
    async fn scalar_and_nested_on_same_key_conflict() {
        let source = EnvSource::new().with_vars([("CONFKIT_A", "1"), ("CONFKIT_A__B", "2")]);
        assert!(source.load().await.is_err());
    }
}
