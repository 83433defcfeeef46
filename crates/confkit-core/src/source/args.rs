//! Command-line `path=value` overrides

use async_trait::async_trait;
use confkit_schema::ConfigPath;
use serde_json::Value;

use super::{ConfigSource, SourceKind};
use crate::merge::ConfigFragment;
use crate::{Error, Result};

/// Overrides given as `path=value` pairs.
///
/// The value is parsed as JSON when it is valid JSON (`42`, `true`,
/// `["a"]`) and kept as a plain string otherwise.
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    overrides: Vec<(ConfigPath, Value)>,
}

impl ArgsSource {
    /// Parse overrides, failing on the first malformed one.
    pub fn parse<I, S>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for raw in overrides {
            let raw = raw.as_ref();
            let (path, value) = raw
                .split_once('=')
                .ok_or_else(|| Error::InvalidOverride(raw.to_string()))?;
            let path = ConfigPath::parse(path.trim())?;
            if path.is_root() {
                return Err(Error::InvalidOverride(raw.to_string()));
            }
            parsed.push((path, parse_value(value)));
        }
        Ok(Self { overrides: parsed })
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Interpret an override value: JSON when it parses, a string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl ConfigSource for ArgsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Args
    }

    fn name(&self) -> &str {
        "command line"
    }

    fn is_required(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<ConfigFragment> {
        let mut root = Value::Object(ConfigFragment::new());
        for (path, value) in &self.overrides {
            path.set(&mut root, value.clone())?;
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
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("42", json!(42))]
    #[case("true", json!(true))]
    #[case("[\"a\",\"b\"]", json!(["a", "b"]))]
    #[case("hello world", json!("hello world"))]
    #[case("", json!(""))]
    fn values_parse_as_json_or_string(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(parse_value(raw), expected);
    }

    #[tokio::test]
    async fn overrides_build_nested_fragment() {
        let source = ArgsSource::parse(["output.format=yaml", "jobs[0].name=build", "debug=true"]).unwrap();
        let fragment = source.load().await.unwrap();
        assert_eq!(
            Value::Object(fragment),
            json!({
                "output": {"format": "yaml"},
                "jobs": [{"name": "build"}],
                "debug": true
            })
        );
    }

    #[test]
    fn missing_equals_is_rejected() {
        assert!(matches!(
            ArgsSource::parse(["output.format"]),
            Err(Error::InvalidOverride(_))
        ));
    }

    #[tokio::test]
    async fn conflicting_overrides_fail_to_load() {
        let source = ArgsSource::parse(["a=1", "a.b=2"]).unwrap();
        assert!(source.load().await.is_err());
    }
}
