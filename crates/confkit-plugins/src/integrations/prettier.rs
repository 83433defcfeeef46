//! Prettier formatter integration, writes `.prettierrc.json`

use std::sync::Arc;

use async_trait::async_trait;
use confkit_core::{ConfigFragment, GeneratedFile, Plugin, ResolvedConfig, Result};
use confkit_schema::Schema;
use serde_json::{Value, json};

use super::{INTEGRATION_VERSION, fragment, section};

pub(super) const NAME: &str = "prettier";

/// Path of the generated file, relative to the project root
pub const PRETTIER_RC: &str = ".prettierrc.json";

pub(super) fn create() -> Arc<dyn Plugin> {
    Arc::new(PrettierPlugin)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrettierPlugin;

#[async_trait]
impl Plugin for PrettierPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        INTEGRATION_VERSION
    }

    fn description(&self) -> Option<&str> {
        Some("Prettier code formatter options")
    }

    fn schema(&self) -> Option<Schema> {
        Some(
            Schema::object()
                .property("semi", Schema::boolean())
                .property("singleQuote", Schema::boolean())
                .property(
                    "tabWidth",
                    Schema {
                        minimum: Some(0.into()),
                        ..Schema::integer()
                    },
                )
                .property(
                    "printWidth",
                    Schema {
                        minimum: Some(1.into()),
                        ..Schema::integer()
                    },
                )
                .property(
                    "trailingComma",
                    Schema::enumeration([json!("all"), json!("es5"), json!("none")]),
                ),
        )
    }

    fn defaults(&self) -> Option<ConfigFragment> {
        Some(fragment(json!({
            "semi": true,
            "singleQuote": false,
            "tabWidth": 2,
            "printWidth": 80,
            "trailingComma": "all"
        })))
    }

    fn generate(&self, config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        let options = section(config, NAME)?;
        let contents = serde_json::to_string_pretty(&Value::Object(options.clone()))?;
        Ok(vec![GeneratedFile::new(PRETTIER_RC, format!("{}\n", contents))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_core::Provenance;

    fn resolved(options: Value) -> ResolvedConfig {
        ResolvedConfig::new(fragment(json!({ NAME: options })), Provenance::new())
    }

    #[test]
    fn test_generates_rc_file() {
        let files = PrettierPlugin
            .generate(&resolved(json!({"semi": false, "tabWidth": 4})))
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path.to_str(), Some(PRETTIER_RC));
        insta::assert_snapshot!(files[0].contents, @r#"
{
  "semi": false,
  "tabWidth": 4
}
"#);
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let config = ResolvedConfig::default();
        assert!(PrettierPlugin.generate(&config).is_err());
    }
}
