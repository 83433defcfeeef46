//! Renovate dependency-update integration, writes `renovate.json`

use std::sync::Arc;

use async_trait::async_trait;
use confkit_core::{ConfigFragment, GeneratedFile, Plugin, ResolvedConfig, Result};
use confkit_schema::Schema;
use serde_json::{Value, json};

use super::{INTEGRATION_VERSION, fragment, section};

pub(super) const NAME: &str = "renovate";

pub const RENOVATE_CONFIG: &str = "renovate.json";

const SCHEMA_URL: &str = "https://docs.renovatebot.com/renovate-schema.json";

pub(super) fn create() -> Arc<dyn Plugin> {
    Arc::new(RenovatePlugin)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RenovatePlugin;

#[async_trait]
impl Plugin for RenovatePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        INTEGRATION_VERSION
    }

    fn description(&self) -> Option<&str> {
        Some("Renovate dependency update bot")
    }

    fn schema(&self) -> Option<Schema> {
        Some(
            Schema::object()
                .property("extends", Schema::array(Schema::string()))
                .property("schedule", Schema::array(Schema::string()))
                .property("automerge", Schema::boolean())
                .property("labels", Schema::array(Schema::string()))
                .property(
                    "prConcurrentLimit",
                    Schema {
                        minimum: Some(0.into()),
                        ..Schema::integer()
                    },
                ),
        )
    }

    fn defaults(&self) -> Option<ConfigFragment> {
        Some(fragment(json!({
            "extends": ["config:recommended"],
            "schedule": ["before 6am on monday"],
            "automerge": false,
            "labels": ["dependencies"]
        })))
    }

    fn generate(&self, config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        let options = section(config, NAME)?;

        let mut document = ConfigFragment::new();
        document.insert("$schema".into(), Value::String(SCHEMA_URL.into()));
        document.extend(options.clone());

        let contents = serde_json::to_string_pretty(&Value::Object(document))?;
        Ok(vec![GeneratedFile::new(RENOVATE_CONFIG, format!("{}\n", contents))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_core::Provenance;

    #[test]
    fn test_schema_reference_comes_first() {
        let config = ResolvedConfig::new(
            fragment(json!({ NAME: {"automerge": true, "labels": ["deps"]} })),
            Provenance::new(),
        );

        let files = RenovatePlugin.generate(&config).unwrap();

        insta::assert_snapshot!(files[0].contents, @r#"
{
  "$schema": "https://docs.renovatebot.com/renovate-schema.json",
  "automerge": true,
  "labels": [
    "deps"
  ]
}
"#);
    }
}
