//! Vite build tool integration, writes `vite.config.ts`

use std::sync::Arc;

use async_trait::async_trait;
use confkit_core::output::BANNER;
use confkit_core::{ConfigFragment, GeneratedFile, Plugin, ResolvedConfig, Result};
use confkit_schema::Schema;
use serde_json::{Value, json};

use super::{INTEGRATION_VERSION, fragment, section};

pub(super) const NAME: &str = "vite";

pub const VITE_CONFIG: &str = "vite.config.ts";

pub(super) fn create() -> Arc<dyn Plugin> {
    Arc::new(VitePlugin)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VitePlugin;

impl VitePlugin {
    fn server_schema() -> Schema {
        Schema::object()
            .property(
                "port",
                Schema {
                    minimum: Some(1.into()),
                    maximum: Some(65535.into()),
                    ..Schema::integer()
                },
            )
            .property("host", Schema::string())
            .property("open", Schema::boolean())
    }

    fn build_schema() -> Schema {
        Schema::object()
            .property(
                "outDir",
                Schema {
                    min_length: Some(1),
                    ..Schema::string()
                },
            )
            .property("sourcemap", Schema::boolean())
    }
}

#[async_trait]
impl Plugin for VitePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        INTEGRATION_VERSION
    }

    fn description(&self) -> Option<&str> {
        Some("Vite dev server and build options")
    }

    fn schema(&self) -> Option<Schema> {
        Some(
            Schema::object()
                .property("base", Schema::string())
                .property("server", Self::server_schema())
                .property("build", Self::build_schema()),
        )
    }

    fn defaults(&self) -> Option<ConfigFragment> {
        Some(fragment(json!({
            "base": "/",
            "server": {"port": 5173, "host": "localhost", "open": false},
            "build": {"outDir": "dist", "sourcemap": false}
        })))
    }

    fn generate(&self, config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        let options = section(config, NAME)?;
        let body = serde_json::to_string_pretty(&Value::Object(options.clone()))?;
        let contents = format!(
            "{}\nimport {{ defineConfig }} from 'vite';\n\nexport default defineConfig({});\n",
            BANNER, body
        );
        Ok(vec![GeneratedFile::new(VITE_CONFIG, contents)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_core::Provenance;
    use confkit_schema::SchemaValidator;

    #[test]
    fn test_generates_typescript_config() {
        let config = ResolvedConfig::new(
            fragment(json!({ NAME: {"server": {"port": 3000}} })),
            Provenance::new(),
        );

        let files = VitePlugin.generate(&config).unwrap();

        insta::assert_snapshot!(files[0].contents, @r#"
// Generated by confkit. Do not edit.
import { defineConfig } from 'vite';

export default defineConfig({
  "server": {
    "port": 3000
  }
});
"#);
    }

    #[test]
    fn test_defaults_satisfy_schema() {
        let plugin = VitePlugin;
        let defaults = Value::Object(plugin.defaults().unwrap());
        let result = SchemaValidator::default()
            .validate(&defaults, &plugin.schema().unwrap())
            .unwrap();
        assert!(result.success, "{:?}", result.errors);
    }

    #[test]
    fn test_port_out_of_range() {
        let plugin = VitePlugin;
        let result = SchemaValidator::default()
            .validate(&json!({"server": {"port": 70000}}), &plugin.schema().unwrap())
            .unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path.to_string(), "server.port");
    }
}
