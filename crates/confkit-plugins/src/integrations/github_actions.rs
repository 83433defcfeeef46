//! GitHub Actions CI integration, writes `.github/workflows/ci.yml`

use std::sync::Arc;

use async_trait::async_trait;
use confkit_core::{ConfigFragment, GeneratedFile, Plugin, ResolvedConfig, Result};
use confkit_schema::Schema;
use serde_json::{Value, json};

use super::{INTEGRATION_VERSION, fragment, section, string_list};

pub(super) const NAME: &str = "github-actions";

pub const WORKFLOW_PATH: &str = ".github/workflows/ci.yml";

const YAML_BANNER: &str = "# Generated by confkit. Do not edit.";

pub(super) fn create() -> Arc<dyn Plugin> {
    Arc::new(GithubActionsPlugin)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GithubActionsPlugin;

impl GithubActionsPlugin {
    fn install_command(manager: &str) -> &'static str {
        match manager {
            "pnpm" => "pnpm install --frozen-lockfile",
            "yarn" => "yarn install --frozen-lockfile",
            _ => "npm ci",
        }
    }

    fn steps(options: &ConfigFragment) -> Vec<Value> {
        let manager = options
            .get("packageManager")
            .and_then(Value::as_str)
            .unwrap_or("npm");

        let mut steps = vec![json!({"uses": "actions/checkout@v4"})];
        if manager == "pnpm" {
            steps.push(json!({"uses": "pnpm/action-setup@v4"}));
        }
        steps.push(json!({
            "uses": "actions/setup-node@v4",
            "with": {
                "node-version": "${{ matrix.node-version }}",
                "cache": manager
            }
        }));
        steps.push(json!({"run": Self::install_command(manager)}));
        for script in string_list(options, "scripts") {
            steps.push(json!({"run": format!("{} run {}", manager, script)}));
        }
        steps
    }

    /// The workflow document for `options`.
    pub fn workflow(options: &ConfigFragment) -> Value {
        let branches = string_list(options, "branches");
        let name = options.get("name").and_then(Value::as_str).unwrap_or("CI");
        json!({
            "name": name,
            "on": {
                "push": {"branches": branches},
                "pull_request": {"branches": branches}
            },
            "jobs": {
                "build": {
                    "runs-on": options.get("runsOn").and_then(Value::as_str).unwrap_or("ubuntu-latest"),
                    "strategy": {
                        "matrix": {"node-version": string_list(options, "node")}
                    },
                    "steps": Self::steps(options)
                }
            }
        })
    }
}

#[async_trait]
impl Plugin for GithubActionsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        INTEGRATION_VERSION
    }

    fn description(&self) -> Option<&str> {
        Some("GitHub Actions continuous integration workflow")
    }

    fn schema(&self) -> Option<Schema> {
        let names = Schema {
            min_length: Some(1),
            ..Schema::string()
        };
        Some(
            Schema::object()
                .property("name", Schema::string())
                .property("runsOn", Schema::string())
                .property("branches", Schema::array(names.clone()))
                .property(
                    "node",
                    Schema::array(Schema {
                        pattern: Some(r"\d+(\.\d+){0,2}|lts/\*".to_string()),
                        ..Schema::string()
                    }),
                )
                .property(
                    "packageManager",
                    Schema::enumeration([json!("npm"), json!("pnpm"), json!("yarn")]),
                )
                .property("scripts", Schema::array(names))
                .deny_additional(),
        )
    }

    fn defaults(&self) -> Option<ConfigFragment> {
        Some(fragment(json!({
            "name": "CI",
            "runsOn": "ubuntu-latest",
            "branches": ["main"],
            "node": ["20"],
            "packageManager": "npm",
            "scripts": ["lint", "test", "build"]
        })))
    }

    fn generate(&self, config: &ResolvedConfig) -> Result<Vec<GeneratedFile>> {
        let options = section(config, NAME)?;
        let body = serde_yaml::to_string(&Self::workflow(options))?;
        Ok(vec![GeneratedFile::new(
            WORKFLOW_PATH,
            format!("{}\n{}", YAML_BANNER, body),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confkit_core::Provenance;
    use pretty_assertions::assert_eq;

    fn generated(options: Value) -> Value {
        let config = ResolvedConfig::new(fragment(json!({ NAME: options })), Provenance::new());
        let files = GithubActionsPlugin.generate(&config).unwrap();
        assert_eq!(files[0].path.to_str(), Some(WORKFLOW_PATH));
        assert!(files[0].contents.starts_with(YAML_BANNER));
        serde_yaml::from_str(&files[0].contents).unwrap()
    }

    #[test]
    fn test_workflow_from_defaults() {
        let defaults = Value::Object(GithubActionsPlugin.defaults().unwrap());
        let workflow = generated(defaults);

        assert_eq!(workflow["name"], json!("CI"));
        assert_eq!(workflow["on"]["push"]["branches"], json!(["main"]));
        assert_eq!(
            workflow["jobs"]["build"]["strategy"]["matrix"]["node-version"],
            json!(["20"])
        );
        let runs: Vec<&str> = workflow["jobs"]["build"]["steps"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["run"].as_str())
            .collect();
        assert_eq!(
            runs,
            vec!["npm ci", "npm run lint", "npm run test", "npm run build"]
        );
    }

    #[test]
    fn test_pnpm_adds_setup_action() {
        let workflow = generated(json!({"packageManager": "pnpm", "scripts": ["test"]}));
        let uses: Vec<&str> = workflow["jobs"]["build"]["steps"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["uses"].as_str())
            .collect();
        assert_eq!(
            uses,
            vec![
                "actions/checkout@v4",
                "pnpm/action-setup@v4",
                "actions/setup-node@v4"
            ]
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = confkit_schema::SchemaValidator::default()
            .validate(
                &json!({"nightly": true}),
                &GithubActionsPlugin.schema().unwrap(),
            )
            .unwrap();
        assert!(!result.success);
    }
}
