//! End-to-end flow: project files, environment and overrides resolved
//! through a toolkit with first-party and manifest plugins installed, then
//! rendered to generated files.

use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use confkit_core::plugin::RESOLVE_AFTER;
use confkit_core::source::{ArgsSource, EnvSource, FileSource};
use confkit_core::{
    ConfigSource, Hook, Plugin, PluginContext, ResolvedConfig, Result, Settings, SourceKind,
    Toolkit, hook,
};
use confkit_plugins::{PluginLoader, PluginSpec};
use confkit_schema::ConfigPath;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn setup_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("confkit.config.toml"),
        r#"
plugins = ["vite", "github-actions", "./plugins/docs.json"]

[vite.server]
port = 3000

[github-actions]
node = ["18", "20"]
"#,
    )
    .unwrap();
    fs::create_dir_all(temp.path().join("plugins")).unwrap();
    fs::write(
        temp.path().join("plugins/docs.json"),
        r#"{
  "name": "docs",
  "version": "1.2.0",
  "schema": {"type": "object", "properties": {"title": {"type": "string"}}},
  "defaults": {"title": "Handbook"},
  "output": {"path": "site/docs.yaml"}
}"#,
    )
    .unwrap();
    temp
}

async fn toolkit_for(temp: &TempDir, specs: &[&str]) -> Toolkit {
    let settings = Settings::load(temp.path()).unwrap();
    let mut toolkit = Toolkit::from_settings(&settings).unwrap();
    let loader = PluginLoader::new(temp.path());
    for spec in specs {
        let plugin = loader.load(&PluginSpec::parse(spec).unwrap()).await.unwrap();
        toolkit.install(plugin).await.unwrap();
    }
    toolkit
}

fn sources(temp: &TempDir, env: &[(&str, &str)], overrides: &[&str]) -> Vec<Box<dyn ConfigSource>> {
    let mut sources: Vec<Box<dyn ConfigSource>> = vec![
        Box::new(ArgsSource::parse(overrides).unwrap()),
        Box::new(EnvSource::new().with_vars(env.iter().copied())),
    ];
    for file in FileSource::discover(temp.path()) {
        sources.push(Box::new(file));
    }
    sources
}

#[tokio::test]
async fn test_project_resolves_through_all_layers() {
    let temp = setup_project();
    let toolkit = toolkit_for(&temp, &["vite", "github-actions", "./plugins/docs.json"]).await;

    let resolved = toolkit
        .resolve(sources(
            &temp,
            &[("CONFKIT_VITE__SERVER__OPEN", "true")],
            &["docs.title=\"Guide\""],
        ))
        .await
        .unwrap();

    assert_eq!(
        resolved.section("vite").unwrap()["server"],
        json!({"port": 3000, "host": "localhost", "open": true})
    );
    assert_eq!(resolved.section("docs"), Some(&json!({"title": "Guide"})));

    let source = |p: &str| resolved.source_of(&ConfigPath::parse(p).unwrap());
    assert_eq!(source("vite.server.port"), Some(SourceKind::File));
    assert_eq!(source("vite.server.open"), Some(SourceKind::Env));
    assert_eq!(source("vite.server.host"), Some(SourceKind::Plugin));
    assert_eq!(source("docs.title"), Some(SourceKind::Args));
}

#[tokio::test]
async fn test_generated_files_follow_resolution() {
    let temp = setup_project();
    let toolkit = toolkit_for(&temp, &["vite", "github-actions", "./plugins/docs.json"]).await;

    let resolved = toolkit.resolve(sources(&temp, &[], &[])).await.unwrap();
    let files = toolkit.generate(&resolved).unwrap();

    let paths: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();
    assert_eq!(
        paths,
        vec!["vite.config.ts", ".github/workflows/ci.yml", "site/docs.yaml"]
    );
    assert!(files[1].contents.contains("- '18'") || files[1].contents.contains("- \"18\""));
    assert_eq!(files[2].contents, "title: Handbook\n");
}

#[tokio::test]
async fn test_validation_spans_every_plugin() {
    let temp = setup_project();
    let toolkit = toolkit_for(&temp, &["vite", "github-actions", "./plugins/docs.json"]).await;

    let err = toolkit
        .resolve(sources(
            &temp,
            &[],
            &["vite.server.port=0", "github-actions.packageManager=bun", "docs.title=7"],
        ))
        .await
        .unwrap_err();

    let confkit_core::Error::Validation { errors } = err else {
        panic!("expected validation failure, got {}", err);
    };
    let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["vite.server.port", "github-actions.packageManager", "docs.title"]
    );
}

#[tokio::test]
async fn test_repeated_resolution_reuses_compiled_validator() {
    let temp = setup_project();
    let toolkit = toolkit_for(&temp, &["vite"]).await;

    toolkit.resolve(sources(&temp, &[], &[])).await.unwrap();
    toolkit.resolve(sources(&temp, &[], &[])).await.unwrap();

    let stats = toolkit.validator().cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

/// Records the provenance payload of every resolution it observes.
struct AuditPlugin {
    seen: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn hooks(&self) -> Vec<(String, Hook)> {
        let seen = Arc::clone(&self.seen);
        vec![(
            RESOLVE_AFTER.to_string(),
            hook(move |ctx| {
                seen.lock().unwrap().push(ctx.payload.clone());
                Ok(Value::Null)
            }),
        )]
    }

    async fn setup(&self, context: &mut PluginContext) -> Result<()> {
        context.set("audit.enabled", json!(true))?;
        context.logger().info("audit plugin ready");
        Ok(())
    }

    fn generate(&self, _config: &ResolvedConfig) -> Result<Vec<confkit_core::GeneratedFile>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_custom_plugin_alongside_builtins() {
    let temp = setup_project();
    let mut toolkit = toolkit_for(&temp, &["vite"]).await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    toolkit
        .install(Arc::new(AuditPlugin {
            seen: Arc::clone(&seen),
        }))
        .await
        .unwrap();

    let resolved = toolkit
        .resolve(sources(&temp, &[], &["vite.base=\"/app/\""]))
        .await
        .unwrap();

    assert_eq!(resolved.section("audit"), Some(&json!({"enabled": true})));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["vite.base"], json!("args"));
    assert_eq!(seen[0]["audit.enabled"], json!("defaults"));
}
