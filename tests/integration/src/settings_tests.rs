//! Toolkit behaviour driven by `.confkit/settings.toml`

use std::fs;

use confkit_core::source::{ArgsSource, EnvSource, FileSource, StaticSource};
use confkit_core::{ConfigSource, Settings, SourceKind, Toolkit};
use confkit_plugins::builtin;
use confkit_schema::ConfigPath;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn project_with_settings(settings: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".confkit")).unwrap();
    fs::write(temp.path().join(".confkit/settings.toml"), settings).unwrap();
    temp
}

#[tokio::test]
async fn test_custom_precedence_puts_env_above_args() {
    let temp = project_with_settings(r#"precedence = ["env", "args", "file", "plugin", "defaults"]"#);
    let settings = Settings::load(temp.path()).unwrap();
    let toolkit = Toolkit::from_settings(&settings).unwrap();

    let sources: Vec<Box<dyn ConfigSource>> = vec![
        Box::new(ArgsSource::parse(["mode=args"]).unwrap()),
        Box::new(EnvSource::with_prefix(settings.env_prefix.clone()).with_vars([("CONFKIT_MODE", "env")])),
    ];
    let resolved = toolkit.resolve(sources).await.unwrap();

    let mode = ConfigPath::parse("mode").unwrap();
    assert_eq!(resolved.get(&mode), Some(&json!("env")));
    assert_eq!(resolved.source_of(&mode), Some(SourceKind::Env));
}

#[tokio::test]
async fn test_union_strategy_merges_labels_across_layers() {
    let temp = project_with_settings(
        r#"
[array_strategies]
"renovate.labels" = "union"
"#,
    );
    fs::write(
        temp.path().join("confkit.config.json"),
        r#"{"renovate": {"labels": ["dependencies", "bot"]}}"#,
    )
    .unwrap();

    let settings = Settings::load(temp.path()).unwrap();
    let mut toolkit = Toolkit::from_settings(&settings).unwrap();
    toolkit.install(builtin("renovate").unwrap()).await.unwrap();

    let sources: Vec<Box<dyn ConfigSource>> = FileSource::discover(temp.path())
        .into_iter()
        .map(|f| Box::new(f) as Box<dyn ConfigSource>)
        .collect();
    let resolved = toolkit.resolve(sources).await.unwrap();

    assert_eq!(
        resolved.section("renovate").unwrap()["labels"],
        json!(["dependencies", "bot"])
    );
}

#[tokio::test]
async fn test_disabled_coercion_rejects_env_strings() {
    let temp = project_with_settings("coerce = false\n");
    let settings = Settings::load(temp.path()).unwrap();
    let mut toolkit = Toolkit::from_settings(&settings).unwrap();
    toolkit.install(builtin("prettier").unwrap()).await.unwrap();

    let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(
        EnvSource::new().with_vars([("CONFKIT_PRETTIER__SEMI", "false")]),
    )];
    let err = toolkit.resolve(sources).await.unwrap_err();
    assert!(matches!(err, confkit_core::Error::Validation { .. }));
}

#[tokio::test]
async fn test_coercion_turns_env_strings_into_numbers() {
    let temp = TempDir::new().unwrap();
    let settings = Settings::load(temp.path()).unwrap();
    let mut toolkit = Toolkit::from_settings(&settings).unwrap();
    toolkit.install(builtin("vite").unwrap()).await.unwrap();

    let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(
        EnvSource::new().with_vars([("CONFKIT_VITE__SERVER__PORT", "8080")]),
    )];
    let resolved = toolkit.resolve(sources).await.unwrap();

    assert_eq!(resolved.section("vite").unwrap()["server"]["port"], json!(8080));
}

#[tokio::test]
async fn test_cache_capacity_bounds_compiled_validators() {
    let temp = project_with_settings("cache_capacity = 1\n");
    let settings = Settings::load(temp.path()).unwrap();
    let mut toolkit = Toolkit::from_settings(&settings).unwrap();

    let base: Vec<Box<dyn ConfigSource>> = Vec::new();
    toolkit.resolve(base).await.unwrap();
    toolkit.install(builtin("vite").unwrap()).await.unwrap();
    let defaults: Vec<Box<dyn ConfigSource>> = vec![Box::new(StaticSource::defaults(
        "extra",
        json!({"x": 1}).as_object().cloned().unwrap(),
    ))];
    toolkit.resolve(defaults).await.unwrap();

    let cache = toolkit.validator().cache();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().evictions, 1);
}
