//! Configuration resolution with provenance
//!
//! The `ConfigResolver` loads every source in precedence order, merges the
//! fragments, runs transformers, validates against an optional schema and
//! records which source kind supplied each leaf value.

use std::collections::BTreeMap;

use confkit_schema::{ConfigPath, PathSegment, Schema, SchemaValidator};
use serde_json::Value;

use crate::merge::{ConfigFragment, ConfigMerger};
use crate::source::{ConfigSource, Precedence, SourceKind};
use crate::transform::{self, Transformer};
use crate::{Error, Result};

/// Leaf path → source kind that supplied the winning value
pub type Provenance = BTreeMap<ConfigPath, SourceKind>;

/// The final configuration after merging and validating all sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: ConfigFragment,
    provenance: Provenance,
}

impl ResolvedConfig {
    pub fn new(values: ConfigFragment, provenance: Provenance) -> Self {
        Self { values, provenance }
    }

    pub fn values(&self) -> &ConfigFragment {
        &self.values
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Look a value up by path.
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        path.get_in(&self.values)
    }

    /// A plugin's configuration section.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Source kind of the leaf at `path`, or of the closest leaf above it.
    pub fn source_of(&self, path: &ConfigPath) -> Option<SourceKind> {
        let mut current = path.clone();
        loop {
            if let Some(kind) = self.provenance.get(&current) {
                return Some(*kind);
            }
            current.pop()?;
        }
    }

    /// The resolved values as a single JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Provenance as `{"dotted.path": "kind"}`.
    pub fn provenance_value(&self) -> Value {
        Value::Object(
            self.provenance
                .iter()
                .map(|(path, kind)| (path.to_string(), Value::String(kind.to_string())))
                .collect(),
        )
    }
}

/// Resolves configuration by loading, merging and validating sources.
///
/// Sources are loaded one at a time in [`Precedence`] order. A required
/// source that fails aborts resolution before any lower-precedence source is
/// touched.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    precedence: Precedence,
    merger: ConfigMerger,
    validator: SchemaValidator,
    schema: Option<Schema>,
    transformers: Vec<Transformer>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_merger(mut self, merger: ConfigMerger) -> Self {
        self.merger = merger;
        self
    }

    /// Validate with `validator` (and its options and cache).
    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Validate the merged configuration against `schema`.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_transformers(mut self, transformers: Vec<Transformer>) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn precedence(&self) -> &Precedence {
        &self.precedence
    }

    /// Resolve `sources` into a validated configuration.
    pub async fn resolve(&self, sources: &[Box<dyn ConfigSource>]) -> Result<ResolvedConfig> {
        self.resolve_with(sources, |_| Ok(())).await
    }

    /// Resolve, letting `intercept` adjust the merged fragment before
    /// transformers and validation run.
    pub async fn resolve_with<F>(
        &self,
        sources: &[Box<dyn ConfigSource>],
        intercept: F,
    ) -> Result<ResolvedConfig>
    where
        F: FnOnce(&mut ConfigFragment) -> Result<()>,
    {
        let fragments = self.load(sources).await?;

        let layers: Vec<ConfigFragment> = fragments.iter().map(|(_, f)| f.clone()).collect();
        let mut merged = self.merger.merge(&layers);
        intercept(&mut merged)?;
        let merged = transform::apply_all(&self.transformers, merged)?;

        let values = match &self.schema {
            Some(schema) => self.validate(merged, schema)?,
            None => merged,
        };

        let provenance = track_provenance(&fragments, &values);
        Ok(ResolvedConfig::new(values, provenance))
    }

    /// Load every source in precedence order, highest first.
    pub async fn load(
        &self,
        sources: &[Box<dyn ConfigSource>],
    ) -> Result<Vec<(SourceKind, ConfigFragment)>> {
        let mut fragments = Vec::with_capacity(sources.len());

        for source in self.precedence.order(sources) {
            let kind = source.kind();
            match source.load().await {
                Ok(fragment) => {
                    tracing::debug!(
                        %kind,
                        source = source.name(),
                        keys = fragment.len(),
                        "Loaded configuration source"
                    );
                    fragments.push((kind, fragment));
                }
                Err(error) if !source.is_required() => {
                    tracing::warn!(
                        %kind,
                        source = source.name(),
                        %error,
                        "Optional configuration source failed to load, using an empty fragment"
                    );
                    fragments.push((kind, ConfigFragment::new()));
                }
                Err(error) => {
                    return Err(Error::SourceLoad {
                        kind,
                        name: source.name().to_string(),
                        source: Box::new(error),
                    });
                }
            }
        }

        Ok(fragments)
    }

    fn validate(&self, merged: ConfigFragment, schema: &Schema) -> Result<ConfigFragment> {
        let result = self.validator.validate(&Value::Object(merged), schema)?;
        match result.into_result() {
            Ok(Value::Object(values)) => Ok(values),
            Ok(other) => Err(Error::NotAMapping {
                name: "validated configuration".into(),
                found: confkit_schema::value::type_name(&other),
            }),
            Err(errors) => Err(Error::Validation { errors }),
        }
    }
}

/// Attribute each leaf of `values` to the highest-precedence fragment that
/// contains its path. Leaves are non-mapping values and empty mappings.
pub fn track_provenance(fragments: &[(SourceKind, ConfigFragment)], values: &ConfigFragment) -> Provenance {
    let mut provenance = Provenance::new();
    let mut path = ConfigPath::root();
    walk_leaves(values, &mut path, &mut |leaf| {
        if let Some((kind, _)) = fragments
            .iter()
            .find(|(_, fragment)| leaf.get_in(fragment).is_some())
        {
            provenance.insert(leaf.clone(), *kind);
        }
    });
    provenance
}

fn walk_leaves(map: &ConfigFragment, path: &mut ConfigPath, visit: &mut dyn FnMut(&ConfigPath)) {
    for (key, value) in map {
        path.push(PathSegment::Key(key.clone()));
        match value {
            Value::Object(child) if !child.is_empty() => walk_leaves(child, path, visit),
            _ => visit(path),
        }
        path.pop();
    }
}
