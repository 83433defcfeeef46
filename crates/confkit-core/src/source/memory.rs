//! In-memory fragments

use async_trait::async_trait;
use serde_json::Value;

use super::{ConfigSource, SourceKind};
use crate::merge::ConfigFragment;
use crate::{Error, Result};

/// A fixed fragment, typically built-in defaults.
#[derive(Debug, Clone)]
pub struct StaticSource {
    kind: SourceKind,
    name: String,
    fragment: ConfigFragment,
    required: bool,
}

impl StaticSource {
    pub fn new(kind: SourceKind, name: impl Into<String>, fragment: ConfigFragment) -> Self {
        Self {
            kind,
            name: name.into(),
            fragment,
            required: false,
        }
    }

    /// A `defaults`-kind source.
    pub fn defaults(name: impl Into<String>, fragment: ConfigFragment) -> Self {
        Self::new(SourceKind::Defaults, name, fragment)
    }

    /// Build from any JSON value, which must be a mapping.
    pub fn from_value(kind: SourceKind, name: impl Into<String>, value: Value) -> Result<Self> {
        let name = name.into();
        match value {
            Value::Object(fragment) => Ok(Self::new(kind, name, fragment)),
            other => Err(Error::NotAMapping {
                name,
                found: confkit_schema::value::type_name(&other),
            }),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[async_trait]
impl ConfigSource for StaticSource {
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
        Ok(self.fragment.clone())
    }
}
