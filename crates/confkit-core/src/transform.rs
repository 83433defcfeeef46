//! Transformers applied to the merged configuration before validation

use std::fmt;
use std::sync::Arc;

use crate::merge::ConfigFragment;
use crate::{Error, Result};

type TransformFn = dyn Fn(ConfigFragment) -> Result<ConfigFragment> + Send + Sync;

/// A named rewrite of the merged configuration.
#[derive(Clone)]
pub struct Transformer {
    name: String,
    owner: Option<String>,
    transform: Arc<TransformFn>,
}

impl Transformer {
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(ConfigFragment) -> Result<ConfigFragment> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            owner: None,
            transform: Arc::new(transform),
        }
    }

    /// Record the plugin that registered this transformer.
    pub fn owned_by(mut self, plugin: impl Into<String>) -> Self {
        self.owner = Some(plugin.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Run the transformer, tagging any failure with its name.
    pub fn apply(&self, fragment: ConfigFragment) -> Result<ConfigFragment> {
        (self.transform)(fragment).map_err(|source| Error::Transform {
            name: self.name.clone(),
            source: Box::new(source),
        })
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Apply `transformers` in order.
pub fn apply_all(transformers: &[Transformer], mut fragment: ConfigFragment) -> Result<ConfigFragment> {
    for transformer in transformers {
        tracing::debug!(transformer = transformer.name(), "Applying transformer");
        fragment = transformer.apply(fragment)?;
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn transformers_run_in_order() {
        let transformers = vec![
            Transformer::new("set", |mut f: ConfigFragment| {
                f.insert("n".into(), json!(1));
                Ok(f)
            }),
            Transformer::new("double", |mut f: ConfigFragment| {
                let n = f.get("n").and_then(Value::as_i64).unwrap_or(0);
                f.insert("n".into(), json!(n * 2));
                Ok(f)
            }),
        ];

        let result = apply_all(&transformers, ConfigFragment::new()).unwrap();
        assert_eq!(result.get("n"), Some(&json!(2)));
    }

    #[test]
    fn failure_names_the_transformer() {
        let transformers = vec![Transformer::new("strict", |_| Err(Error::plugin("nope")))];
        let err = apply_all(&transformers, ConfigFragment::new()).unwrap_err();
        assert_eq!(err.to_string(), "Transformer 'strict' failed: nope");
    }
}
