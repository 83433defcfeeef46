//! Public validation entry point
//!
//! [`SchemaValidator`] obtains compiled validators from a shared
//! [`ValidatorCache`] and reports failures as an ordered list of
//! `{path, message}` pairs. Errors appear depth-first in schema declaration
//! order; unknown keys follow the declared properties of their mapping.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ValidatorCache;
use crate::error::Result;
use crate::path::ConfigPath;
use crate::schema::Schema;

/// Knobs for a validation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Parse string inputs for number, integer, boolean and non-string enum
    /// schemas before failing them
    pub coerce: bool,
    /// Fill missing optional properties from their schema `default`
    pub apply_defaults: bool,
}

impl ValidateOptions {
    /// Options with coercion enabled.
    pub fn coercing() -> Self {
        Self {
            coerce: true,
            ..Self::default()
        }
    }

    pub fn with_defaults(mut self) -> Self {
        self.apply_defaults = true;
        self
    }
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Breadcrumb from the root to the failing node
    pub path: ConfigPath,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Outcome of validating one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty
    pub success: bool,
    pub errors: Vec<ValidationError>,
    /// The validated value with coercions and defaults applied; `None` on
    /// failure
    pub data: Option<Value>,
}

impl ValidationResult {
    pub fn valid(data: Value) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            data: None,
        }
    }

    /// The validated data, or the errors.
    pub fn into_result(self) -> std::result::Result<Value, Vec<ValidationError>> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(self.errors),
        }
    }
}

/// Validates data against schemas, reusing compiled validators.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    cache: Arc<ValidatorCache>,
    options: ValidateOptions,
}

impl SchemaValidator {
    /// Create a validator backed by `cache`.
    pub fn new(cache: Arc<ValidatorCache>) -> Self {
        Self {
            cache,
            options: ValidateOptions::default(),
        }
    }

    /// Set the options used by [`SchemaValidator::validate`].
    pub fn with_options(mut self, options: ValidateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ValidatorCache> {
        &self.cache
    }

    /// Validate `data` against `schema` with this validator's options.
    ///
    /// Failing data is reported in the returned result, never as `Err`.
    /// `Err` means the schema itself is malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use confkit_schema::{Schema, SchemaValidator};
    /// use serde_json::json;
    ///
    /// let validator = SchemaValidator::default();
    /// let schema = Schema::object()
    ///     .property("x", Schema::string())
    ///     .property("y", Schema::number())
    ///     .require(["x", "y"]);
    ///
    /// let result = validator.validate(&json!({}), &schema).unwrap();
    /// assert!(!result.success);
    /// assert_eq!(result.errors.len(), 2);
    /// ```
    pub fn validate(&self, data: &Value, schema: &Schema) -> Result<ValidationResult> {
        self.validate_with(data, schema, &self.options)
    }

    /// Validate with explicit options.
    pub fn validate_with(
        &self,
        data: &Value,
        schema: &Schema,
        options: &ValidateOptions,
    ) -> Result<ValidationResult> {
        let compiled = self.cache.get_or_create(schema)?;
        let result = compiled.validate(data, options);
        tracing::trace!(
            success = result.success,
            errors = result.errors.len(),
            "Validated data against schema"
        );
        Ok(result)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(Arc::new(ValidatorCache::new()))
    }
}
