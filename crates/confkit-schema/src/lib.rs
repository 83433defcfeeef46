//! Schema-driven validation for confkit.
//!
//! This crate turns JSON-Schema-like documents into executable validators
//! and runs configuration data through them:
//!
//! - **Schema model**: [`Schema`] with parsing from and serialization to schema documents
//! - **Conversion**: [`TypeConverter`] compiles a schema into a [`CompiledValidator`]
//! - **Caching**: [`ValidatorCache`] memoizes validators by structural schema identity
//! - **Validation**: [`SchemaValidator`] reports every failure with its [`ConfigPath`]
//!
//! # Architecture
//!
//! ```text
//!   SchemaValidator
//!         |
//!   ValidatorCache ---- canonical key (sha256)
//!         |
//!   SchemaConverter (TypeConverter)
//!         |
//!   CompiledValidator
//! ```
//!
//! # Example
//!
//! ```
//! use confkit_schema::{Schema, SchemaValidator, ValidateOptions};
//! use serde_json::json;
//!
//! let validator = SchemaValidator::default().with_options(ValidateOptions::coercing());
//! let schema = Schema::from_value(&json!({"type": "number"})).unwrap();
//!
//! let result = validator.validate(&json!("42"), &schema).unwrap();
//! assert!(result.success);
//! assert_eq!(result.data, Some(json!(42)));
//! ```

pub mod cache;
pub mod compiled;
pub mod convert;
pub mod error;
pub mod path;
pub mod schema;
pub mod validator;
pub mod value;

pub use cache::{CacheStats, ValidatorCache};
pub use compiled::{CompiledValidator, MULTIPLE_OF_TOLERANCE};
pub use convert::{SchemaConverter, SchemaWarning, TypeConverter, WarningSink, convert};
pub use error::{Error, Result};
pub use path::{ConfigPath, PathSegment};
pub use schema::{AdditionalProperties, Schema, SchemaKind};
pub use validator::{SchemaValidator, ValidateOptions, ValidationError, ValidationResult};
