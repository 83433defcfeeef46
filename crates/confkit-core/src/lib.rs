//! Configuration resolution and plugin orchestration for confkit
//!
//! This crate sits on top of `confkit-schema` and provides:
//!
//! - **Merging**: deep merge of fragments with per-path array strategies
//! - **Sources**: command-line, environment, file, plugin and built-in layers
//! - **Resolution**: precedence-ordered loading, validation and leaf provenance
//! - **Plugins**: registry, named hooks and the setup context
//! - **Output**: JSON, YAML, TypeScript and JavaScript rendering
//!
//! # Architecture
//!
//! ```text
//!                 Toolkit
//!                    |
//!     +--------------+--------------+
//!     |              |              |
//! PluginRegistry ConfigResolver  output
//!                    |
//!          +---------+---------+
//!          |                   |
//!     ConfigMerger      SchemaValidator (confkit-schema)
//! ```
//!
//! # Example
//!
//! ```
//! use confkit_core::source::{ConfigSource, SourceKind, StaticSource};
//! use confkit_core::ConfigResolver;
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let sources: Vec<Box<dyn ConfigSource>> = vec![
//!     Box::new(StaticSource::from_value(SourceKind::Defaults, "defaults", json!({"output": {"format": "json"}})).unwrap()),
//!     Box::new(StaticSource::from_value(SourceKind::File, "project", json!({"output": {"path": "x.json"}})).unwrap()),
//! ];
//!
//! let resolved = ConfigResolver::new().resolve(&sources).await.unwrap();
//! assert_eq!(resolved.to_value(), json!({"output": {"format": "json", "path": "x.json"}}));
//! # });
//! ```

pub mod error;
pub mod logging;
pub mod merge;
pub mod output;
pub mod plugin;
pub mod resolver;
pub mod settings;
pub mod source;
pub mod toolkit;
pub mod transform;

pub use error::{Error, Result};
pub use merge::{ArrayStrategy, ConfigFragment, ConfigMerger, merge};
pub use output::{OutputFormat, diff_output, render};
pub use plugin::{GeneratedFile, Hook, HookContext, Plugin, PluginContext, PluginRegistry, hook};
pub use resolver::{ConfigResolver, Provenance, ResolvedConfig};
pub use settings::Settings;
pub use source::{ConfigSource, Precedence, SourceKind};
pub use toolkit::Toolkit;
pub use transform::Transformer;
