//! Command implementations

mod generate;
mod get;
mod plugins;
mod resolve;
mod schema;
mod set;
mod validate;

pub use generate::run_generate;
pub use get::run_get;
pub use plugins::run_plugins;
pub use resolve::run_resolve;
pub use schema::run_schema;
pub use set::run_set;
pub use validate::run_validate;

use serde_json::Value;

/// Strings print bare, everything else as pretty JSON.
fn display_value(value: &Value, json: bool) -> crate::error::Result<String> {
    match value {
        Value::String(text) if !json => Ok(text.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}
