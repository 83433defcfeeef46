//! Named hooks contributed by plugins

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::merge::ConfigFragment;

/// Fired after sources are merged, before transformers and validation.
/// Changes to [`HookContext::config`] feed into the resolved result.
pub const RESOLVE_BEFORE: &str = "resolve:before";
/// Fired with a copy of the resolved values; changes are discarded.
pub const RESOLVE_AFTER: &str = "resolve:after";
/// Fired before plugins generate files.
pub const GENERATE_BEFORE: &str = "generate:before";
/// Fired after generation; the payload lists generated paths.
pub const GENERATE_AFTER: &str = "generate:after";

/// Names the toolkit itself fires
pub const WELL_KNOWN_HOOKS: &[&str] = &[RESOLVE_BEFORE, RESOLVE_AFTER, GENERATE_BEFORE, GENERATE_AFTER];

/// A hook callback.
///
/// Returning `Err` stops the remaining hooks registered under the same name.
pub type Hook = Arc<dyn Fn(&mut HookContext) -> Result<Value> + Send + Sync>;

/// Wrap a closure as a [`Hook`].
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(&mut HookContext) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Data handed to every hook invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookContext {
    /// Name the hook was invoked under
    pub hook: String,
    /// Configuration the hook may inspect or adjust
    pub config: ConfigFragment,
    /// Event-specific data
    pub payload: Value,
}

impl HookContext {
    pub fn new(hook: impl Into<String>, config: ConfigFragment) -> Self {
        Self {
            hook: hook.into(),
            config,
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A hook bound to the plugin that contributed it
#[derive(Clone)]
pub(crate) struct RegisteredHook {
    pub(crate) plugin: String,
    pub(crate) name: String,
    pub(crate) hook: Hook,
}

impl fmt::Debug for RegisteredHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHook")
            .field("plugin", &self.plugin)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
