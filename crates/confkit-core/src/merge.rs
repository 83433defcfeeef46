//! Deep merge of configuration fragments
//!
//! Fragments are always supplied highest precedence first. Merging folds
//! from the lowest fragment upward, so a higher fragment overlays a lower
//! one:
//!
//! - mapping + mapping: merged key by key
//! - sequence + sequence: the higher sequence replaces the lower one, unless
//!   an [`ArrayStrategy`] is configured for that path
//! - anything else: the higher value wins outright
//!
//! Merging is associative but NOT commutative: swapping two fragments swaps
//! which one wins. `null` is a value like any other and overrides what lies
//! beneath it; only an absent key contributes nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use confkit_schema::{ConfigPath, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One source's contribution to configuration
pub type ConfigFragment = Map<String, Value>;

/// How two sequences at the same path combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayStrategy {
    /// Higher sequence replaces the lower one wholesale
    #[default]
    Replace,
    /// Lower elements followed by higher elements
    Append,
    /// Lower elements followed by higher elements not already present
    Union,
}

impl fmt::Display for ArrayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
            Self::Union => write!(f, "union"),
        }
    }
}

impl FromStr for ArrayStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "union" => Ok(Self::Union),
            other => Err(format!(
                "unknown array strategy '{}' (expected replace, append or union)",
                other
            )),
        }
    }
}

/// Merge `fragments` (highest precedence first) with the default strategy.
///
/// # Example
///
/// ```
/// use confkit_core::merge::merge;
/// use serde_json::json;
///
/// let args = json!({"c": [3], "b": {"y": 2}}).as_object().unwrap().clone();
/// let defaults = json!({"c": [1, 2], "b": {"x": 1}}).as_object().unwrap().clone();
///
/// let merged = merge(&[args, defaults]);
/// assert_eq!(serde_json::Value::Object(merged), json!({"c": [3], "b": {"x": 1, "y": 2}}));
/// ```
pub fn merge(fragments: &[ConfigFragment]) -> ConfigFragment {
    ConfigMerger::new().merge(fragments)
}

/// Deep merger with per-path array strategies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMerger {
    strategies: BTreeMap<ConfigPath, ArrayStrategy>,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine sequences at `path` with `strategy`.
    pub fn with_strategy(mut self, path: ConfigPath, strategy: ArrayStrategy) -> Self {
        self.strategies.insert(path, strategy);
        self
    }

    /// The strategy in force at `path`.
    pub fn strategy_for(&self, path: &ConfigPath) -> ArrayStrategy {
        self.strategies.get(path).copied().unwrap_or_default()
    }

    /// Merge `fragments`, given highest precedence first.
    pub fn merge(&self, fragments: &[ConfigFragment]) -> ConfigFragment {
        let mut result = ConfigFragment::new();
        for fragment in fragments.iter().rev() {
            self.overlay(&mut result, fragment);
        }
        result
    }

    /// Merge `overlay` on top of `base` in place.
    pub fn overlay(&self, base: &mut ConfigFragment, overlay: &ConfigFragment) {
        let mut path = ConfigPath::root();
        self.merge_map(base, overlay, &mut path);
    }

    fn merge_map(&self, base: &mut ConfigFragment, overlay: &ConfigFragment, path: &mut ConfigPath) {
        for (key, overlay_value) in overlay {
            path.push(PathSegment::Key(key.clone()));
            match base.get_mut(key) {
                Some(base_value) => self.merge_value(base_value, overlay_value, path),
                None => {
                    base.insert(key.clone(), overlay_value.clone());
                }
            }
            path.pop();
        }
    }

    fn merge_value(&self, base: &mut Value, overlay: &Value, path: &mut ConfigPath) {
        match (base, overlay) {
            (Value::Object(base_map), Value::Object(overlay_map)) => {
                self.merge_map(base_map, overlay_map, path);
            }
            (Value::Array(base_items), Value::Array(overlay_items)) => {
                match self.strategy_for(path) {
                    ArrayStrategy::Replace => *base_items = overlay_items.clone(),
                    ArrayStrategy::Append => base_items.extend(overlay_items.iter().cloned()),
                    ArrayStrategy::Union => {
                        for item in overlay_items {
                            if !base_items.contains(item) {
                                base_items.push(item.clone());
                            }
                        }
                    }
                }
            }
            (base, overlay) => {
                *base = overlay.clone();
            }
        }
    }
}
