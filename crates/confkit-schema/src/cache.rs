//! Memoized validator compilation
//!
//! The cache is keyed by [`Schema::canonical_key`], so schemas rebuilt from
//! the same JSON on every load share one compiled validator. A changed schema
//! simply produces a new key; nothing is ever invalidated. An optional
//! capacity turns the cache into an LRU.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::compiled::CompiledValidator;
use crate::convert::{SchemaConverter, TypeConverter};
use crate::error::Result;
use crate::schema::Schema;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<CompiledValidator>>,
    /// Least recently used first
    recency: VecDeque<String>,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        if let Some(position) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(position);
        }
        self.recency.push_back(key.to_string());
    }
}

/// Process-wide store of compiled validators.
///
/// The check-or-create path runs under a single lock so concurrent callers
/// never convert the same schema twice.
pub struct ValidatorCache {
    converter: Arc<dyn SchemaConverter>,
    capacity: Option<NonZeroUsize>,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ValidatorCache {
    /// An unbounded cache using [`TypeConverter`].
    pub fn new() -> Self {
        Self::with_converter(Arc::new(TypeConverter::new()))
    }

    /// An unbounded cache using a custom converter.
    pub fn with_converter(converter: Arc<dyn SchemaConverter>) -> Self {
        Self {
            converter,
            capacity: None,
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Bound the cache, evicting the least recently used validator.
    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    /// Return the compiled validator for `schema`, converting it on a miss.
    pub fn get_or_create(&self, schema: &Schema) -> Result<Arc<CompiledValidator>> {
        let key = schema.canonical_key();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(compiled) = state.entries.get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if self.capacity.is_some() {
                state.touch(&key);
            }
            return Ok(compiled);
        }

        let compiled = Arc::new(self.converter.convert(schema)?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = &key[..12], "Compiled schema validator");

        state.entries.insert(key.clone(), Arc::clone(&compiled));
        state.touch(&key);

        if let Some(capacity) = self.capacity {
            while state.entries.len() > capacity.get() {
                let Some(oldest) = state.recency.pop_front() else {
                    break;
                };
                state.entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = &oldest[..12], "Evicted schema validator");
            }
        }

        Ok(compiled)
    }

    /// Whether a validator for `schema` is cached.
    pub fn contains(&self, schema: &Schema) -> bool {
        let key = schema.canonical_key();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(&key)
    }

    /// Number of cached validators.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
