/*!
 * Module Cache
 * Canonical path to export value, with at-most-once execution
 */

use crate::core::{LoaderError, LoaderResult};
use crate::sandbox::Value;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

enum Slot {
    /// Producer is running; a second request for the path is a cycle
    Loading,
    Ready(Value),
}

/// Memoized export values keyed by canonical path
///
/// Entries are never evicted. No shard lock is held while a producer runs,
/// so producers may re-enter the cache for other paths.
pub struct ModuleCache {
    entries: DashMap<PathBuf, Slot, RandomState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the stored value for `path`, or run `producer` once and store its result
    ///
    /// A failed producer leaves no entry behind.
    pub fn get_or_create<F>(&self, path: &Path, producer: F) -> LoaderResult<Value>
    where
        F: FnOnce() -> LoaderResult<Value>,
    {
        match self.entries.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(path = %path.display(), "Module cache hit");
                    return Ok(value.clone());
                }
                Slot::Loading => {
                    error!(path = %path.display(), "Circular dependency detected");
                    return Err(LoaderError::CircularDependency {
                        path: path.to_path_buf(),
                    });
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::Loading);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match producer() {
            Ok(value) => {
                self.entries
                    .insert(path.to_path_buf(), Slot::Ready(value.clone()));
                Ok(value)
            }
            Err(err) => {
                self.entries.remove(path);
                Err(err)
            }
        }
    }

    /// Stored value, if the module finished executing
    pub fn get(&self, path: &Path) -> Option<Value> {
        self.entries.get(path).and_then(|slot| match slot.value() {
            Slot::Ready(value) => Some(value.clone()),
            Slot::Loading => None,
        })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn is_loading(&self, path: &Path) -> bool {
        self.entries
            .get(path)
            .map(|slot| matches!(slot.value(), Slot::Loading))
            .unwrap_or(false)
    }

    /// Paths of completed modules, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Ready(_)))
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let loading = self
            .entries
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Loading))
            .count();

        CacheStats {
            modules: self.entries.len().saturating_sub(loading),
            loading,
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub modules: usize,
    pub loading: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
