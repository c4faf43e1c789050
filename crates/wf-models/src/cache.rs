//! Cache for layout-dependent terms.
//!
//! Terms that depend only on turbine positions and sizes are computed once per
//! layout. An entry is keyed by the identity of the shared input tensors the
//! terms were derived from and holds those tensors, so their addresses cannot
//! be reused by another layout while the entry exists. Each source bundle gets
//! its own entry; the driver drops all of them with [`LayoutCache::invalidate`]
//! when the layout changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use tracing::trace;
use wf_core::Tensor;

use crate::error::ModelResult;

/// Entries kept before the cache starts over.
pub const MAX_LAYOUT_ENTRIES: usize = 1024;

/// Identity of the tensors a set of layout terms was derived from.
#[derive(Clone, Debug)]
pub struct LayoutKey {
    tensors: Vec<Arc<Tensor>>,
}

impl LayoutKey {
    pub fn new<'a>(tensors: impl IntoIterator<Item = &'a Arc<Tensor>>) -> Self {
        Self {
            tensors: tensors.into_iter().map(Arc::clone).collect(),
        }
    }

    fn addresses(&self) -> Vec<usize> {
        self.tensors
            .iter()
            .map(|t| Arc::as_ptr(t) as usize)
            .collect()
    }
}

#[derive(Debug)]
struct Entry {
    // keeps the source tensors alive so their addresses stay unique
    _key: LayoutKey,
    terms: Arc<Tensor>,
}

#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: RwLock<FxHashMap<Vec<usize>, Entry>>,
    hits: AtomicU64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &LayoutKey) -> Option<Arc<Tensor>> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&key.addresses())
            .map(|entry| Arc::clone(&entry.terms))
    }

    pub fn store(&self, key: LayoutKey, terms: Tensor) -> Arc<Tensor> {
        let terms = Arc::new(terms);
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= MAX_LAYOUT_ENTRIES {
                trace!(entries = entries.len(), "layout cache full, starting over");
                entries.clear();
            }
            entries.insert(
                key.addresses(),
                Entry {
                    _key: key,
                    terms: Arc::clone(&terms),
                },
            );
        }
        terms
    }

    pub fn get_or_compute(
        &self,
        key: LayoutKey,
        compute: impl FnOnce() -> ModelResult<Tensor>,
    ) -> ModelResult<Arc<Tensor>> {
        if let Some(terms) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("layout terms cache hit");
            return Ok(terms);
        }
        trace!("layout terms cache miss");
        Ok(self.store(key, compute()?))
    }

    pub fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Clone for LayoutCache {
    /// Derived state is not carried over to a copy of the model.
    fn clone(&self) -> Self {
        Self::default()
    }
}
