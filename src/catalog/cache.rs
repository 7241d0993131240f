//! Memoized aggregate results.
//!
//! One singleton slot per aggregate; every slot is cleared in full by
//! [`invalidate_all`](StatsCache::invalidate_all), which the catalog
//! calls on every successful write. There is no partial invalidation.

use crate::graph::clique::CliqueCounts;
use crate::model::{AuthorCount, KeywordFrequency};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type YearlyKeywords = BTreeMap<u64, Vec<KeywordFrequency>>;

#[derive(Debug, Default)]
pub struct StatsCache {
    author_counts: Mutex<Option<Arc<Vec<AuthorCount>>>>,
    yearly_keywords: Mutex<Option<Arc<YearlyKeywords>>>,
    clique_counts: Mutex<Option<Arc<CliqueCounts>>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author_counts(&self, fill: impl FnOnce() -> Vec<AuthorCount>) -> Arc<Vec<AuthorCount>> {
        memoize(&self.author_counts, fill)
    }

    pub fn yearly_keywords(&self, fill: impl FnOnce() -> YearlyKeywords) -> Arc<YearlyKeywords> {
        memoize(&self.yearly_keywords, fill)
    }

    pub fn clique_counts(&self) -> Option<Arc<CliqueCounts>> {
        self.clique_counts.lock().clone()
    }

    pub fn store_clique_counts(&self, counts: Arc<CliqueCounts>) {
        *self.clique_counts.lock() = Some(counts);
    }

    /// Drops every memoized aggregate. Called after each acknowledged
    /// write; the next read of each aggregate recomputes it.
    pub fn invalidate_all(&self) {
        *self.author_counts.lock() = None;
        *self.yearly_keywords.lock() = None;
        *self.clique_counts.lock() = None;
    }
}

fn memoize<T>(slot: &Mutex<Option<Arc<T>>>, fill: impl FnOnce() -> T) -> Arc<T> {
    let mut guard = slot.lock();
    match &*guard {
        Some(cached) => Arc::clone(cached),
        None => {
            let value = Arc::new(fill());
            *guard = Some(Arc::clone(&value));
            value
        }
    }
}
