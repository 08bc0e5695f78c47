//! Per-run lookup memo using moka
//!
//! Repeated parent-category and page-existence lookups within one run are
//! answered from memory. Concurrent requests for the same key share one
//! load. Failed loads are not cached.

use crate::error::LookupError;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Memoized parent listings
    pub parent_entries: u64,
    /// Memoized existence answers
    pub page_entries: u64,
}

/// Memo for external lookups of one run
#[derive(Debug, Clone)]
pub struct LookupCache {
    parents: Cache<String, Arc<Vec<String>>>,
    pages: Cache<String, bool>,
}

impl LookupCache {
    /// Create cache holding up to `max_capacity` entries per kind
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            parents: Cache::new(max_capacity),
            pages: Cache::new(max_capacity),
        }
    }

    /// Memoized parent categories, loading with `load` on a miss
    ///
    /// # Errors
    /// The load error, shared with every caller that awaited the same load
    pub async fn parents_with<F, Fut>(&self, category: &str, load: F) -> Result<Arc<Vec<String>>, Arc<LookupError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, LookupError>>,
    {
        self.parents
            .try_get_with(category.to_string(), async move { load().await.map(Arc::new) })
            .await
    }

    /// Memoized page existence, loading with `load` on a miss
    ///
    /// # Errors
    /// The load error, shared with every caller that awaited the same load
    pub async fn exists_with<F, Fut>(&self, title: &str, load: F) -> Result<bool, Arc<LookupError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, LookupError>>,
    {
        self.pages.try_get_with(title.to_string(), load()).await
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            parent_entries: self.parents.entry_count(),
            page_entries: self.pages.entry_count(),
        }
    }
}
