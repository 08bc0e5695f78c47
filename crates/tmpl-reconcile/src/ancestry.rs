//! External lookups for one run: ancestor search, existence checks, budget
//!
//! Every parent listing and existence check goes through [`Lookups`], which
//! memoizes answers, enforces the per-run call budget, and turns failures
//! into "no match" so a single bad lookup never aborts a run.

use crate::cache::{CacheStats, LookupCache};
use crate::config::ReconcileConfig;
use crate::error::LookupError;
use crate::external::{category_name, normalize_title, CategoryGraph, PageDirectory};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Depth-bounded ancestor test
///
/// A category matches when it is `root` or reaches `root` within `max_depth`
/// parent steps. Intermediate ancestors are only traversed when their name
/// contains the `through` pattern (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorQuery {
    root: String,
    through: Option<String>,
    max_depth: usize,
}

impl AncestorQuery {
    /// Search for ancestors named `root` (namespace prefix optional), at most `max_depth` levels up
    #[must_use]
    pub fn new(root: impl AsRef<str>, max_depth: usize) -> Self {
        Self {
            root: normalize_title(&category_name(root.as_ref())),
            through: None,
            max_depth,
        }
    }

    /// Only traverse intermediate ancestors containing `pattern`
    #[must_use]
    pub fn through(mut self, pattern: impl AsRef<str>) -> Self {
        self.through = Some(pattern.as_ref().to_lowercase());
        self
    }

    /// Normalized root category name
    #[inline]
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Levels searched above the starting category
    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn is_root(&self, category: &str) -> bool {
        normalize_title(category) == self.root
    }

    fn may_traverse(&self, category: &str) -> bool {
        self.through
            .as_deref()
            .map_or(true, |pattern| category.to_lowercase().contains(pattern))
    }
}

/// Memoized, budgeted access to the category graph and page directory
pub struct Lookups {
    graph: Arc<dyn CategoryGraph>,
    pages: Arc<dyn PageDirectory>,
    cache: LookupCache,
    budget: usize,
    calls: AtomicUsize,
    exhausted: AtomicBool,
}

impl std::fmt::Debug for Lookups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookups")
            .field("budget", &self.budget)
            .field("calls", &self.calls())
            .field("exhausted", &self.budget_exhausted())
            .finish_non_exhaustive()
    }
}

impl Lookups {
    /// Fresh lookup state for one run
    #[must_use]
    pub fn new(
        graph: Arc<dyn CategoryGraph>,
        pages: Arc<dyn PageDirectory>,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            graph,
            pages,
            cache: LookupCache::new(config.lookup_cache_capacity),
            budget: config.max_external_calls,
            calls: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// External calls made so far
    #[inline]
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Check if any lookup was refused for lack of budget
    #[inline]
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    /// Hit and miss counts of the lookup memo
    #[inline]
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn spend(&self) -> Result<(), LookupError> {
        let granted = self
            .calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < self.budget).then_some(n + 1))
            .is_ok();
        if granted {
            return Ok(());
        }
        if !self.exhausted.swap(true, Ordering::SeqCst) {
            tracing::warn!(budget = self.budget, "External call budget exhausted");
        }
        Err(LookupError::BudgetExhausted { budget: self.budget })
    }

    /// Parent categories, or `None` if the lookup failed or was refused
    pub async fn parents(&self, category: &str) -> Option<Arc<Vec<String>>> {
        let name = category_name(category);
        let key = name.as_str();
        let result = self
            .cache
            .parents_with(key, move || async move {
                self.spend()?;
                tracing::debug!(category = key, "Fetching parent categories");
                self.graph.parent_categories(key).await
            })
            .await;
        match result {
            Ok(parents) => Some(parents),
            Err(err) => {
                degrade(&name, &err);
                None
            }
        }
    }

    /// Page existence; failures and refusals count as "does not exist"
    pub async fn exists(&self, title: &str) -> bool {
        let title = normalize_title(title);
        let key = title.as_str();
        let result = self
            .cache
            .exists_with(key, move || async move {
                self.spend()?;
                tracing::debug!(title = key, "Checking page existence");
                self.pages.exists(key).await
            })
            .await;
        result.unwrap_or_else(|err| {
            degrade(&title, &err);
            false
        })
    }

    /// Check if `category` reaches the query root within its depth bound
    ///
    /// Breadth-first over parent listings. The intermediate filter is applied
    /// when a parent is enqueued, so filtered branches cost no lookups.
    pub async fn is_descendant_of(&self, category: &str, query: &AncestorQuery) -> bool {
        let start = category_name(category);
        if query.is_root(&start) {
            return true;
        }

        let mut seen = HashSet::from([normalize_title(&start)]);
        let mut frontier = VecDeque::from([(start, query.max_depth)]);

        while let Some((current, remaining)) = frontier.pop_front() {
            if remaining == 0 {
                continue;
            }
            let Some(parents) = self.parents(&current).await else {
                continue;
            };
            for parent in parents.iter() {
                if query.is_root(parent) {
                    tracing::debug!(category, root = query.root(), via = %current, "Ancestor found");
                    return true;
                }
                if remaining > 1 && query.may_traverse(parent) && seen.insert(normalize_title(parent)) {
                    frontier.push_back((parent.clone(), remaining - 1));
                }
            }
        }
        false
    }
}

fn degrade(subject: &str, err: &LookupError) {
    match err {
        LookupError::BudgetExhausted { .. } => {
            tracing::debug!(subject, "Lookup skipped, budget exhausted");
        }
        other => tracing::warn!(subject, error = %other, "Lookup failed, treating as no match"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{StaticCategoryGraph, StaticPageDirectory};
    use async_trait::async_trait;

    fn graph() -> StaticCategoryGraph {
        StaticCategoryGraph::new()
            .with_parents("Elsevier academic journals", ["Academic journals by publisher", "Elsevier"])
            .with_parents("Cell Press academic journals", ["Elsevier academic journals"])
            .with_parents("Elsevier", ["Publishing companies"])
            .with_parents("Publishing companies", ["Academic journals by publisher"])
            .with_parents("Deep 1 journals", ["Deep 2 journals"])
            .with_parents("Deep 2 journals", ["Deep 3 journals"])
            .with_parents("Deep 3 journals", ["Academic journals by publisher"])
    }

    fn lookups(graph: StaticCategoryGraph, budget: usize) -> Lookups {
        Lookups::new(
            Arc::new(graph),
            Arc::new(StaticPageDirectory::new().with_pages(["Chemistry"])),
            &ReconcileConfig::default().with_max_external_calls(budget),
        )
    }

    #[tokio::test]
    async fn finds_direct_and_indirect_ancestors() {
        let lookups = lookups(graph(), 100);
        let query = AncestorQuery::new("Academic journals by publisher", 9).through("journal");
        assert!(lookups.is_descendant_of("Elsevier academic journals", &query).await);
        assert!(lookups.is_descendant_of("Category:Cell Press academic journals", &query).await);
        assert!(lookups.is_descendant_of("Academic journals by publisher", &query).await);
        assert!(!lookups.is_descendant_of("Unrelated", &query).await);
    }

    #[tokio::test]
    async fn respects_depth_bound() {
        let lookups = lookups(graph(), 100);
        let root = "Academic journals by publisher";
        assert!(lookups.is_descendant_of("Deep 1 journals", &AncestorQuery::new(root, 3)).await);
        assert!(!lookups.is_descendant_of("Deep 1 journals", &AncestorQuery::new(root, 2)).await);
    }

    #[tokio::test]
    async fn filter_prunes_intermediate_ancestors() {
        // Publishing companies does not mention "journal", so the only other
        // path from Elsevier is cut; direct parents are still checked.
        let graph = StaticCategoryGraph::new()
            .with_parents("X academic journals", ["Elsevier"])
            .with_parents("Elsevier", ["Academic journals by publisher"]);
        let lookups = lookups(graph, 100);
        let root = "Academic journals by publisher";

        assert!(!lookups
            .is_descendant_of("X academic journals", &AncestorQuery::new(root, 9).through("journal"))
            .await);
        assert!(lookups
            .is_descendant_of("X academic journals", &AncestorQuery::new(root, 9))
            .await);
    }

    #[tokio::test]
    async fn repeated_searches_are_memoized() {
        let lookups = lookups(graph(), 100);
        let query = AncestorQuery::new("Academic journals by publisher", 9);
        assert!(lookups.is_descendant_of("Cell Press academic journals", &query).await);
        let after_first = lookups.calls();
        assert!(lookups.is_descendant_of("Cell Press academic journals", &query).await);
        assert_eq!(lookups.calls(), after_first);
    }

    #[tokio::test]
    async fn exhausted_budget_degrades_to_no_match() {
        let lookups = lookups(graph(), 1);
        let query = AncestorQuery::new("Academic journals by publisher", 9);
        assert!(!lookups.is_descendant_of("Cell Press academic journals", &query).await);
        assert!(lookups.budget_exhausted());
        assert_eq!(lookups.calls(), 1);
        assert!(!lookups.exists("Chemistry").await);
    }

    struct BrokenGraph;

    #[async_trait]
    impl CategoryGraph for BrokenGraph {
        async fn parent_categories(&self, category: &str) -> Result<Vec<String>, LookupError> {
            Err(LookupError::unavailable(category, "connection reset"))
        }
    }

    #[tokio::test]
    async fn failures_degrade_to_no_match() {
        let lookups = Lookups::new(
            Arc::new(BrokenGraph),
            Arc::new(StaticPageDirectory::new()),
            &ReconcileConfig::default(),
        );
        let query = AncestorQuery::new("Open access journals", 1);
        assert!(!lookups.is_descendant_of("Some journals", &query).await);
        assert!(!lookups.budget_exhausted());
    }

    #[tokio::test]
    async fn existence_is_checked_and_memoized() {
        let lookups = lookups(graph(), 100);
        assert!(lookups.exists("chemistry").await);
        assert!(lookups.exists("Chemistry").await);
        assert!(!lookups.exists("Alchemy").await);
        assert_eq!(lookups.calls(), 2);
    }
}
