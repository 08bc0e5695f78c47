//! External capabilities consumed by reconciliation
//!
//! Schema fetches, parent-category listings and page-existence checks are the
//! only suspension points of a run. Each is a trait so hosts can plug in a
//! live service; the `Static*` types answer from in-memory tables.

use crate::error::LookupError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tmpl_schema::Schema;

/// Source of template schemas
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the schema of `template`
    ///
    /// `Ok(None)` means the template has no schema data, which is not an error.
    async fn fetch_schema(&self, template: &str) -> Result<Option<Schema>, LookupError>;
}

/// Category membership graph
#[async_trait]
pub trait CategoryGraph: Send + Sync {
    /// Direct parent categories of `category` (names without namespace prefix)
    async fn parent_categories(&self, category: &str) -> Result<Vec<String>, LookupError>;
}

/// Page existence checks
#[async_trait]
pub trait PageDirectory: Send + Sync {
    async fn exists(&self, title: &str) -> Result<bool, LookupError>;
}

/// Strip a `Category:` prefix and normalize underscores and spacing
#[must_use]
pub fn category_name(raw: &str) -> String {
    let raw = raw.trim();
    let bare = match raw.split_once(':') {
        Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("category") => rest,
        _ => raw,
    };
    bare.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Schemas held in memory, keyed by template name
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    schemas: HashMap<String, Schema>,
}

impl StaticSchemaSource {
    /// Source with no schemas
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under its own title
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.insert(schema.title().to_string(), schema);
        self
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn fetch_schema(&self, template: &str) -> Result<Option<Schema>, LookupError> {
        Ok(self.schemas.get(template.trim()).cloned())
    }
}

/// Category graph held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCategoryGraph {
    parents: HashMap<String, Vec<String>>,
}

impl StaticCategoryGraph {
    /// Graph with no categories
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the parents of `category`
    #[must_use]
    pub fn with_parents<I, S>(mut self, category: &str, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(category, parents);
        self
    }

    /// Declare the parents of `category`, replacing any earlier declaration
    pub fn insert<I, S>(&mut self, category: &str, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.parents.insert(
            category_name(category),
            parents.into_iter().map(|p| category_name(p.as_ref())).collect(),
        );
    }
}

#[async_trait]
impl CategoryGraph for StaticCategoryGraph {
    async fn parent_categories(&self, category: &str) -> Result<Vec<String>, LookupError> {
        Ok(self
            .parents
            .get(&category_name(category))
            .cloned()
            .unwrap_or_default())
    }
}

/// Set of existing page titles held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticPageDirectory {
    pages: HashSet<String>,
}

impl StaticPageDirectory {
    /// Directory with no pages
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add existing page titles
    #[must_use]
    pub fn with_pages<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pages
            .extend(titles.into_iter().map(|t| normalize_title(t.as_ref())));
        self
    }
}

#[async_trait]
impl PageDirectory for StaticPageDirectory {
    async fn exists(&self, title: &str) -> Result<bool, LookupError> {
        Ok(self.pages.contains(&normalize_title(title)))
    }
}

/// Page title comparison form: spaces for underscores, first letter uppercase
pub(crate) fn normalize_title(title: &str) -> String {
    let spaced = title.trim().replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
