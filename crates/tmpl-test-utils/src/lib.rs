//! Testing utilities for the template reconciliation workspace
//!
//! Fixture schemas, category graphs and fakes of every external capability.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tmpl_reconcile::{
    CategoryGraph, LookupError, PageDirectory, ReconcileConfig, Reconciler, SchemaSource, StaticCategoryGraph,
    StaticPageDirectory, StaticSchemaSource,
};
use tmpl_schema::{Deprecation, ParameterDefinition, Schema};

/// Template name the journal fixtures use
pub const JOURNAL_TEMPLATE: &str = "Infobox journal";

/// TemplateData of a small journal infobox
pub const JOURNAL_TEMPLATEDATA: &str = r#"{
    "description": {"en": "Infobox for academic journals"},
    "format": "block",
    "params": {
        "title": {"label": "Title", "type": "string", "required": true, "aliases": ["name"]},
        "abbreviation": {"label": "ISO 4 abbreviation", "autovalue": "<!-- ISO 4 -->", "suggested": true},
        "editor": {"label": "Editor", "weaklySuggested": true},
        "discipline": {"label": "Discipline"},
        "language": {"label": "Language"},
        "publisher": {"label": "Publisher"},
        "country": {"label": "Country", "default": "Unknown"},
        "frequency": {"label": "Frequency", "suggested": true, "autovalue": "Quarterly"},
        "history": {"label": "Publication history"},
        "openaccess": {"label": "Open access", "aliases": ["open access"]},
        "website": {"label": "Website", "type": "url"},
        "image_file": {"label": "Cover", "deprecated": "Use cover instead"},
        "ISSN": {"label": "ISSN"},
        "eISSN": {"label": "eISSN"}
    },
    "paramOrder": ["title", "image_file", "abbreviation", "editor", "discipline", "language",
                   "publisher", "country", "frequency", "history", "openaccess", "website", "ISSN", "eISSN"]
}"#;

/// Journal infobox schema built from [`JOURNAL_TEMPLATEDATA`]
pub fn journal_schema() -> Schema {
    Schema::from_templatedata_json(JOURNAL_TEMPLATE, JOURNAL_TEMPLATEDATA).unwrap()
}

/// Schema with `title` required and `frequency` suggested (autovalue `Quarterly`)
pub fn minimal_schema() -> Schema {
    Schema::new(
        JOURNAL_TEMPLATE,
        [
            ParameterDefinition::new("title").required(),
            ParameterDefinition::new("frequency").suggested().with_autovalue("Quarterly"),
            ParameterDefinition::new("image_file").with_deprecation(Deprecation::Deprecated),
        ],
        ["title", "frequency"],
    )
    .unwrap()
}

/// Category graph reaching the publisher, subject-area and open access roots
pub fn journal_graph() -> StaticCategoryGraph {
    StaticCategoryGraph::new()
        .with_parents("Elsevier academic journals", ["Academic journals by publisher"])
        .with_parents("Cell Press academic journals", ["Elsevier academic journals"])
        .with_parents("Chemistry journals", ["Academic journals by subject area"])
        .with_parents("Organic chemistry journals", ["Chemistry journals"])
        .with_parents("Oceanography journals", ["Academic journals by subject area"])
        .with_parents("Creative Commons Attribution-licensed journals", ["Open access journals"])
        .with_parents("Open access chemistry journals", ["Open access journals", "Chemistry journals"])
}

/// Pages known to exist
pub fn journal_pages() -> StaticPageDirectory {
    StaticPageDirectory::new().with_pages(["Chemistry", "Elsevier", "Organic chemistry"])
}

/// Reconciler over the fixture graph and pages
pub fn reconciler(schema: Schema) -> Reconciler {
    reconciler_with(
        ReconcileConfig::default(),
        Arc::new(StaticSchemaSource::new().with_schema(schema)),
        Arc::new(journal_graph()),
        Arc::new(journal_pages()),
    )
}

/// Reconciler over the given configuration and collaborators
pub fn reconciler_with(
    config: ReconcileConfig,
    schemas: Arc<dyn SchemaSource>,
    graph: Arc<dyn CategoryGraph>,
    pages: Arc<dyn PageDirectory>,
) -> Reconciler {
    Reconciler::new(config, schemas, graph, pages)
}

/// Owned written pairs
pub fn written(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Schema source that is always unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSchemaSource;

#[async_trait]
impl SchemaSource for FailingSchemaSource {
    async fn fetch_schema(&self, template: &str) -> Result<Option<Schema>, LookupError> {
        Err(LookupError::unavailable(template, "connection refused"))
    }
}

/// Category graph that fails every lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCategoryGraph;

#[async_trait]
impl CategoryGraph for FailingCategoryGraph {
    async fn parent_categories(&self, category: &str) -> Result<Vec<String>, LookupError> {
        Err(LookupError::unavailable(category, "timeout"))
    }
}

/// Page directory that fails every lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPageDirectory;

#[async_trait]
impl PageDirectory for FailingPageDirectory {
    async fn exists(&self, title: &str) -> Result<bool, LookupError> {
        Err(LookupError::unavailable(title, "timeout"))
    }
}

/// Category graph recording every category it is asked about
#[derive(Debug, Default)]
pub struct CountingCategoryGraph {
    inner: StaticCategoryGraph,
    queried: Mutex<Vec<String>>,
}

impl CountingCategoryGraph {
    /// Wrap `inner`
    pub fn new(inner: StaticCategoryGraph) -> Self {
        Self {
            inner,
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Categories looked up so far, in call order
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().clone()
    }

    /// Number of lookups made
    pub fn calls(&self) -> usize {
        self.queried.lock().len()
    }
}

#[async_trait]
impl CategoryGraph for CountingCategoryGraph {
    async fn parent_categories(&self, category: &str) -> Result<Vec<String>, LookupError> {
        self.queried.lock().push(category.to_string());
        self.inner.parent_categories(category).await
    }
}
