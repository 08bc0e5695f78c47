//! Reconciliation configuration

use serde::{Deserialize, Serialize};
use tmpl_schema::KEY_COLUMN_WIDTH;

/// Canonical keys targeted by the inference rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldKeys {
    /// Journal title
    pub title: String,
    /// Publication language
    pub language: String,
    /// Publication frequency
    pub frequency: String,
    /// Publisher
    pub publisher: String,
    /// Subject area
    pub discipline: String,
    /// Publication history span
    pub history: String,
    /// Open access status
    pub open_access: String,
    /// Print ISSN
    pub issn: String,
    /// Electronic ISSN
    pub eissn: String,
    /// Home page URL
    pub website: String,
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            title: "title".into(),
            language: "language".into(),
            frequency: "frequency".into(),
            publisher: "publisher".into(),
            discipline: "discipline".into(),
            history: "history".into(),
            open_access: "openaccess".into(),
            issn: "ISSN".into(),
            eissn: "eISSN".into(),
            website: "website".into(),
        }
    }
}

/// Settings for one [`Reconciler`](crate::Reconciler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Names (and redirects) recognised as the record template
    pub template_names: Vec<String>,
    /// Name instances are renamed to on emission
    pub canonical_template_name: String,
    /// Instances per page before a page-level warning
    pub expected_instances: usize,
    /// Parent-category and page-existence lookups allowed per run
    pub max_external_calls: usize,
    /// Entries kept by the per-run lookup memo
    pub lookup_cache_capacity: u64,
    /// Ancestor search depth for publisher categories
    pub publisher_depth: usize,
    /// Ancestor search depth for subject-area categories
    pub discipline_depth: usize,
    /// Ancestor search depth for open access categories
    pub open_access_depth: usize,
    /// Scheme prefixed to website values without one
    pub default_url_scheme: String,
    /// Column width display keys are padded to
    pub key_column_width: usize,
    /// Canonical keys written by inference
    pub fields: FieldKeys,
}

impl ReconcileConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the recognised template names
    #[inline]
    #[must_use]
    pub fn with_template_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the name emitted instances are renamed to
    #[inline]
    #[must_use]
    pub fn with_canonical_template_name(mut self, name: impl Into<String>) -> Self {
        self.canonical_template_name = name.into();
        self
    }

    /// Set the instance count above which a page is flagged
    #[inline]
    #[must_use]
    pub fn with_expected_instances(mut self, expected: usize) -> Self {
        self.expected_instances = expected;
        self
    }

    /// Set the external lookup budget per run
    #[inline]
    #[must_use]
    pub fn with_max_external_calls(mut self, max: usize) -> Self {
        self.max_external_calls = max;
        self
    }

    /// Set the lookup memo capacity
    #[inline]
    #[must_use]
    pub fn with_lookup_cache_capacity(mut self, capacity: u64) -> Self {
        self.lookup_cache_capacity = capacity;
        self
    }

    /// Set the scheme added to bare website values
    #[inline]
    #[must_use]
    pub fn with_default_url_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_url_scheme = scheme.into();
        self
    }

    /// Set the key padding width
    #[inline]
    #[must_use]
    pub fn with_key_column_width(mut self, width: usize) -> Self {
        self.key_column_width = width;
        self
    }

    /// Replace the canonical target keys
    #[inline]
    #[must_use]
    pub fn with_fields(mut self, fields: FieldKeys) -> Self {
        self.fields = fields;
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            template_names: vec![
                "Infobox journal".into(),
                "Infobox Journal".into(),
                "Infobox magazine".into(),
            ],
            canonical_template_name: "Infobox journal".into(),
            expected_instances: 1,
            max_external_calls: 250,
            lookup_cache_capacity: 1024,
            publisher_depth: 9,
            discipline_depth: 9,
            open_access_depth: 1,
            default_url_scheme: "https://".into(),
            key_column_width: KEY_COLUMN_WIDTH,
            fields: FieldKeys::default(),
        }
    }
}
