//! Page-level driver
//!
//! [`Reconciler::reconcile_page`] runs a whole page through the pipeline:
//! fetch the schema, parse instances, reconcile and enrich each one, emit
//! canonical text and splice it back in place of the original instance.

use crate::ancestry::Lookups;
use crate::config::ReconcileConfig;
use crate::error::{LookupError, ReconcileResult};
use crate::external::{CategoryGraph, PageDirectory, SchemaSource};
use crate::heuristics::{InferenceEngine, PageSignals};
use crate::parsers::{names_match, TemplateInstance, TemplateParser, WikitextParser};
use crate::reconcile::reconcile;
use crate::summary::EditSummary;
use std::ops::Range;
use std::sync::Arc;
use tmpl_decision::{Diagnostic, HandoffSlot, Snapshot};
use tmpl_schema::Schema;
use unicode_normalization::UnicodeNormalization;

/// A page to reconcile
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Page title
    pub title: String,
    /// Page source text
    pub text: String,
    /// Page categories, without namespace prefix
    pub categories: Vec<String>,
}

impl PageContext {
    /// Page with no categories
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            categories: Vec::new(),
        }
    }

    /// Attach page categories
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of reconciling one page
#[derive(Debug, Clone)]
pub struct ReconciledPage {
    /// Page text with every instance replaced by its emitted form
    pub text: String,
    /// Decision records and page-level diagnostics
    pub snapshot: Snapshot,
    /// Fields added, changed and removed
    pub summary: EditSummary,
    /// Whether `text` differs from the (NFC-normalized) input
    pub changed: bool,
}

/// Reconciles pages against the record template's schema
pub struct Reconciler {
    config: ReconcileConfig,
    parser: Arc<dyn TemplateParser>,
    schemas: Arc<dyn SchemaSource>,
    graph: Arc<dyn CategoryGraph>,
    pages: Arc<dyn PageDirectory>,
    inference: InferenceEngine,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("inference", &self.inference)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Reconciler using the built-in wikitext parser
    #[must_use]
    pub fn new(
        config: ReconcileConfig,
        schemas: Arc<dyn SchemaSource>,
        graph: Arc<dyn CategoryGraph>,
        pages: Arc<dyn PageDirectory>,
    ) -> Self {
        let inference = InferenceEngine::new(&config);
        Self {
            config,
            parser: Arc::new(WikitextParser::new()),
            schemas,
            graph,
            pages,
            inference,
        }
    }

    /// Replace the template parser
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn TemplateParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the inference engine
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceEngine) -> Self {
        self.inference = inference;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile every record-template instance on `page`
    ///
    /// # Errors
    /// Returns [`ReconcileError::Schema`](crate::ReconcileError::Schema) if the
    /// fetched schema is malformed and
    /// [`ReconcileError::Parse`](crate::ReconcileError::Parse) if the text
    /// cannot be parsed. Every other problem becomes a diagnostic.
    pub async fn reconcile_page(&self, page: &PageContext) -> ReconcileResult<ReconciledPage> {
        let text: String = page.text.nfc().collect();
        let name = self.config.canonical_template_name.as_str();
        let mut snapshot = Snapshot::new();
        tracing::debug!(page = %page.title, run = %snapshot.run_id(), "Reconciling page");

        let schema = self.load_schema(&mut snapshot).await?;

        let (targets, sub_templates): (Vec<TemplateInstance>, Vec<TemplateInstance>) = self
            .parser
            .parse_instances(&text, true)?
            .into_iter()
            .partition(|instance| self.is_record_template(instance));
        let targets = outermost(targets);

        if targets.is_empty() {
            snapshot.push(Diagnostic::notice(format!("No {{{{{name}}}}} found on the page")));
        } else if targets.len() > self.config.expected_instances {
            snapshot.push(Diagnostic::warning(format!(
                "Found {} instances of {{{{{name}}}}}, expected at most {}",
                targets.len(),
                self.config.expected_instances
            )));
        }

        let signals = PageSignals::new(page.title.as_str())
            .with_categories(page.categories.iter().cloned())
            .with_sub_templates(sub_templates);
        let lookups = Lookups::new(Arc::clone(&self.graph), Arc::clone(&self.pages), &self.config);
        let mut summary = EditSummary::new(name);
        let mut replacements: Vec<(Range<usize>, String)> = Vec::with_capacity(targets.len());

        for instance in &targets {
            let choice = reconcile(Arc::clone(&schema), instance.params(), &signals, &self.inference, &lookups).await;
            let emitted = choice.emit_with_width(name, self.config.key_column_width);
            tracing::info!(
                page = %page.title,
                template = instance.name(),
                fields = choice.len(),
                diagnostics = choice.diagnostic_count(),
                "Reconciled template instance"
            );
            summary.record(&choice);
            replacements.push((instance.span(), emitted));
            snapshot.templates.push(choice);
        }

        if lookups.budget_exhausted() {
            snapshot.push(Diagnostic::notice(format!(
                "External lookup budget of {} calls exhausted; some categories were not checked",
                self.config.max_external_calls
            )));
        }

        let mut output = text.clone();
        for (range, emitted) in replacements.into_iter().rev() {
            output.replace_range(range, &emitted);
        }
        let changed = output != text;
        tracing::debug!(calls = lookups.calls(), changed, "Page reconciled");

        Ok(ReconciledPage {
            text: output,
            snapshot,
            summary,
            changed,
        })
    }

    /// Reconcile `page` and park its snapshot in `slot`
    ///
    /// # Errors
    /// As [`Reconciler::reconcile_page`], plus
    /// [`ReconcileError::Codec`](crate::ReconcileError::Codec) if the snapshot
    /// cannot be encoded.
    pub async fn reconcile_into(&self, page: &PageContext, slot: &HandoffSlot) -> ReconcileResult<ReconciledPage> {
        let reconciled = self.reconcile_page(page).await?;
        slot.put_snapshot(&reconciled.snapshot)?;
        Ok(reconciled)
    }

    /// Fetch the record template's schema, falling back to an empty one
    async fn load_schema(&self, snapshot: &mut Snapshot) -> ReconcileResult<Arc<Schema>> {
        let name = self.config.canonical_template_name.as_str();
        match self.schemas.fetch_schema(name).await {
            Ok(Some(schema)) => Ok(Arc::new(schema)),
            Ok(None) => {
                snapshot.push(Diagnostic::notice(format!(
                    "No schema data for {{{{{name}}}}}; parameters are kept as written"
                )));
                Ok(Arc::new(Schema::empty(name)))
            }
            Err(LookupError::InvalidSchema(err)) => Err(err.into()),
            Err(err) => {
                tracing::warn!(template = name, error = %err, "Schema fetch failed");
                snapshot.push(Diagnostic::warning(format!("Schema for {{{{{name}}}}} unavailable: {err}")));
                Ok(Arc::new(Schema::empty(name)))
            }
        }
    }

    fn is_record_template(&self, instance: &TemplateInstance) -> bool {
        self.config
            .template_names
            .iter()
            .any(|name| names_match(instance.name(), name))
    }
}

/// Drop instances nested inside an earlier instance; input is in page order
fn outermost(instances: Vec<TemplateInstance>) -> Vec<TemplateInstance> {
    let mut end = 0;
    instances
        .into_iter()
        .filter(|instance| {
            let span = instance.span();
            if span.start < end {
                return false;
            }
            end = span.end;
            true
        })
        .collect()
}
