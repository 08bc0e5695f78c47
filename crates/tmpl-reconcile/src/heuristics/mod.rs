//! Contextual inference
//!
//! Proposes field values from signals around the template instance: the page
//! title, the page categories and auxiliary sub-templates. Category rules are
//! a table (see [`rules`]) evaluated in three phases:
//!
//! 1. every (category, rule) pair whose extractor matches becomes a candidate,
//!    in category order then rule order;
//! 2. candidates needing an ancestor search or existence check are resolved
//!    concurrently, results kept in candidate order; candidates of a
//!    first-wins slot are instead confirmed one at a time, stopping at the
//!    first that passes;
//! 3. confirmed candidates merge into an [`Accumulator`] under each rule's
//!    merge policy, and the accumulated slots become proposals.
//!
//! Lookup failures only ever drop a candidate.

pub mod history;
pub mod identifiers;
pub mod rules;

pub use identifiers::{is_issn, IdentifierRule};
pub use rules::{Accumulator, CategoryRule, LinkStyle, MergePolicy, Slot};

use crate::ancestry::Lookups;
use crate::config::ReconcileConfig;
use crate::external::category_name;
use crate::parsers::TemplateInstance;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tmpl_decision::TemplateChoice;

static DISAMBIGUATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap());

/// Page title without a trailing parenthetical disambiguator
#[must_use]
pub fn strip_title(title: &str) -> String {
    DISAMBIGUATOR.replace(title.trim(), "").trim().to_string()
}

/// Signals around one template instance
#[derive(Debug, Clone, Default)]
pub struct PageSignals {
    /// Title of the page holding the instance
    pub page_title: String,
    /// Category names, in the order the host listed them
    pub categories: Vec<String>,
    /// Auxiliary templates found on the page
    pub sub_templates: Vec<TemplateInstance>,
}

impl PageSignals {
    /// Signals for `page_title` with no categories or sub-templates
    #[must_use]
    pub fn new(page_title: impl Into<String>) -> Self {
        Self {
            page_title: page_title.into(),
            ..Self::default()
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

    /// Attach auxiliary templates
    #[must_use]
    pub fn with_sub_templates(mut self, sub_templates: Vec<TemplateInstance>) -> Self {
        self.sub_templates = sub_templates;
        self
    }
}

/// A category that matched a rule's extractor
#[derive(Debug)]
struct Candidate<'a> {
    category: String,
    rule: &'a CategoryRule,
    value: String,
}

/// Rule engine applying every inference rule to a [`TemplateChoice`]
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    config: ReconcileConfig,
    category_rules: Vec<CategoryRule>,
    identifier_rules: Vec<IdentifierRule>,
}

impl InferenceEngine {
    /// Engine with the default rule tables
    #[must_use]
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            config: config.clone(),
            category_rules: rules::default_rules(config),
            identifier_rules: identifiers::default_rules(),
        }
    }

    /// Replace the category rule table
    #[must_use]
    pub fn with_category_rules(mut self, rules: Vec<CategoryRule>) -> Self {
        self.category_rules = rules;
        self
    }

    /// Replace the identifier rule table
    #[must_use]
    pub fn with_identifier_rules(mut self, rules: Vec<IdentifierRule>) -> Self {
        self.identifier_rules = rules;
        self
    }

    /// Active category rules, in application order
    #[inline]
    #[must_use]
    pub fn category_rules(&self) -> &[CategoryRule] {
        &self.category_rules
    }

    /// Active identifier rules
    #[inline]
    #[must_use]
    pub fn identifier_rules(&self) -> &[IdentifierRule] {
        &self.identifier_rules
    }

    /// Propose values for `choice` from `signals`
    pub async fn apply(&self, choice: &mut TemplateChoice, signals: &PageSignals, lookups: &Lookups) {
        let fields = &self.config.fields;

        let title = strip_title(&signals.page_title);
        if !title.is_empty() {
            let key = choice.schema().canonicalize(&fields.title);
            choice.choice(&key).proposed_value = Some(title);
        }

        let accumulator = self.infer_from_categories(&signals.categories, lookups).await;
        let proposals = [
            (&fields.language, accumulator.get(Slot::Language).map(str::to_string)),
            (&fields.frequency, accumulator.get(Slot::Frequency).map(str::to_string)),
            (&fields.publisher, accumulator.get(Slot::Publisher).map(str::to_string)),
            (&fields.discipline, accumulator.get(Slot::Discipline).map(str::to_string)),
            (&fields.history, accumulator.history()),
            (&fields.open_access, accumulator.open_access().map(str::to_string)),
        ];
        for (field, value) in proposals {
            if let Some(value) = value {
                let key = choice.schema().canonicalize(field);
                choice.choice(&key).proposed_value = Some(value);
            }
        }

        identifiers::apply(&self.identifier_rules, choice, &signals.sub_templates, &self.config);

        let history = choice.schema().canonicalize(&fields.history);
        history::apply(choice, &history);
    }

    /// Run the category rule table over `categories`
    pub async fn infer_from_categories(&self, categories: &[String], lookups: &Lookups) -> Accumulator {
        let mut candidates = Vec::new();
        for category in categories.iter().map(|c| category_name(c)) {
            for rule in &self.category_rules {
                if let Some(value) = (rule.extract)(&category) {
                    candidates.push(Candidate {
                        category: category.clone(),
                        rule,
                        value,
                    });
                }
            }
        }

        let matched: HashSet<Slot> = candidates.iter().map(|c| c.rule.slot).collect();
        candidates.retain(|c| !c.rule.yields_to.iter().any(|slot| matched.contains(slot)));

        let (first_wins, merged): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.rule.policy == MergePolicy::FirstWins);
        let mut chains: BTreeMap<Slot, Vec<Candidate<'_>>> = BTreeMap::new();
        for candidate in first_wins {
            chains.entry(candidate.rule.slot).or_default().push(candidate);
        }

        let (resolved, firsts) = futures::join!(
            join_all(merged.iter().map(|candidate| confirm(candidate, lookups))),
            join_all(chains.values().map(|chain| first_confirmed(chain, lookups))),
        );

        let mut accumulator = Accumulator::new();
        for (candidate, value) in merged.iter().zip(resolved) {
            if let Some(value) = value {
                accumulator.merge(candidate.rule.slot, candidate.rule.policy, value);
            }
        }
        for (slot, value) in chains.keys().zip(firsts) {
            if let Some(value) = value {
                accumulator.merge(*slot, MergePolicy::FirstWins, value);
            }
        }
        accumulator
    }
}

/// Confirm the candidates of one first-wins slot in order, stopping at the
/// first that passes
async fn first_confirmed(chain: &[Candidate<'_>], lookups: &Lookups) -> Option<String> {
    for candidate in chain {
        if let Some(value) = confirm(candidate, lookups).await {
            return Some(value);
        }
    }
    None
}

async fn confirm(candidate: &Candidate<'_>, lookups: &Lookups) -> Option<String> {
    let value = resolve(candidate, lookups).await;
    match &value {
        Some(value) => tracing::debug!(
            category = %candidate.category,
            rule = candidate.rule.name,
            value = %value,
            "Category rule matched"
        ),
        None => tracing::debug!(
            category = %candidate.category,
            rule = candidate.rule.name,
            "Category not confirmed"
        ),
    }
    value
}

async fn resolve(candidate: &Candidate<'_>, lookups: &Lookups) -> Option<String> {
    let rule = candidate.rule;
    if let Some(query) = &rule.confirm {
        if !lookups.is_descendant_of(&candidate.category, query).await {
            return None;
        }
    }
    let exists = match rule.link {
        LinkStyle::WikiLinkIfExists => lookups.exists(&candidate.value).await,
        LinkStyle::Plain | LinkStyle::WikiLink => false,
    };
    Some(rule.render(&candidate.value, exists))
}
