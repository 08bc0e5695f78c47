//! Reconciliation of one template instance against its schema
//!
//! [`seed`] records suggestions and written values, inference adds
//! proposals, and [`finalize`] settles which side each field prefers.
//! [`reconcile`] runs the three in order.

use crate::ancestry::Lookups;
use crate::heuristics::{InferenceEngine, PageSignals};
use crate::sanitize::is_bare_comment;
use std::collections::HashSet;
use std::sync::Arc;
use tmpl_decision::{Diagnostic, TemplateChoice};
use tmpl_schema::{ParamKey, Schema, Suggestion};

/// Reconcile written pairs against `schema`, enriched by `signals`
pub async fn reconcile(
    schema: Arc<Schema>,
    written: &[(String, String)],
    signals: &PageSignals,
    engine: &InferenceEngine,
    lookups: &Lookups,
) -> TemplateChoice {
    let mut choice = seed(schema, written);
    engine.apply(&mut choice, signals, lookups).await;
    finalize(&mut choice, written);
    choice
}

/// Record suggestions and written values
///
/// Suggested fields are pre-filled with their autovalue. Weak suggestions
/// only stay preferred on brand-new instances. The first occurrence of a
/// duplicated key wins; the rest are reported and dropped. Keys without a
/// definition are kept with a notice, except blank positional strays.
#[must_use]
pub fn seed(schema: Arc<Schema>, written: &[(String, String)]) -> TemplateChoice {
    let mut choice = TemplateChoice::new(Arc::clone(&schema));

    for definition in schema.definitions() {
        let suggestion = definition.suggestion();
        if !suggestion.is_suggested() {
            continue;
        }
        let param = choice.choice(definition.key());
        param.proposed_value = Some(definition.autovalue().unwrap_or_default().to_string());
        param.prefer_original = suggestion == Suggestion::WeaklySuggested && !written.is_empty();
    }

    for (written_key, written_value) in written {
        let key = schema.canonicalize(written_key);
        let declared = schema.declares(key.as_str());
        if !declared && is_stray(&key, written_value) {
            tracing::debug!(key = %written_key, "Ignoring blank positional parameter");
            continue;
        }

        let param = choice.choice(&key);
        if let Some(first) = &param.original_key {
            let message = format!(
                "Duplicate parameter '{written_key}' dropped (value '{}'); keeping '{first}'",
                written_value.trim()
            );
            param.push(Diagnostic::warning(message));
            continue;
        }

        param.original_key = Some(written_key.clone());
        param.original_value = Some(written_value.clone());
        param.prefer_original = true;
        if !declared {
            param.push(Diagnostic::notice("No schema for this parameter"));
        }
    }

    choice
}

/// Settle preferences once all proposals are in
///
/// Proposals equal to the default are emptied. Written values that are
/// blank, default, autovalue or deprecated yield to the proposal unless that
/// proposal is trivial; bare comments always yield, with a notice.
pub fn finalize(choice: &mut TemplateChoice, written: &[(String, String)]) {
    for (_, param) in choice.iter_mut() {
        let is_default = param
            .proposed_value
            .as_deref()
            .is_some_and(|proposed| param.definition().is_default(proposed));
        if is_default {
            param.proposed_value = Some(String::new());
        }
    }

    let mut seen: HashSet<ParamKey> = HashSet::new();
    for (written_key, written_value) in written {
        let key = choice.schema().canonicalize(written_key);
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(param) = choice.get_mut(key.as_str()) else {
            continue;
        };

        let definition = param.definition();
        let value = written_value.trim();
        let placeholder = value.is_empty()
            || definition.is_default(value)
            || definition.is_autovalue(value)
            || definition.is_deprecated();

        if placeholder {
            param.prefer_original = !value.is_empty() && param.is_trivial_proposal();
        } else if is_bare_comment(value) {
            param.push(Diagnostic::notice("Replacing unexpected comment"));
            param.prefer_original = false;
        }
    }
}

fn is_stray(key: &ParamKey, value: &str) -> bool {
    (key.is_empty() || key.is_positional()) && value.trim().is_empty()
}
