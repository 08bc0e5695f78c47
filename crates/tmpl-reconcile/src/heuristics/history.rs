//! Publication history span normalization

use crate::sanitize::sanitize_field;
use once_cell::sync::Lazy;
use regex::Regex;
use tmpl_decision::{Diagnostic, TemplateChoice};
use tmpl_schema::ParamKey;

/// A span bound: a year or decade, optionally led by a day and month, `?`,
/// or `present`
static SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{3,4}s?|\?)\s*(?:-{1,3}|[‐‑‒–—―−]|\bto\b)\s*((?:\d{1,2}\s+)?(?:[a-z]+\.?\s+)?\d{3,4}s?|\?|present\b)",
    )
    .unwrap()
});

/// Rewrite the separator of every `start-end` span in `value` as a single
/// unspaced en-dash
///
/// Any hyphen or dash variant and the word `to` count as separators. Bounds
/// may carry a month (`May 1950`) or be decades (`1950s`).
#[must_use]
pub fn normalize_dashes(value: &str) -> String {
    SPAN.replace_all(value, "${1}–${2}").into_owned()
}

/// Keep a written history value, with its dashes normalized
///
/// A category-inferred span that differs is reported as a notice instead of
/// replacing what the editor wrote.
pub fn apply(choice: &mut TemplateChoice, key: &ParamKey) {
    let Some(param) = choice.get_mut(key.as_str()) else {
        return;
    };
    let Some(original) = param.original_value.as_deref() else {
        return;
    };
    if sanitize_field(original).is_empty() {
        return;
    }

    let normalized = normalize_dashes(original.trim());
    if let Some(inferred) = param.proposed_value.as_deref() {
        if !inferred.trim().is_empty() && inferred.trim() != normalized {
            param.push(Diagnostic::notice(format!(
                "Categories suggest history '{}'",
                inferred.trim()
            )));
        }
    }
    param.proposed_value = Some(normalized);
    param.prefer_original = false;
}
