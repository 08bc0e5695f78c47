//! Edit summary text

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use tmpl_decision::TemplateChoice;

/// Parameters added, changed and removed by a reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSummary {
    template: String,
    added: IndexSet<String>,
    changed: IndexSet<String>,
    removed: IndexSet<String>,
}

impl EditSummary {
    /// Empty summary for `template`
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Summary of a single reconciled instance
    #[must_use]
    pub fn of(template: impl Into<String>, choice: &TemplateChoice) -> Self {
        let mut summary = Self::new(template);
        summary.record(choice);
        summary
    }

    /// Add the field changes of `choice`, in display order
    pub fn record(&mut self, choice: &TemplateChoice) {
        let ordered = choice
            .schema()
            .order(choice.iter().map(|(key, param)| (key.clone(), param)));
        for param in ordered.values() {
            let key = param.display_key().to_string();
            let original = param.original_value.as_deref().map(str::trim);
            let chosen = param.chosen_value().map(str::trim);
            match (original, chosen) {
                (None, Some(value)) if !value.is_empty() => {
                    self.added.insert(key);
                }
                (Some(_), None) => {
                    self.removed.insert(key);
                }
                (Some(before), Some(after)) if before != after => {
                    self.changed.insert(key);
                }
                _ => {}
            }
        }
    }

    /// Template the summary describes
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Display keys of inserted fields
    #[must_use]
    pub fn added(&self) -> Vec<&str> {
        self.added.iter().map(String::as_str).collect()
    }

    /// Display keys of rewritten fields
    #[must_use]
    pub fn changed(&self) -> Vec<&str> {
        self.changed.iter().map(String::as_str).collect()
    }

    /// Display keys of dropped fields
    #[must_use]
    pub fn removed(&self) -> Vec<&str> {
        self.removed.iter().map(String::as_str).collect()
    }

    /// Check if nothing was added, changed or removed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

impl Display for EditSummary {
    /// `Infobox journal: added frequency; changed history; removed foo.`, or
    /// nothing when no field changed
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = [("added", &self.added), ("changed", &self.changed), ("removed", &self.removed)]
            .into_iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(verb, keys)| format!("{verb} {}", keys.iter().cloned().collect::<Vec<_>>().join(", ")))
            .collect();
        write!(f, "{}: {}.", self.template, parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tmpl_schema::{ParamKey, ParameterDefinition, Schema};

    fn choice() -> TemplateChoice {
        let schema = Schema::new(
            "Infobox journal",
            [
                ParameterDefinition::new("title"),
                ParameterDefinition::new("history"),
                ParameterDefinition::new("frequency"),
            ],
            ["title", "history", "frequency"],
        )
        .unwrap();
        TemplateChoice::new(Arc::new(schema))
    }

    fn written(choice: &mut TemplateChoice, key: &str, value: &str) {
        let param = choice.choice(&ParamKey::new(key));
        param.original_key = Some(key.into());
        param.original_value = Some(value.into());
    }

    #[test]
    fn renders_changes_in_display_order() {
        let mut choice = choice();
        written(&mut choice, "title", "Journal of Tests");
        written(&mut choice, "history", "1950-present");
        written(&mut choice, "foo", "bar");
        choice.choice(&ParamKey::new("frequency")).proposed_value = Some("Monthly".into());
        let history = choice.choice(&ParamKey::new("history"));
        history.proposed_value = Some("1950–present".into());
        history.prefer_original = false;
        let foo = choice.choice(&ParamKey::new("foo"));
        foo.proposed_value = None;
        foo.prefer_original = false;

        let summary = EditSummary::of("Infobox journal", &choice);
        assert_eq!(summary.added(), vec!["frequency"]);
        assert_eq!(summary.changed(), vec!["history"]);
        assert_eq!(summary.removed(), vec!["foo"]);
        assert_eq!(
            summary.to_string(),
            "Infobox journal: added frequency; changed history; removed foo."
        );
    }

    #[test]
    fn unchanged_instance_renders_nothing() {
        let mut choice = choice();
        written(&mut choice, "title", "Journal of Tests");
        let summary = EditSummary::of("Infobox journal", &choice);
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "");
    }

    #[test]
    fn records_accumulate_without_repeats() {
        let mut first = choice();
        first.choice(&ParamKey::new("frequency")).proposed_value = Some("Monthly".into());
        let mut summary = EditSummary::new("Infobox journal");
        summary.record(&first);
        summary.record(&first);
        assert_eq!(summary.to_string(), "Infobox journal: added frequency.");
    }
}
