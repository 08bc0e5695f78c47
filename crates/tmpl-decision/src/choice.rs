//! Decision records
//!
//! [`ParamChoice`] holds one field's decision state; [`TemplateChoice`] holds
//! every field of one template instance, keyed by canonical key and created
//! on first access.

use crate::diagnostic::Diagnostic;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tmpl_schema::{ParamKey, ParameterDefinition, Schema};

/// One field's decision state within one template instance
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChoice {
    definition: Arc<ParameterDefinition>,

    /// Key as written, if the field was written
    pub original_key: Option<String>,

    /// Value as written; `Some("")` is distinct from `None`
    pub original_value: Option<String>,

    /// Inferred or suggested value
    pub proposed_value: Option<String>,

    /// Whether the written value wins over the proposal
    pub prefer_original: bool,

    /// Explanations attached to this field, in the order they were raised
    pub diagnostics: Vec<Diagnostic>,
}

impl ParamChoice {
    /// Create an untouched decision bound to `definition`
    #[must_use]
    pub fn new(definition: Arc<ParameterDefinition>) -> Self {
        Self {
            definition,
            original_key: None,
            original_value: None,
            proposed_value: None,
            prefer_original: true,
            diagnostics: Vec::new(),
        }
    }

    /// Definition this decision is bound to
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &ParameterDefinition {
        &self.definition
    }

    /// Canonical key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ParamKey {
        self.definition.key()
    }

    /// Key to write back: the original key if written, else the canonical key
    #[must_use]
    pub fn display_key(&self) -> &str {
        self.original_key.as_deref().unwrap_or(self.definition.key().as_str())
    }

    /// Check if the field was written in the instance
    #[inline]
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.original_key.is_some()
    }

    /// Check if the proposal carries no opinion
    ///
    /// True when the proposal is absent or blank, or equals the written
    /// value, the default or the autovalue (all compared trimmed).
    #[must_use]
    pub fn is_trivial_proposal(&self) -> bool {
        let Some(proposed) = self.proposed_value.as_deref().map(str::trim) else {
            return true;
        };
        proposed.is_empty()
            || self.original_value.as_deref().is_some_and(|o| o.trim() == proposed)
            || self.definition.is_default(proposed)
            || self.definition.is_autovalue(proposed)
    }

    /// Final value for emission, or `None` to drop the field
    ///
    /// Preferring the original falls back to a non-trivial proposal when
    /// nothing was written; not preferring it uses the proposal only.
    #[must_use]
    pub fn chosen_value(&self) -> Option<&str> {
        if !self.prefer_original {
            return self.proposed_value.as_deref();
        }
        match self.original_value.as_deref() {
            Some(original) => Some(original),
            None if self.is_trivial_proposal() => None,
            None => self.proposed_value.as_deref(),
        }
    }

    /// Attach a diagnostic
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn into_record(self) -> ParamChoiceRecord {
        ParamChoiceRecord {
            original_key: self.original_key,
            original_value: self.original_value,
            proposed_value: self.proposed_value,
            prefer_original: self.prefer_original,
            diagnostics: self.diagnostics,
        }
    }

    fn from_record(definition: Arc<ParameterDefinition>, record: ParamChoiceRecord) -> Self {
        Self {
            definition,
            original_key: record.original_key,
            original_value: record.original_value,
            proposed_value: record.proposed_value,
            prefer_original: record.prefer_original,
            diagnostics: record.diagnostics,
        }
    }
}

/// Every decision for one template instance
///
/// All [`ParamChoice`]s are bound to definitions of the same schema this
/// record holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TemplateChoiceRecord", into = "TemplateChoiceRecord")]
pub struct TemplateChoice {
    schema: Arc<Schema>,
    choices: BTreeMap<ParamKey, ParamChoice>,

    /// Instance-level diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl TemplateChoice {
    /// Create an empty decision set for `schema`
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            choices: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Schema the decisions are made against
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get-or-create the decision for a canonical key
    pub fn choice(&mut self, key: &ParamKey) -> &mut ParamChoice {
        let schema = &self.schema;
        self.choices
            .entry(key.clone())
            .or_insert_with(|| ParamChoice::new(schema.definition_for(key.as_str())))
    }

    /// Existing decision for a canonical key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamChoice> {
        self.choices.get(key)
    }

    /// Mutable decision for a canonical key
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParamChoice> {
        self.choices.get_mut(key)
    }

    /// Decisions in canonical key order
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamChoice)> {
        self.choices.iter()
    }

    /// Mutable decisions in canonical key order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ParamKey, &mut ParamChoice)> {
        self.choices.iter_mut()
    }

    /// Number of decided parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Check if no parameter has a decision
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Attach an instance-level diagnostic
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Emission mapping: canonical key to `(display key, value)`, in display order
    ///
    /// Fields whose chosen value is absent are left out.
    #[must_use]
    pub fn final_values(&self) -> IndexMap<ParamKey, (String, String)> {
        let selected = self.choices.iter().filter_map(|(key, choice)| {
            choice
                .chosen_value()
                .map(|value| (key.clone(), (choice.display_key().to_string(), value.to_string())))
        });
        self.schema.order(selected)
    }

    /// Render this instance as canonical template text
    #[must_use]
    pub fn emit(&self, name: &str) -> String {
        self.schema.emit(self.final_values(), name)
    }

    /// [`TemplateChoice::emit`] with an explicit key column width
    #[must_use]
    pub fn emit_with_width(&self, name: &str, width: usize) -> String {
        self.schema.emit_with_width(self.final_values(), name, width)
    }

    /// Total number of diagnostics on the instance and its fields
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.len() + self.choices.values().map(|c| c.diagnostics.len()).sum::<usize>()
    }
}

/// Serialized field decision; the definition is rebound from the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParamChoiceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proposed_value: Option<String>,
    prefer_original: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TemplateChoiceRecord {
    schema: Arc<Schema>,
    choices: BTreeMap<ParamKey, ParamChoiceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl From<TemplateChoice> for TemplateChoiceRecord {
    fn from(choice: TemplateChoice) -> Self {
        Self {
            schema: choice.schema,
            choices: choice
                .choices
                .into_iter()
                .map(|(key, c)| (key, c.into_record()))
                .collect(),
            diagnostics: choice.diagnostics,
        }
    }
}

impl From<TemplateChoiceRecord> for TemplateChoice {
    fn from(record: TemplateChoiceRecord) -> Self {
        let schema = record.schema;
        let choices = record
            .choices
            .into_iter()
            .map(|(key, c)| {
                let definition = schema.definition_for(key.as_str());
                (key, ParamChoice::from_record(definition, c))
            })
            .collect();
        Self {
            schema,
            choices,
            diagnostics: record.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Infobox journal",
                [
                    ParameterDefinition::new("title").required(),
                    ParameterDefinition::new("frequency").with_autovalue("Quarterly"),
                    ParameterDefinition::new("country").with_default("X"),
                ],
                ["title", "frequency"],
            )
            .unwrap(),
        )
    }

    #[test]
    fn trivial_when_equal_to_default() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("country"));
        c.proposed_value = Some("X".into());
        assert!(c.is_trivial_proposal());
    }

    #[test]
    fn trivial_when_equal_to_original() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("country"));
        c.proposed_value = Some("Y".into());
        c.original_value = Some("Y".into());
        assert!(c.is_trivial_proposal());
    }

    #[test]
    fn not_trivial_when_different() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("country"));
        c.proposed_value = Some("Y".into());
        c.original_value = Some("Z".into());
        assert!(!c.is_trivial_proposal());
    }

    #[test]
    fn trivial_when_absent_or_autovalue() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("frequency"));
        assert!(c.is_trivial_proposal());
        c.proposed_value = Some(" Quarterly ".into());
        assert!(c.is_trivial_proposal());
        c.proposed_value = Some("  ".into());
        assert!(c.is_trivial_proposal());
    }

    #[test]
    fn choice_binds_placeholder_for_unknown_key() {
        let mut t = TemplateChoice::new(schema());
        assert!(!t.choice(&ParamKey::new("mystery")).definition().is_declared());
        assert!(t.choice(&ParamKey::new("title")).definition().is_declared());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn choice_is_get_or_create() {
        let mut t = TemplateChoice::new(schema());
        t.choice(&ParamKey::new("title")).proposed_value = Some("A".into());
        assert_eq!(t.choice(&ParamKey::new("title")).proposed_value.as_deref(), Some("A"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn chosen_value_rules() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("title"));

        c.proposed_value = Some("Inferred".into());
        assert_eq!(c.chosen_value(), Some("Inferred"));

        c.original_value = Some("Written".into());
        assert_eq!(c.chosen_value(), Some("Written"));

        c.prefer_original = false;
        assert_eq!(c.chosen_value(), Some("Inferred"));

        c.proposed_value = None;
        assert_eq!(c.chosen_value(), None);
    }

    #[test]
    fn trivial_fallback_is_not_inserted() {
        let mut t = TemplateChoice::new(schema());
        let c = t.choice(&ParamKey::new("frequency"));
        c.proposed_value = Some("Quarterly".into());
        assert_eq!(c.chosen_value(), None);
    }

    #[test]
    fn final_values_use_display_keys_in_order() {
        let mut t = TemplateChoice::new(schema());
        {
            let c = t.choice(&ParamKey::new("zeta"));
            c.original_key = Some("zeta".into());
            c.original_value = Some("z".into());
        }
        {
            let c = t.choice(&ParamKey::new("frequency"));
            c.original_key = Some("freq".into());
            c.original_value = Some("Monthly".into());
        }
        t.choice(&ParamKey::new("title")).proposed_value = Some("Journal".into());
        t.choice(&ParamKey::new("country"));

        let values: Vec<_> = t
            .final_values()
            .into_iter()
            .map(|(k, (d, v))| (k.to_string(), d, v))
            .collect();
        assert_eq!(
            values,
            vec![
                ("title".to_string(), "title".to_string(), "Journal".to_string()),
                ("frequency".to_string(), "freq".to_string(), "Monthly".to_string()),
                ("zeta".to_string(), "zeta".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn serde_rebinds_definitions() {
        let mut t = TemplateChoice::new(schema());
        t.choice(&ParamKey::new("title")).proposed_value = Some("J".into());
        t.choice(&ParamKey::new("mystery")).push(Diagnostic::notice("No schema for this parameter"));
        t.push(Diagnostic::warning("instance"));

        let json = serde_json::to_string(&t).unwrap();
        let back: TemplateChoice = serde_json::from_str(&json).unwrap();

        assert_eq!(back, t);
        assert!(back.get("title").unwrap().definition().is_required());
        assert!(!back.get("mystery").unwrap().definition().is_declared());
    }
}
