//! TemplateData documents
//!
//! The host platform publishes template schemas as TemplateData JSON. This
//! module holds the wire shape of that document and its conversion to and
//! from [`Schema`].

use crate::definition::{Deprecation, ParameterDefinition, Suggestion, ValueType};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{ParamSet, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text that is either plain or keyed by language code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    /// Same text in every language
    Plain(String),
    /// Text per language code
    Localized(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Resolve to a single string: the `en` entry, else the first entry
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Plain(text) => Some(text.clone()),
            Self::Localized(map) => map
                .get("en")
                .or_else(|| map.values().next())
                .cloned(),
        }
    }
}

/// Deprecation as written: a flag or a replacement instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDeprecation {
    /// `true` marks deprecation
    Flag(bool),
    /// Replacement instruction
    Instruction(String),
}

impl From<RawDeprecation> for Deprecation {
    fn from(raw: RawDeprecation) -> Self {
        match raw {
            RawDeprecation::Flag(false) => Self::Current,
            RawDeprecation::Flag(true) => Self::Deprecated,
            RawDeprecation::Instruction(text) if text.trim().is_empty() => Self::Deprecated,
            RawDeprecation::Instruction(text) => Self::Replaced(text),
        }
    }
}

impl From<&Deprecation> for Option<RawDeprecation> {
    fn from(value: &Deprecation) -> Self {
        match value {
            Deprecation::Current => None,
            Deprecation::Deprecated => Some(RawDeprecation::Flag(true)),
            Deprecation::Replaced(text) => Some(RawDeprecation::Instruction(text.clone())),
        }
    }
}

/// One `params` entry of a TemplateData document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDataParam {
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// Value type
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Value assumed when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<LocalizedText>,
    /// Value suggested on insertion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autovalue: Option<String>,
    /// Example value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<LocalizedText>,
    /// Must be present
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Suggested
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suggested: bool,
    /// Suggested for new instances only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub weakly_suggested: bool,
    /// Deprecation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<RawDeprecation>,
    /// Alternative keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// One `sets` entry of a TemplateData document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDataSet {
    /// Set label
    pub label: LocalizedText,
    /// Member keys
    #[serde(default)]
    pub params: Vec<String>,
}

/// A TemplateData document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDataDocument {
    /// Template description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// Layout format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Consumer name-mapping tables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub maps: BTreeMap<String, serde_json::Value>,
    /// Parameter groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<TemplateDataSet>,
    /// Parameters by key
    #[serde(default)]
    pub params: BTreeMap<String, TemplateDataParam>,
    /// Preferred parameter order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_order: Option<Vec<String>>,
}

impl TemplateDataDocument {
    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidTemplateData`] if the JSON is malformed
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        serde_json::from_str(json).map_err(|e| SchemaError::InvalidTemplateData(e.to_string()))
    }

    /// Build the schema for `title` from this document
    ///
    /// # Errors
    /// Any configuration error from [`Schema::new`], or
    /// [`SchemaError::ConflictingSuggestion`] when a parameter sets both
    /// suggestion flags.
    pub fn into_schema(self, title: impl Into<String>) -> SchemaResult<Schema> {
        let mut definitions = Vec::with_capacity(self.params.len());
        for (key, param) in self.params {
            definitions.push(param.into_definition(&key)?);
        }

        let sets = self
            .sets
            .into_iter()
            .map(|set| ParamSet {
                label: set.label.resolve().unwrap_or_default(),
                params: set.params,
            })
            .collect();

        let schema = Schema::new(title, definitions, self.param_order.unwrap_or_default())?
            .with_format(self.format)
            .with_maps(self.maps)
            .with_sets(sets);

        Ok(match self.description.and_then(|d| d.resolve()) {
            Some(description) => schema.with_description(description),
            None => schema,
        })
    }

    /// Document describing `schema`
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        let params = schema
            .definitions()
            .map(|def| (def.key().to_string(), TemplateDataParam::from_definition(def)))
            .collect();

        Self {
            description: schema.description().map(|d| LocalizedText::Plain(d.to_string())),
            format: schema.format().map(str::to_string),
            maps: schema.maps().clone(),
            sets: schema
                .sets()
                .iter()
                .map(|set| TemplateDataSet {
                    label: LocalizedText::Plain(set.label.clone()),
                    params: set.params.clone(),
                })
                .collect(),
            params,
            param_order: if schema.param_order().is_empty() {
                None
            } else {
                Some(schema.param_order().iter().map(ToString::to_string).collect())
            },
        }
    }
}

impl TemplateDataParam {
    fn into_definition(self, key: &str) -> SchemaResult<ParameterDefinition> {
        let mut def = ParameterDefinition::new(crate::key::ParamKey::normalized(key))
            .with_type(self.value_type)
            .with_aliases(self.aliases);

        if let Some(label) = self.label.and_then(|t| t.resolve()) {
            def = def.with_label(label);
        }
        if let Some(description) = self.description.and_then(|t| t.resolve()) {
            def = def.with_description(description);
        }
        if let Some(default) = self.default.and_then(|t| t.resolve()) {
            def = def.with_default(default);
        }
        if let Some(autovalue) = self.autovalue {
            def = def.with_autovalue(autovalue);
        }
        if let Some(example) = self.example.and_then(|t| t.resolve()) {
            def = def.with_example(example);
        }
        if self.required {
            def = def.required();
        }
        def = match (self.suggested, self.weakly_suggested) {
            (true, true) => return Err(SchemaError::ConflictingSuggestion(def.key().clone())),
            (true, false) => def.suggested(),
            (false, true) => def.weakly_suggested(),
            (false, false) => def,
        };
        if let Some(deprecated) = self.deprecated {
            def = def.with_deprecation(deprecated.into());
        }
        Ok(def)
    }

    fn from_definition(def: &ParameterDefinition) -> Self {
        Self {
            label: def.label().map(|l| LocalizedText::Plain(l.to_string())),
            description: def.description().map(|d| LocalizedText::Plain(d.to_string())),
            value_type: def.value_type(),
            default: def.default().map(|d| LocalizedText::Plain(d.to_string())),
            autovalue: def.autovalue().map(str::to_string),
            example: def.example().map(|e| LocalizedText::Plain(e.to_string())),
            required: def.is_required(),
            suggested: def.suggestion() == Suggestion::Suggested,
            weakly_suggested: def.suggestion() == Suggestion::WeaklySuggested,
            deprecated: def.deprecation().into(),
            aliases: def.aliases().to_vec(),
        }
    }
}
