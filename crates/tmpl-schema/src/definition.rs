//! Parameter definitions
//!
//! One [`ParameterDefinition`] per schema entry. Definitions are immutable
//! once built: the builder methods consume `self`, and the schema hands them
//! out behind `Arc`, so nothing downstream can alter a definition (including
//! the undeclared placeholder used for keys the schema does not know).

use crate::key::ParamKey;
use serde::{Deserialize, Serialize};

/// Declared value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    /// No type information
    #[default]
    Unknown,
    /// Numeric value
    Number,
    /// `1` or `0`
    Boolean,
    /// Short single-line text
    Line,
    /// Arbitrary wikitext
    Content,
    /// ISO 8601 date
    Date,
    /// Title of a page
    WikiPageName,
    /// Title of a file
    WikiFileName,
    /// Title of a template
    WikiTemplateName,
    /// User name
    WikiUserName,
    /// Wikitext that may contain unbalanced markup
    UnbalancedContent,
}

impl ValueType {
    /// TemplateData name of this type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Line => "line",
            Self::Content => "content",
            Self::Date => "date",
            Self::WikiPageName => "wiki-page-name",
            Self::WikiFileName => "wiki-file-name",
            Self::WikiTemplateName => "wiki-template-name",
            Self::WikiUserName => "wiki-user-name",
            Self::UnbalancedContent => "unbalanced-wikitext",
        }
    }

    /// Parse a TemplateData type name; unrecognised names map to `Unknown`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "line" => Self::Line,
            "content" | "string" => Self::Content,
            "date" => Self::Date,
            "wiki-page-name" => Self::WikiPageName,
            "wiki-file-name" => Self::WikiFileName,
            "wiki-template-name" => Self::WikiTemplateName,
            "wiki-user-name" => Self::WikiUserName,
            "unbalanced-wikitext" | "unbalanced-content" => Self::UnbalancedContent,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for ValueType {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.as_str().to_string()
    }
}

/// Suggestion level of a parameter
///
/// A weak suggestion is still a suggestion; it is only pre-filled into
/// brand-new template instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Suggestion {
    /// Not suggested
    #[default]
    None,
    /// Suggested
    Suggested,
    /// Suggested for new instances only
    WeaklySuggested,
}

impl Suggestion {
    /// Check if any suggestion applies
    #[inline]
    #[must_use]
    pub fn is_suggested(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Deprecation state of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Deprecation {
    /// Not deprecated
    #[default]
    Current,
    /// Deprecated without a replacement
    Deprecated,
    /// Deprecated with a replacement instruction
    Replaced(String),
}

impl Deprecation {
    /// Check if parameter is deprecated in any form
    #[inline]
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        !matches!(self, Self::Current)
    }
}

/// One schema entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    key: ParamKey,
    declared: bool,
    label: Option<String>,
    description: Option<String>,
    value_type: ValueType,
    default: Option<String>,
    autovalue: Option<String>,
    example: Option<String>,
    required: bool,
    suggestion: Suggestion,
    deprecated: Deprecation,
    aliases: Vec<String>,
}

impl ParameterDefinition {
    /// Create a declared definition with no attributes set
    ///
    /// The key is normalized the same way written keys are, so `" cover  image"`
    /// declares `cover image`.
    #[must_use]
    pub fn new(key: impl Into<ParamKey>) -> Self {
        let key: ParamKey = key.into();
        Self {
            declared: true,
            ..Self::placeholder(ParamKey::normalized(key.as_str()))
        }
    }

    /// Placeholder for a key the schema does not declare
    ///
    /// Carries only the key; [`is_declared`](Self::is_declared) is `false`.
    #[must_use]
    pub fn placeholder(key: impl Into<ParamKey>) -> Self {
        Self {
            key: key.into(),
            declared: false,
            label: None,
            description: None,
            value_type: ValueType::Unknown,
            default: None,
            autovalue: None,
            example: None,
            required: false,
            suggestion: Suggestion::None,
            deprecated: Deprecation::Current,
            aliases: Vec::new(),
        }
    }

    /// Set the display label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the value type
    #[must_use]
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Set the value assumed when absent
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the value suggested on insertion
    #[must_use]
    pub fn with_autovalue(mut self, autovalue: impl Into<String>) -> Self {
        self.autovalue = Some(autovalue.into());
        self
    }

    /// Set the example value
    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the suggestion level
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = suggestion;
        self
    }

    /// Mark as suggested
    #[must_use]
    pub fn suggested(self) -> Self {
        self.with_suggestion(Suggestion::Suggested)
    }

    /// Mark as weakly suggested
    #[must_use]
    pub fn weakly_suggested(self) -> Self {
        self.with_suggestion(Suggestion::WeaklySuggested)
    }

    /// Set the deprecation state
    #[must_use]
    pub fn with_deprecation(mut self, deprecated: Deprecation) -> Self {
        self.deprecated = deprecated;
        self
    }

    /// Set the alias keys
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Canonical key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ParamKey {
        &self.key
    }

    /// `false` for the placeholder of an undeclared key
    #[inline]
    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Free-text description
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared value type
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Value assumed when the parameter is absent
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Value suggested when the parameter is first inserted
    #[inline]
    #[must_use]
    pub fn autovalue(&self) -> Option<&str> {
        self.autovalue.as_deref()
    }

    /// Example value
    #[inline]
    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    /// Check if the parameter must be present
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Suggestion level
    #[inline]
    #[must_use]
    pub fn suggestion(&self) -> Suggestion {
        self.suggestion
    }

    /// Deprecation state
    #[inline]
    #[must_use]
    pub fn deprecation(&self) -> &Deprecation {
        &self.deprecated
    }

    /// Check if deprecated in any form
    #[inline]
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_deprecated()
    }

    /// Alias keys as declared (not normalized)
    #[inline]
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Check if `value` equals the default, ignoring surrounding whitespace
    #[must_use]
    pub fn is_default(&self, value: &str) -> bool {
        self.default.as_deref().is_some_and(|d| d.trim() == value.trim())
    }

    /// Check if `value` equals the autovalue, ignoring surrounding whitespace
    #[must_use]
    pub fn is_autovalue(&self, value: &str) -> bool {
        self.autovalue.as_deref().is_some_and(|a| a.trim() == value.trim())
    }
}
