//! Template instance parsers
//!
//! Turns page text into [`TemplateInstance`]s: name, byte span and the
//! ordered written key/value pairs. [`WikitextParser`] is the built-in
//! implementation; hosts with their own parser implement [`TemplateParser`].

use crate::error::ParseError;
use std::ops::Range;

mod wikitext;

pub use wikitext::WikitextParser;

/// Parser trait for extracting template instances from text
pub trait TemplateParser: Send + Sync {
    /// Parse every template instance in `text`
    ///
    /// With `recursive`, instances nested inside other instances are returned
    /// too, each after its enclosing instance.
    fn parse_instances(&self, text: &str, recursive: bool) -> Result<Vec<TemplateInstance>, ParseError>;
}

/// One template occurrence in page text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInstance {
    name: String,
    span: Range<usize>,
    params: Vec<(String, String)>,
}

impl TemplateInstance {
    /// Create instance from its parts
    #[must_use]
    pub fn new(name: impl Into<String>, span: Range<usize>, params: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            span,
            params,
        }
    }

    /// Template name as written (trimmed)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the whole `{{…}}` in the parsed text
    #[inline]
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Written key/value pairs in source order; duplicates are kept
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value written under `key`
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Rename the instance
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Check if this instance is a template called `name`
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Compare template names the way the wiki resolves them
///
/// Underscores count as spaces, whitespace runs collapse, a `Template:`
/// prefix is ignored, and the first letter is case-insensitive.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    template_key(a) == template_key(b)
}

fn template_key(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    let joined = words.join(" ");
    let bare = match joined.split_once(':') {
        Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("template") => rest.trim(),
        _ => joined.as_str(),
    };
    let mut chars = bare.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_rules() {
        assert!(names_match("infobox journal", "Infobox journal"));
        assert!(names_match("Infobox_journal", "Infobox journal"));
        assert!(names_match("Template:Infobox  journal", "Infobox journal"));
        assert!(!names_match("Infobox Journal", "Infobox journal"));
        assert!(!names_match("Infobox book", "Infobox journal"));
    }

    #[test]
    fn instance_accessors() {
        let mut instance = TemplateInstance::new(
            "infobox journal",
            0..10,
            vec![("title".into(), "A".into()), ("title".into(), "B".into())],
        );
        assert_eq!(instance.param("title"), Some("A"));
        assert!(instance.is_named("Infobox journal"));
        instance.rename("Infobox magazine");
        assert_eq!(instance.name(), "Infobox magazine");
        assert_eq!(instance.span(), 0..10);
    }
}
