//! Identifier rules fed by auxiliary sub-templates
//!
//! ISSNs and official websites are read from templates such as
//! `{{ISSN|0001-0001}}` or `{{Official website|example.org}}` found on the
//! page. The first occurrence seeds the proposal; a later, different value
//! only raises a warning.

use crate::config::{FieldKeys, ReconcileConfig};
use crate::parsers::{names_match, TemplateInstance, TemplateParser, WikitextParser};
use crate::sanitize::sanitize_field;
use once_cell::sync::Lazy;
use regex::Regex;
use tmpl_decision::{Diagnostic, TemplateChoice};

static ISSN_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{3}[0-9Xx]$").unwrap());

/// Check if a value looks like an ISSN (`dddd-dddc`)
#[must_use]
pub fn is_issn(value: &str) -> bool {
    ISSN_SHAPE.is_match(value.trim())
}

/// How a rule turns a raw parameter into a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// ISSN-shaped identifier, checked for shape
    Issn,
    /// URL, given the default scheme when it has none
    Url,
}

/// One sub-template identifier rule
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    /// Target field
    pub field: fn(&FieldKeys) -> &str,
    /// Recognised sub-template names
    pub templates: &'static [&'static str],
    /// Parameters read, in preference order
    pub params: &'static [&'static str],
    /// Match names ignoring case, spaces and underscores
    pub loose_names: bool,
    /// Value handling
    pub kind: ValueKind,
}

impl IdentifierRule {
    fn matches(&self, instance: &TemplateInstance) -> bool {
        if self.loose_names {
            let name = loose(instance.name());
            self.templates.iter().any(|t| loose(t) == name)
        } else {
            self.templates.iter().any(|t| names_match(instance.name(), t))
        }
    }

    fn value(&self, instance: &TemplateInstance, config: &ReconcileConfig) -> Option<String> {
        let raw = self.params.iter().find_map(|p| instance.param(p))?;
        let value = sanitize_field(raw);
        if value.is_empty() {
            return None;
        }
        Some(match self.kind {
            ValueKind::Issn => value,
            ValueKind::Url => with_scheme(&value, &config.default_url_scheme),
        })
    }
}

fn loose(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Prefix `scheme` unless the URL already has one
fn with_scheme(url: &str, scheme: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("{scheme}{}", url.trim_start_matches('/'))
    }
}

/// Default identifier rules
#[must_use]
pub fn default_rules() -> Vec<IdentifierRule> {
    vec![
        IdentifierRule {
            field: |f| f.issn.as_str(),
            templates: &["ISSN", "ISSN link", "ISSNT"],
            params: &["1"],
            loose_names: false,
            kind: ValueKind::Issn,
        },
        IdentifierRule {
            field: |f| f.eissn.as_str(),
            templates: &["eISSN", "EISSN"],
            params: &["1"],
            loose_names: false,
            kind: ValueKind::Issn,
        },
        IdentifierRule {
            field: |f| f.website.as_str(),
            templates: &["Official website", "Official URL", "Official site"],
            params: &["1", "url", "URL"],
            loose_names: true,
            kind: ValueKind::Url,
        },
    ]
}

/// Apply identifier rules to `choice`
pub fn apply(
    rules: &[IdentifierRule],
    choice: &mut TemplateChoice,
    sub_templates: &[TemplateInstance],
    config: &ReconcileConfig,
) {
    for rule in rules {
        let key = choice.schema().canonicalize((rule.field)(&config.fields));
        let mut seeded: Option<String> = None;
        let mut diagnostics = Vec::new();

        for instance in sub_templates.iter().filter(|i| rule.matches(i)) {
            let Some(value) = rule.value(instance, config) else {
                continue;
            };
            match &seeded {
                None => {
                    tracing::debug!(field = %key, template = instance.name(), value = %value, "Identifier found");
                    seeded = Some(value);
                }
                Some(first) if *first != value => diagnostics.push(Diagnostic::warning(format!(
                    "Conflicting {{{{{}}}}} value '{value}' ignored; keeping '{first}'",
                    instance.name()
                ))),
                Some(_) => {}
            }
        }

        if seeded.is_none() && diagnostics.is_empty() {
            continue;
        }
        let param = choice.choice(&key);
        if let Some(value) = seeded {
            param.proposed_value = Some(value);
        }
        param.diagnostics.extend(diagnostics);
    }

    check_issn_shapes(rules, choice, config);
}

/// Notice for written or proposed ISSNs that are not ISSN-shaped
fn check_issn_shapes(rules: &[IdentifierRule], choice: &mut TemplateChoice, config: &ReconcileConfig) {
    for rule in rules.iter().filter(|r| r.kind == ValueKind::Issn) {
        let key = choice.schema().canonicalize((rule.field)(&config.fields));
        let Some(param) = choice.get_mut(key.as_str()) else {
            continue;
        };
        let mut malformed: Vec<String> = Vec::new();
        for value in [&param.original_value, &param.proposed_value].into_iter().flatten() {
            let Some(clean) = bare_identifier(rule, value) else {
                continue;
            };
            if !is_issn(&clean) && !malformed.contains(&clean) {
                malformed.push(clean);
            }
        }
        for value in malformed {
            param.push(Diagnostic::notice(format!("'{value}' does not look like an ISSN")));
        }
    }
}

/// Plain identifier held by a field value
///
/// A value written as one of the rule's own templates (`{{ISSN|0001-0001}}`)
/// yields that template's argument. Any other markup cannot be checked and
/// yields nothing, as does an empty value.
fn bare_identifier(rule: &IdentifierRule, value: &str) -> Option<String> {
    let clean = sanitize_field(value);
    if !clean.contains("{{") {
        return (!clean.is_empty()).then_some(clean);
    }
    let instances = WikitextParser::new().parse_instances(&clean, false).ok()?;
    match instances.as_slice() {
        [only] if only.span() == (0..clean.len()) && rule.matches(only) => rule
            .params
            .iter()
            .find_map(|p| only.param(p))
            .map(sanitize_field)
            .filter(|inner| !inner.is_empty()),
        _ => None,
    }
}
