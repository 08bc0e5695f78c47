//! Category rule table
//!
//! Each [`CategoryRule`] pairs a name extractor with the slot it fills, how
//! repeated matches merge, whether the match must be confirmed by an ancestor
//! search, and how the value is linked.

use crate::ancestry::AncestorQuery;
use crate::config::ReconcileConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Intermediate value filled by category rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Publication language
    Language,
    /// Publication frequency
    Frequency,
    /// Publisher name
    Publisher,
    /// Subject area
    Discipline,
    /// Year of establishment
    HistoryStart,
    /// Year of disestablishment
    HistoryEnd,
    /// Defunct marker without a year
    Defunct,
    /// Hybrid open access
    HybridOpenAccess,
    /// Delayed open access
    DelayedOpenAccess,
    /// Open access derived from an ancestor category
    DerivedOpenAccess,
}

/// How a later match for an already-filled slot merges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Comma-join distinct values in match order
    Accumulate,
    /// Last match wins
    Overwrite,
    /// First confirmed match wins; candidates are confirmed one at a time
    /// and later ones are never looked up once one is confirmed
    FirstWins,
}

/// Link markup applied to a confirmed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// Value as is
    Plain,
    /// `[[value]]`
    WikiLink,
    /// `[[value]]` only if a page named `value` exists
    WikiLinkIfExists,
}

/// One category inference rule
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Rule name used in logs
    pub name: &'static str,
    /// Slot the extracted value lands in
    pub slot: Slot,
    /// Merge behaviour for repeated matches
    pub policy: MergePolicy,
    /// Value proposed by a category name, if the rule matches it
    pub extract: fn(&str) -> Option<String>,
    /// Ancestor search the category must pass
    pub confirm: Option<AncestorQuery>,
    /// Markup applied to the confirmed value
    pub link: LinkStyle,
    /// Slots whose candidates make this rule's candidates moot
    pub yields_to: &'static [Slot],
}

impl CategoryRule {
    /// Apply link markup to a value, given whether its page exists
    #[must_use]
    pub fn render(&self, value: &str, page_exists: bool) -> String {
        match self.link {
            LinkStyle::WikiLink => format!("[[{value}]]"),
            LinkStyle::WikiLinkIfExists if page_exists => format!("[[{value}]]"),
            LinkStyle::Plain | LinkStyle::WikiLinkIfExists => value.to_string(),
        }
    }
}

/// Category root confirming publisher categories
pub const PUBLISHER_ROOT: &str = "Academic journals by publisher";
/// Category root confirming subject-area categories
pub const DISCIPLINE_ROOT: &str = "Academic journals by subject area";
/// Category root confirming open access categories
pub const OPEN_ACCESS_ROOT: &str = "Open access journals";

const HYBRID_CATEGORY: &str = "Hybrid open access journals";
const DELAYED_CATEGORY: &str = "Delayed open access journals";

/// Frequency word (lowercase) to field label
pub const FREQUENCIES: &[(&str, &str)] = &[
    ("daily", "Daily"),
    ("weekly", "Weekly"),
    ("biweekly", "Biweekly"),
    ("semi-monthly", "Semi-monthly"),
    ("monthly", "Monthly"),
    ("bimonthly", "Bimonthly"),
    ("quarterly", "Quarterly"),
    ("triannual", "Triannual"),
    ("biannual", "Biannual"),
    ("semi-annual", "Semi-annual"),
    ("annual", "Annual"),
    ("irregular", "Irregular"),
    ("continuous", "Continuous"),
];

static LANGUAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)-language (?:journals|magazines)$").unwrap());
static PUBLISHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+) academic journals$").unwrap());
static DISCIPLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+) journals$").unwrap());
static ESTABLISHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)established in (\d{3,4})$").unwrap());
static DISESTABLISHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\sdisestablished in (\d{3,4})$").unwrap());

fn capture(re: &Regex, category: &str) -> Option<String> {
    re.captures(category).map(|caps| caps[1].trim().to_string())
}

fn language(category: &str) -> Option<String> {
    capture(&LANGUAGE, category)
}

fn frequency(category: &str) -> Option<String> {
    let lower = category.to_lowercase();
    let word = lower
        .strip_suffix(" journals")
        .or_else(|| lower.strip_suffix(" magazines"))?;
    FREQUENCIES
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, label)| (*label).to_string())
}

fn publisher(category: &str) -> Option<String> {
    capture(&PUBLISHER, category)
}

fn discipline(category: &str) -> Option<String> {
    let subject = capture(&DISCIPLINE, category)?;
    let lower = subject.to_lowercase();
    let excluded = lower.ends_with(" academic")
        || lower.ends_with("-language")
        || lower.contains("open access")
        || lower.starts_with("defunct")
        || FREQUENCIES.iter().any(|(w, _)| *w == lower);
    (!excluded).then_some(subject)
}

fn established(category: &str) -> Option<String> {
    capture(&ESTABLISHED, category)
}

fn disestablished(category: &str) -> Option<String> {
    capture(&DISESTABLISHED, category)
}

fn defunct(category: &str) -> Option<String> {
    (category.starts_with("Defunct journals") || category.starts_with("Defunct magazines"))
        .then(|| "?".to_string())
}

fn hybrid_open_access(category: &str) -> Option<String> {
    (category == HYBRID_CATEGORY).then(|| "[[Hybrid open access journal|Hybrid]]".to_string())
}

fn delayed_open_access(category: &str) -> Option<String> {
    (category == DELAYED_CATEGORY).then(|| "[[Delayed open access journal|Delayed]]".to_string())
}

fn derived_open_access(category: &str) -> Option<String> {
    (category.ends_with("journals") && !category.contains("Commons")).then(|| "Yes".to_string())
}

/// Default rule table, in evaluation order
#[must_use]
pub fn default_rules(config: &ReconcileConfig) -> Vec<CategoryRule> {
    vec![
        CategoryRule {
            name: "language",
            slot: Slot::Language,
            policy: MergePolicy::Accumulate,
            extract: language,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "frequency",
            slot: Slot::Frequency,
            policy: MergePolicy::Overwrite,
            extract: frequency,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "publisher",
            slot: Slot::Publisher,
            policy: MergePolicy::Accumulate,
            extract: publisher,
            confirm: Some(AncestorQuery::new(PUBLISHER_ROOT, config.publisher_depth).through("journal")),
            link: LinkStyle::WikiLink,
            yields_to: &[],
        },
        CategoryRule {
            name: "discipline",
            slot: Slot::Discipline,
            policy: MergePolicy::Accumulate,
            extract: discipline,
            confirm: Some(AncestorQuery::new(DISCIPLINE_ROOT, config.discipline_depth).through("journal")),
            link: LinkStyle::WikiLinkIfExists,
            yields_to: &[],
        },
        CategoryRule {
            name: "established",
            slot: Slot::HistoryStart,
            policy: MergePolicy::Overwrite,
            extract: established,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "disestablished",
            slot: Slot::HistoryEnd,
            policy: MergePolicy::Overwrite,
            extract: disestablished,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "defunct",
            slot: Slot::Defunct,
            policy: MergePolicy::FirstWins,
            extract: defunct,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "hybrid open access",
            slot: Slot::HybridOpenAccess,
            policy: MergePolicy::FirstWins,
            extract: hybrid_open_access,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "delayed open access",
            slot: Slot::DelayedOpenAccess,
            policy: MergePolicy::FirstWins,
            extract: delayed_open_access,
            confirm: None,
            link: LinkStyle::Plain,
            yields_to: &[],
        },
        CategoryRule {
            name: "open access",
            slot: Slot::DerivedOpenAccess,
            policy: MergePolicy::FirstWins,
            extract: derived_open_access,
            confirm: Some(AncestorQuery::new(OPEN_ACCESS_ROOT, config.open_access_depth)),
            link: LinkStyle::Plain,
            yields_to: &[Slot::HybridOpenAccess, Slot::DelayedOpenAccess],
        },
    ]
}

/// Slot values merged under each rule's policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    slots: BTreeMap<Slot, String>,
}

impl Accumulator {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `value` into `slot`
    pub fn merge(&mut self, slot: Slot, policy: MergePolicy, value: String) {
        match self.slots.entry(slot) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match policy {
                MergePolicy::Overwrite => {
                    entry.insert(value);
                }
                MergePolicy::Accumulate => {
                    let existing = entry.get_mut();
                    if !existing.split(", ").any(|item| item == value) {
                        existing.push_str(", ");
                        existing.push_str(&value);
                    }
                }
                MergePolicy::FirstWins => {}
            },
        }
    }

    /// Current value of `slot`
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Check if `slot` holds a value
    #[must_use]
    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Open access value: exact category labels beat the derived `Yes`
    #[must_use]
    pub fn open_access(&self) -> Option<&str> {
        self.get(Slot::HybridOpenAccess)
            .or_else(|| self.get(Slot::DelayedOpenAccess))
            .or_else(|| self.get(Slot::DerivedOpenAccess))
    }

    /// History span `start–end`, if a start or end year was found
    ///
    /// The end defaults to `present`, or `?` for defunct titles; the start
    /// defaults to `?`. A defunct marker alone proposes nothing.
    #[must_use]
    pub fn history(&self) -> Option<String> {
        let start = self.get(Slot::HistoryStart);
        let end = self.get(Slot::HistoryEnd);
        if start.is_none() && end.is_none() {
            return None;
        }
        let end = end.or_else(|| self.get(Slot::Defunct)).unwrap_or("present");
        Some(format!("{}–{end}", start.unwrap_or("?")))
    }
}
