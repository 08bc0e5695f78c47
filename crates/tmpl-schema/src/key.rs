//! Canonical parameter keys
//!
//! Provides [`ParamKey`], the shared identifier every schema entry and every
//! decision record is keyed by, plus the key normalization used before any
//! lookup.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

/// Canonical parameter key
///
/// Cheap to clone: the schema owns one allocation per key and every
/// canonicalized lookup hands out a clone of it. Ordering is plain
/// lexicographic ordering of the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamKey(Arc<str>);

impl ParamKey {
    /// Create key from already-normalized text
    #[inline]
    #[must_use]
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Create key from raw written text, normalizing it first
    #[inline]
    #[must_use]
    pub fn normalized(raw: &str) -> Self {
        Self::new(normalize_key(raw))
    }

    /// Key text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if key is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if key is a positional (numeric) parameter name
    #[inline]
    #[must_use]
    pub fn is_positional(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Display for ParamKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ParamKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ParamKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParamKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParamKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Normalize a written key for comparison
///
/// NFC-normalizes, trims, and collapses internal whitespace runs to a single
/// space. Normalizing an already-normalized key returns it unchanged.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    let mut out = String::with_capacity(composed.len());
    for word in composed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
