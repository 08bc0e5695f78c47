//! Diagnostics attached to decisions

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action needed
    Notice,
    /// Something in the input probably needs attention
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
        })
    }
}

/// One input anomaly, explained
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How loudly to surface the anomaly
    pub severity: Severity,
    /// Human-readable explanation
    pub message: String,
}

impl Diagnostic {
    /// Informational diagnostic
    #[inline]
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Notice,
            message: message.into(),
        }
    }

    /// Diagnostic the user should act on
    #[inline]
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Check if this is a warning
    #[inline]
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_severity() {
        assert_eq!(
            Diagnostic::warning("Duplicate parameter").to_string(),
            "warning: Duplicate parameter"
        );
        assert_eq!(Diagnostic::notice("x").to_string(), "notice: x");
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Diagnostic::notice("n")).unwrap();
        assert_eq!(json, r#"{"severity":"notice","message":"n"}"#);
    }
}
