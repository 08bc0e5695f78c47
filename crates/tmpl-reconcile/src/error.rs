//! Error types for reconciliation
//!
//! Only configuration problems and parser limits are errors. Input anomalies
//! become diagnostics, and failed lookups degrade to "no match".

use tmpl_decision::CodecError;
use tmpl_schema::SchemaError;

/// Errors from an external lookup capability
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// The backing service could not answer
    #[error("lookup of '{subject}' failed: {message}")]
    Unavailable { subject: String, message: String },

    /// The per-run call budget is spent
    #[error("external call budget of {budget} exhausted")]
    BudgetExhausted { budget: usize },

    /// A schema was found but is malformed
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),
}

impl LookupError {
    /// Create unavailable error for a subject
    pub fn unavailable(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Errors while parsing template instances out of page text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Text exceeds the parser's size limit
    #[error("text of {size} bytes exceeds parser limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Templates nest deeper than the parser's limit
    #[error("template at byte {offset} nests deeper than {limit} levels")]
    TooDeep { offset: usize, limit: usize },
}

/// Errors aborting a page reconciliation
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The template's schema is malformed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Page text could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Snapshot could not be encoded
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type alias for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;
