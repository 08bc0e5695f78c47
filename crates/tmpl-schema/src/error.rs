//! Error types for schema construction
//!
//! Every variant is a configuration error: the schema is malformed and must
//! not be used. Input anomalies found while reconciling never surface here.

use crate::key::ParamKey;

/// Errors raised while building a [`Schema`](crate::Schema)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// One alias declared by two different parameters
    #[error("alias '{alias}' maps to both '{first}' and '{second}'")]
    ConflictingAlias {
        alias: String,
        first: ParamKey,
        second: ParamKey,
    },

    /// An alias equal to some other parameter's canonical key
    #[error("alias '{alias}' of '{owner}' shadows a canonical parameter key")]
    AliasShadowsParameter { alias: String, owner: ParamKey },

    /// The same canonical key defined twice
    #[error("parameter '{0}' is defined more than once")]
    DuplicateParameter(ParamKey),

    /// A parameter with an empty key
    #[error("parameter keys must not be empty")]
    EmptyKey,

    /// Both `suggested` and `weaklySuggested` set on one parameter
    #[error("parameter '{0}' is both suggested and weakly suggested")]
    ConflictingSuggestion(ParamKey),

    /// The TemplateData document could not be decoded
    #[error("invalid TemplateData: {0}")]
    InvalidTemplateData(String),
}

impl SchemaError {
    /// Create conflicting alias error
    pub fn conflicting_alias(alias: impl Into<String>, first: ParamKey, second: ParamKey) -> Self {
        Self::ConflictingAlias {
            alias: alias.into(),
            first,
            second,
        }
    }
}

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
