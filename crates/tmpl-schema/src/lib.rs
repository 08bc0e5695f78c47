//! Template Schema Model
//!
//! Canonical parameter definitions for one record template, the alias table
//! that maps written keys onto canonical keys, the declared display order, and
//! the emitter that renders a final selection back into template text.
//!
//! # Architecture
//!
//! ```text
//! TemplateData JSON → TemplateDataDocument → Schema ─┬─ canonicalize / definition_for
//!                                                    ├─ order
//!                                                    └─ emit → "{{name\n| key = value\n}}"
//! ```
//!
//! # Example
//!
//! ```rust
//! use tmpl_schema::{ParameterDefinition, Schema};
//!
//! let schema = Schema::new(
//!     "Infobox journal",
//!     [
//!         ParameterDefinition::new("title").required(),
//!         ParameterDefinition::new("abbreviation").with_aliases(["abbr"]),
//!     ],
//!     ["title", "abbreviation"],
//! )?;
//!
//! assert_eq!(schema.canonicalize(" abbr ").as_str(), "abbreviation");
//! # Ok::<(), tmpl_schema::SchemaError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod definition;
pub mod emit;
pub mod error;
pub mod key;
pub mod schema;
pub mod templatedata;

pub use definition::{Deprecation, ParameterDefinition, Suggestion, ValueType};
pub use emit::KEY_COLUMN_WIDTH;
pub use error::{SchemaError, SchemaResult};
pub use key::{normalize_key, ParamKey};
pub use schema::{ParamSet, Schema};
pub use templatedata::{LocalizedText, TemplateDataDocument, TemplateDataParam};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
