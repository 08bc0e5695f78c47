//! Template Parameter Reconciliation
//!
//! Normalizes record-template instances in page text against their parameter
//! schema: written values are merged with schema suggestions and values
//! inferred from the page context, every decision keeps its provenance and
//! diagnostics, and each instance is re-emitted as canonical text.
//!
//! # Overview
//!
//! - **Reconciler**: page-level driver from source text to reconciled text
//! - **reconcile**: the per-instance merge and precedence algorithm
//! - **InferenceEngine**: category, sub-template and title rules
//! - **Lookups**: memoized, budgeted ancestor search and existence checks
//! - **WikitextParser**: built-in template instance parser
//!
//! External services (schema source, category graph, page directory) are
//! traits in [`external`]; in-memory implementations are provided.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod ancestry;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod heuristics;
pub mod parsers;
pub mod reconcile;
pub mod sanitize;
pub mod summary;

pub use ancestry::{AncestorQuery, Lookups};
pub use cache::{CacheStats, LookupCache};
pub use config::{FieldKeys, ReconcileConfig};
pub use engine::{PageContext, ReconciledPage, Reconciler};
pub use error::{LookupError, ParseError, ReconcileError, ReconcileResult};
pub use external::{
    category_name, CategoryGraph, PageDirectory, SchemaSource, StaticCategoryGraph, StaticPageDirectory,
    StaticSchemaSource,
};
pub use heuristics::{InferenceEngine, PageSignals};
pub use parsers::{names_match, TemplateInstance, TemplateParser, WikitextParser};
pub use reconcile::{finalize, reconcile, seed};
pub use sanitize::sanitize_field;
pub use summary::EditSummary;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
