//! Template Decision Records
//!
//! Per-field and per-instance decision state produced by reconciliation,
//! the diagnostics explaining each decision, and the snapshot codec that
//! carries a run's decisions across a navigation boundary.
//!
//! # Overview
//!
//! - **ParamChoice**: written value, proposed value and precedence for one field
//! - **TemplateChoice**: every field of one template instance, created on demand
//! - **Snapshot**: all instances of one run plus page-level diagnostics
//! - **HandoffSlot**: single-use parking place for an encoded snapshot

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod choice;
pub mod codec;
pub mod diagnostic;
pub mod error;
pub mod handoff;

pub use choice::{ParamChoice, TemplateChoice};
pub use codec::{deserialize, serialize, RunId, Snapshot, SNAPSHOT_VERSION};
pub use diagnostic::{Diagnostic, Severity};
pub use error::{CodecError, CodecResult};
pub use handoff::HandoffSlot;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
