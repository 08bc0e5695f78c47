//! Single-use snapshot handoff
//!
//! Stands in for the session storage a snapshot is parked in between the
//! submit and the next page load. A stored snapshot can be read once.

use crate::codec::Snapshot;
use crate::error::{CodecError, CodecResult};
use parking_lot::Mutex;

/// Holds at most one encoded snapshot until it is taken
#[derive(Debug, Default)]
pub struct HandoffSlot {
    pending: Mutex<Option<String>>,
}

impl HandoffSlot {
    /// Empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park encoded snapshot text, replacing anything not yet taken
    pub fn put(&self, encoded: String) {
        if self.pending.lock().replace(encoded).is_some() {
            tracing::debug!("Replaced untaken snapshot");
        }
    }

    /// Encode and park a snapshot
    ///
    /// # Errors
    /// Returns [`CodecError::Malformed`] if encoding fails
    pub fn put_snapshot(&self, snapshot: &Snapshot) -> CodecResult<()> {
        self.put(snapshot.encode()?);
        Ok(())
    }

    /// Remove and return the parked text; later calls return `None`
    #[must_use]
    pub fn take(&self) -> Option<String> {
        self.pending.lock().take()
    }

    /// Remove and decode the parked snapshot
    ///
    /// # Errors
    /// - [`CodecError::NothingPending`] if the slot is empty
    /// - any decode error from [`Snapshot::decode`]
    pub fn take_snapshot(&self) -> CodecResult<Snapshot> {
        let text = self.take().ok_or(CodecError::NothingPending)?;
        Snapshot::decode(&text)
    }

    /// Check if a snapshot is waiting
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}
