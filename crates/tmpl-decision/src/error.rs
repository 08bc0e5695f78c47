//! Error types for the snapshot codec

/// Errors while encoding or decoding a snapshot
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text is not a snapshot envelope
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope written by an incompatible format version
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Snapshot already taken from the handoff slot
    #[error("no snapshot pending")]
    NothingPending,
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
