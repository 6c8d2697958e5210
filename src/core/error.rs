//! Error types for the data-link layer.
//!
//! Nothing in here is ever shown to the client: frame-level problems are
//! resolved inside the link by discarding, NAKing or retransmitting, and
//! only link-ending conditions surface as [`LinkError`] to the caller of
//! `send`.

use std::io;

use thiserror::Error;

/// Errors that can occur when decoding an extracted frame.
///
/// All of these are recoverable: the frame is dropped (or NAKed) and the
/// link waits for the next one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame is too short to hold its metadata.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected size.
        expected: usize,
        /// Actual size extracted.
        actual: usize,
    },

    /// Control byte matches neither a data nor a control frame.
    #[error("invalid control byte: 0x{0:02x}")]
    InvalidType(u8),

    /// Sequence byte is neither 0 nor 1.
    #[error("invalid sequence byte: 0x{0:02x}")]
    InvalidSequence(u8),

    /// Control frame carries trailing bytes.
    #[error("control frame has {0} bytes, expected 3")]
    ControlLength(usize),
}

/// Link layer errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The transport failed to accept bytes.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A chunk was retransmitted too many times without an acknowledgment.
    #[error("max retransmits exceeded after {attempts} attempts")]
    MaxRetransmitsExceeded {
        /// Transmissions made for the chunk, the first one included.
        attempts: u32,
    },

    /// The receive half was dropped, so no acknowledgment can ever arrive.
    #[error("link closed")]
    Closed,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LinkError {
    /// Check if this error ends the link.
    ///
    /// A non-fatal error leaves the unsent data queued; calling `send`
    /// or `flush` again resumes from the unacknowledged chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Closed | LinkError::Config(_))
    }
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
