//! Protocol constants.
//!
//! Wire values are fixed by the protocol and MUST NOT be changed; peers
//! built against different values will not interoperate.

use std::time::Duration;

// =============================================================================
// DELIMITERS
// =============================================================================

/// Start-of-frame delimiter (`{`).
pub const START_DELIMITER: u8 = b'{';

/// End-of-frame delimiter (`}`).
pub const END_DELIMITER: u8 = b'}';

/// Escape byte (`\`), emitted before any literal delimiter or escape.
pub const ESCAPE_BYTE: u8 = b'\\';

// =============================================================================
// CONTROL BYTES
// =============================================================================

/// Control byte of a data frame.
pub const CONTROL_DATA: u8 = 0b0000_0000;

/// Control byte of a negative acknowledgment.
pub const CONTROL_NAK: u8 = 0b0001_0000;

/// Control byte of a positive acknowledgment.
pub const CONTROL_ACK: u8 = 0b0001_0001;

/// High-nibble value marking a control frame.
pub const CONTROL_FRAME_NIBBLE: u8 = 0x1;

// =============================================================================
// FRAME SIZES
// =============================================================================

/// Maximum payload bytes carried by one frame.
pub const MAX_FRAME_PAYLOAD: usize = 8;

/// Metadata bytes preceding the payload (control + sequence + checksum).
pub const FRAME_METADATA_SIZE: usize = 3;

/// Decoded size of a control frame (control + sequence + checksum).
pub const CONTROL_FRAME_SIZE: usize = 3;

// =============================================================================
// RETRANSMISSION
// =============================================================================

/// Initial retransmission timeout.
pub const INITIAL_RTO: Duration = Duration::from_millis(1000);

/// Maximum retransmission timeout after backoff.
pub const MAX_RTO: Duration = Duration::from_millis(60000);

/// Retransmit backoff multiplier applied after each timeout.
pub const RETRANSMIT_BACKOFF: u32 = 2;

/// Maximum retransmission attempts per chunk before giving up.
pub const MAX_RETRANSMITS: u32 = 10;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable overriding the initial retransmission timeout (ms).
pub const ENV_RTO_MS: &str = "FRAMELINK_RTO_MS";

/// Environment variable overriding the retransmission timeout cap (ms).
pub const ENV_MAX_RTO_MS: &str = "FRAMELINK_MAX_RTO_MS";

/// Environment variable overriding the retransmission limit (`0` = unlimited).
pub const ENV_MAX_RETRANSMITS: &str = "FRAMELINK_MAX_RETRANSMITS";

/// Environment variable overriding the per-frame payload size.
pub const ENV_CHUNK_SIZE: &str = "FRAMELINK_CHUNK_SIZE";
