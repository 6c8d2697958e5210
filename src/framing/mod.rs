//! Framing: checksum, byte stuffing, chunking and the frame model.
//!
//! Everything in this module is synchronous and free of I/O.

pub mod checksum;
pub mod chunker;
pub mod frame;
pub mod stuffing;

pub use checksum::{CrcParams, checksum, crc8};
pub use chunker::{SendQueue, chunk, chunk_by};
pub use frame::{ControlFrame, ControlKind, DataFrame, Frame, SeqBit};
pub use stuffing::{Deframer, encode, needs_escape, try_extract_frame};
