//! Frame model for the stop-and-wait link.
//!
//! An extracted frame body is classified exactly once into a [`Frame`];
//! every consumer matches on the variant instead of re-testing bits.
//!
//! Decoded layouts:
//! ```text
//! data:    +---------+----------+----------+------------------+
//!          | 0x00    | seq 0|1  | CRC-8    | payload (0..=8)  |
//!          +---------+----------+----------+------------------+
//! control: +---------+----------+----------+
//!          | 0x1X    | seq 0|1  | CRC-8    |
//!          +---------+----------+----------+
//! ```

use std::fmt;

use crate::core::{
    CONTROL_ACK, CONTROL_DATA, CONTROL_FRAME_NIBBLE, CONTROL_FRAME_SIZE, CONTROL_NAK,
    FRAME_METADATA_SIZE, FrameError,
};

use super::checksum::crc8;
use super::stuffing;

/// Alternating one-bit sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeqBit {
    /// Sequence 0, the initial value on both sides.
    #[default]
    Zero,
    /// Sequence 1.
    One,
}

impl SeqBit {
    /// Parse a sequence byte; only 0 and 1 are valid.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// The other sequence number.
    pub fn complement(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// Advance to the other sequence number in place.
    pub fn toggle(&mut self) {
        *self = self.complement();
    }
}

impl fmt::Display for SeqBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte())
    }
}

/// Classification of a control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Positive acknowledgment (`0x11`).
    Ack,
    /// Negative acknowledgment (`0x10`).
    Nak,
    /// Any other `0x1X` pattern. Senders treat it as a NAK.
    Reserved(u8),
}

impl ControlKind {
    /// Classify a control byte whose high nibble marks a control frame.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            CONTROL_ACK => Self::Ack,
            CONTROL_NAK => Self::Nak,
            other => Self::Reserved(other),
        }
    }

    /// Wire representation.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Ack => CONTROL_ACK,
            Self::Nak => CONTROL_NAK,
            Self::Reserved(byte) => byte,
        }
    }
}

/// A data frame carrying one chunk of client payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Sequence number of this chunk.
    pub seq: SeqBit,
    /// CRC-8 as carried on the wire.
    pub checksum: u8,
    /// Chunk payload.
    pub payload: Vec<u8>,
}

impl DataFrame {
    /// Create a data frame, computing its checksum over `payload`.
    pub fn new(seq: SeqBit, payload: Vec<u8>) -> Self {
        Self {
            seq,
            checksum: crc8(&payload),
            payload,
        }
    }

    /// Check whether the carried checksum matches the payload.
    pub fn is_intact(&self) -> bool {
        crc8(&self.payload) == self.checksum
    }

    /// Encode to delimited, escaped wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        stuffing::encode(
            &[CONTROL_DATA, self.seq.as_byte(), self.checksum],
            &self.payload,
        )
    }
}

/// An ACK or NAK control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFrame {
    /// ACK, NAK or reserved.
    pub kind: ControlKind,
    /// Sequence number being acknowledged.
    pub seq: SeqBit,
    /// CRC-8 as carried on the wire.
    pub checksum: u8,
}

impl ControlFrame {
    /// Build a control frame as the receive half emits it.
    ///
    /// The checksum covers the control byte and the receiver's current
    /// expected sequence number, which differs from `seq` when a duplicate
    /// is re-acknowledged.
    pub fn new(kind: ControlKind, seq: SeqBit, receiver_seq: SeqBit) -> Self {
        Self {
            kind,
            seq,
            checksum: crc8(&[kind.as_byte(), receiver_seq.as_byte()]),
        }
    }

    /// Acknowledge `seq`.
    pub fn ack(seq: SeqBit, receiver_seq: SeqBit) -> Self {
        Self::new(ControlKind::Ack, seq, receiver_seq)
    }

    /// Reject the frame expected at `receiver_seq`.
    pub fn nak(receiver_seq: SeqBit) -> Self {
        Self::new(ControlKind::Nak, receiver_seq, receiver_seq)
    }

    /// Check the checksum against the two values a receiver can emit.
    pub fn is_intact(&self) -> bool {
        let control = self.kind.as_byte();
        self.checksum == crc8(&[control, self.seq.as_byte()])
            || self.checksum == crc8(&[control, self.seq.complement().as_byte()])
    }

    /// Encode to delimited wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        stuffing::encode(
            &[self.kind.as_byte(), self.seq.as_byte(), self.checksum],
            &[],
        )
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Client payload.
    Data(DataFrame),
    /// ACK / NAK.
    Control(ControlFrame),
}

impl Frame {
    /// Classify an extracted frame body.
    pub fn decode(body: &[u8]) -> Result<Self, FrameError> {
        if body.len() < FRAME_METADATA_SIZE {
            return Err(FrameError::TooShort {
                expected: FRAME_METADATA_SIZE,
                actual: body.len(),
            });
        }

        let control = body[0];
        let seq = SeqBit::from_byte(body[1]).ok_or(FrameError::InvalidSequence(body[1]))?;
        let checksum = body[2];

        if control == CONTROL_DATA {
            Ok(Frame::Data(DataFrame {
                seq,
                checksum,
                payload: body[FRAME_METADATA_SIZE..].to_vec(),
            }))
        } else if control >> 4 == CONTROL_FRAME_NIBBLE {
            if body.len() != CONTROL_FRAME_SIZE {
                return Err(FrameError::ControlLength(body.len()));
            }
            Ok(Frame::Control(ControlFrame {
                kind: ControlKind::from_byte(control),
                seq,
                checksum,
            }))
        } else {
            Err(FrameError::InvalidType(control))
        }
    }

    /// Check whether the body is a control frame, judged by its first byte.
    ///
    /// Used to decide how to react to a body that failed [`Frame::decode`].
    pub fn looks_like_control(body: &[u8]) -> bool {
        body.first()
            .is_some_and(|&b| b >> 4 == CONTROL_FRAME_NIBBLE)
    }

    /// Encode to delimited wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Data(frame) => frame.encode(),
            Frame::Control(frame) => frame.encode(),
        }
    }
}
