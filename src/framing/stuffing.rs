//! Byte-stuffing framer.
//!
//! Wire layout of every frame:
//!
//! ```text
//! +-------+----------------------------------------+-------+
//! |   {   |  escaped metadata ++ escaped payload   |   }   |
//! +-------+----------------------------------------+-------+
//! ```
//!
//! Any literal `{`, `}` or `\` inside the frame body is preceded by `\`.
//! Extraction works on a receive accumulator that grows as bytes arrive and
//! only ever shrinks by a proven-complete frame or a proven-damaged prefix.

use std::collections::VecDeque;

use crate::core::{END_DELIMITER, ESCAPE_BYTE, START_DELIMITER};

/// Check whether `byte` must be escaped inside a frame body.
pub fn needs_escape(byte: u8) -> bool {
    byte == START_DELIMITER || byte == END_DELIMITER || byte == ESCAPE_BYTE
}

/// Frame `metadata` followed by `payload` into one delimited, escaped frame.
pub fn encode(metadata: &[u8], payload: &[u8]) -> Vec<u8> {
    // Worst case every byte is escaped.
    let mut frame = Vec::with_capacity(2 + 2 * (metadata.len() + payload.len()));
    frame.push(START_DELIMITER);
    for &byte in metadata.iter().chain(payload) {
        if needs_escape(byte) {
            frame.push(ESCAPE_BYTE);
        }
        frame.push(byte);
    }
    frame.push(END_DELIMITER);
    frame
}

/// Try to extract one complete frame from the front of `accumulator`.
///
/// Returns the unescaped frame body (metadata and payload, undivided), or
/// `None` when no complete frame is buffered yet. Bytes before the first
/// start delimiter are discarded, as is everything before a second
/// unescaped start delimiter. An incomplete frame (including one whose last
/// buffered byte is a lone escape) is left in place, so calling again
/// without new bytes returns `None` again.
pub fn try_extract_frame(accumulator: &mut VecDeque<u8>) -> Option<Vec<u8>> {
    match accumulator.iter().position(|&b| b == START_DELIMITER) {
        Some(0) => {}
        Some(start) => {
            tracing::trace!(discarded = start, "dropping bytes before start delimiter");
            accumulator.drain(..start);
        }
        None => {
            if !accumulator.is_empty() {
                tracing::trace!(
                    discarded = accumulator.len(),
                    "no start delimiter, dropping buffer"
                );
            }
            accumulator.clear();
            return None;
        }
    }

    let mut body = Vec::new();
    let mut cursor = 1;
    while cursor < accumulator.len() {
        match accumulator[cursor] {
            ESCAPE_BYTE => {
                // Lone trailing escape: wait for the byte it protects.
                let literal = *accumulator.get(cursor + 1)?;
                body.push(literal);
                cursor += 2;
            }
            END_DELIMITER => {
                accumulator.drain(..=cursor);
                return Some(body);
            }
            START_DELIMITER => {
                tracing::trace!(discarded = cursor, "restart mid-frame, dropping damaged frame");
                accumulator.drain(..cursor);
                body.clear();
                cursor = 1;
            }
            byte => {
                body.push(byte);
                cursor += 1;
            }
        }
    }

    None
}

/// Receive accumulator plus incremental frame extraction.
#[derive(Debug, Default, Clone)]
pub struct Deframer {
    buffer: VecDeque<u8>,
}

impl Deframer {
    /// Create an empty deframer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame body, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        try_extract_frame(&mut self.buffer)
    }

    /// Number of raw bytes still buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn accumulator(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    #[test]
    fn test_encode_plain() {
        assert_eq!(encode(&[0, 1, 0x48], b"A"), b"{\x00\x01\x48A}".to_vec());
        assert_eq!(encode(&[], &[]), b"{}".to_vec());
    }

    #[test]
    fn test_encode_escapes_delimiters() {
        let frame = encode(b"{", b"a}b\\");
        assert_eq!(hex::encode(&frame), hex::encode(b"{\\{a\\}b\\\\}"));
    }

    #[test]
    fn test_extract_complete_frame() {
        let mut acc = accumulator(b"{abc}");
        assert_eq!(try_extract_frame(&mut acc), Some(b"abc".to_vec()));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_extract_discards_junk_prefix() {
        let mut acc = accumulator(b"junk{ok}");
        assert_eq!(try_extract_frame(&mut acc), Some(b"ok".to_vec()));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_extract_junk_without_start_is_dropped() {
        let mut acc = accumulator(b"garbage}");
        assert_eq!(try_extract_frame(&mut acc), None);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_extract_incomplete_is_preserved() {
        let mut acc = accumulator(b"{abc");
        assert_eq!(try_extract_frame(&mut acc), None);
        assert_eq!(acc, accumulator(b"{abc"));

        // Idempotent without new bytes.
        assert_eq!(try_extract_frame(&mut acc), None);
        assert_eq!(acc, accumulator(b"{abc"));
    }

    #[test]
    fn test_extract_trailing_escape_is_incomplete() {
        let mut acc = accumulator(b"{ab\\");
        assert_eq!(try_extract_frame(&mut acc), None);
        assert_eq!(acc, accumulator(b"{ab\\"));

        acc.extend(b"}}".iter().copied());
        assert_eq!(try_extract_frame(&mut acc), Some(b"ab}".to_vec()));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_extract_restarts_on_second_start() {
        let mut acc = accumulator(b"{dam{good}");
        assert_eq!(try_extract_frame(&mut acc), Some(b"good".to_vec()));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_extract_escaped_start_is_literal() {
        let mut acc = accumulator(b"{a\\{b}");
        assert_eq!(try_extract_frame(&mut acc), Some(b"a{b".to_vec()));
    }

    #[test]
    fn test_extract_leaves_following_bytes() {
        let mut acc = accumulator(b"{one}{tw");
        assert_eq!(try_extract_frame(&mut acc), Some(b"one".to_vec()));
        assert_eq!(acc, accumulator(b"{tw"));
        assert_eq!(try_extract_frame(&mut acc), None);
    }

    #[test]
    fn test_deframer_byte_at_a_time() {
        let frame = encode(&[0x00, 0x01, 0x7B], b"}\\{x");
        let mut deframer = Deframer::new();
        let mut frames = Vec::new();
        for &byte in &frame {
            deframer.extend(&[byte]);
            while let Some(body) = deframer.next_frame() {
                frames.push(body);
            }
        }
        assert_eq!(frames, vec![b"\x00\x01\x7B}\\{x".to_vec()]);
        assert_eq!(deframer.buffered(), 0);
    }

    #[test]
    fn test_deframer_clear() {
        let mut deframer = Deframer::new();
        deframer.extend(b"{partial");
        assert_eq!(deframer.buffered(), 8);
        deframer.clear();
        assert_eq!(deframer.buffered(), 0);
    }

    proptest! {
        #[test]
        fn prop_encode_extract_roundtrip(
            metadata in proptest::collection::vec(any::<u8>(), 0..4),
            payload in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut acc: VecDeque<u8> = encode(&metadata, &payload).into_iter().collect();
            let body = try_extract_frame(&mut acc).unwrap();
            prop_assert_eq!(&body[..metadata.len()], &metadata[..]);
            prop_assert_eq!(&body[metadata.len()..], &payload[..]);
            prop_assert!(acc.is_empty());
        }

        #[test]
        fn prop_junk_prefix_recovery(
            junk in proptest::collection::vec(any::<u8>().prop_filter("no delimiters", |b| !needs_escape(*b)), 0..16),
            payload in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut acc: VecDeque<u8> = junk.iter().copied().collect();
            acc.extend(encode(&[], &payload));
            prop_assert_eq!(try_extract_frame(&mut acc), Some(payload));
            prop_assert!(acc.is_empty());
        }
    }
}
