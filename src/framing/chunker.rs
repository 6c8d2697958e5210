//! Payload chunking and the sender's queue.

use std::collections::VecDeque;

use crate::core::MAX_FRAME_PAYLOAD;

/// Split `payload` into frame-sized chunks of [`MAX_FRAME_PAYLOAD`] bytes.
///
/// The last chunk holds `payload.len() % 8` bytes. When that is zero,
/// including for the empty payload, a trailing empty chunk is still
/// produced, so the receiver always sees a short frame last.
pub fn chunk(payload: &[u8]) -> Vec<&[u8]> {
    chunk_by(payload, MAX_FRAME_PAYLOAD)
}

/// Split `payload` into chunks of `size` bytes with the same trailing rule
/// as [`chunk`].
///
/// A `size` of 0 is treated as 1.
pub fn chunk_by(payload: &[u8], size: usize) -> Vec<&[u8]> {
    let size = size.max(1);
    let mut chunks: Vec<&[u8]> = payload.chunks(size).collect();
    if payload.len() % size == 0 {
        chunks.push(&payload[payload.len()..]);
    }
    chunks
}

/// Bytes accepted from the client but not yet acknowledged by the peer.
///
/// Drained one chunk at a time. A chunk is only removed once the caller
/// pops it after an acknowledgment, so an interrupted send resumes from the
/// same bytes. Unlike [`chunk`], the queue never yields an empty chunk.
#[derive(Debug, Clone)]
pub struct SendQueue {
    bytes: VecDeque<u8>,
    chunk_size: usize,
}

impl Default for SendQueue {
    fn default() -> Self {
        Self::new(MAX_FRAME_PAYLOAD)
    }
}

impl SendQueue {
    /// Create an empty queue emitting chunks of at most `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            bytes: VecDeque::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Append client bytes.
    pub fn push(&mut self, payload: &[u8]) {
        self.bytes.extend(payload);
    }

    /// Copy of the next chunk, if any bytes are queued.
    pub fn peek_chunk(&self) -> Option<Vec<u8>> {
        if self.bytes.is_empty() {
            return None;
        }
        let take = self.bytes.len().min(self.chunk_size);
        Some(self.bytes.iter().take(take).copied().collect())
    }

    /// Remove and return the next chunk.
    pub fn pop_chunk(&mut self) -> Option<Vec<u8>> {
        if self.bytes.is_empty() {
            return None;
        }
        let take = self.bytes.len().min(self.chunk_size);
        Some(self.bytes.drain(..take).collect())
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Maximum chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Drop every queued byte.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_lengths() {
        let lens = |n: usize| -> Vec<usize> {
            let payload = vec![0xAA; n];
            chunk(&payload).iter().map(|c| c.len()).collect()
        };

        assert_eq!(lens(0), vec![0]);
        assert_eq!(lens(3), vec![3]);
        assert_eq!(lens(8), vec![8, 0]);
        assert_eq!(lens(13), vec![8, 5]);
        assert_eq!(lens(16), vec![8, 8, 0]);
    }

    #[test]
    fn test_chunk_by_custom_size() {
        let chunks = chunk_by(b"abcdefg", 3);
        assert_eq!(chunks, vec![&b"abc"[..], b"def", b"g"]);

        let chunks = chunk_by(b"abc", 0);
        assert_eq!(chunks, vec![&b"a"[..], b"b", b"c", b""]);
    }

    #[test]
    fn test_send_queue_drains_in_chunks() {
        let mut queue = SendQueue::default();
        queue.push(b"0123456789");
        assert_eq!(queue.len(), 10);

        assert_eq!(queue.peek_chunk().unwrap(), b"01234567");
        // Peeking does not consume.
        assert_eq!(queue.len(), 10);

        assert_eq!(queue.pop_chunk().unwrap(), b"01234567");
        assert_eq!(queue.pop_chunk().unwrap(), b"89");
        assert!(queue.pop_chunk().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_send_queue_exact_multiple_has_no_empty_chunk() {
        let mut queue = SendQueue::new(8);
        queue.push(b"ABCDEFGH");
        assert_eq!(queue.pop_chunk().unwrap(), b"ABCDEFGH");
        assert_eq!(queue.peek_chunk(), None);
    }

    #[test]
    fn test_send_queue_clear() {
        let mut queue = SendQueue::new(4);
        queue.push(b"abc");
        queue.push(b"def");
        assert_eq!(queue.peek_chunk().unwrap(), b"abcd");
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.chunk_size(), 4);
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_payload(payload in proptest::collection::vec(any::<u8>(), 0..100)) {
            let chunks = chunk(&payload);
            prop_assert_eq!(chunks.concat(), payload.clone());
            prop_assert_eq!(chunks.len(), payload.len() / 8 + 1);
            let (last, full) = chunks.split_last().unwrap();
            prop_assert!(full.iter().all(|c| c.len() == 8));
            prop_assert_eq!(last.len(), payload.len() % 8);
        }

        #[test]
        fn prop_send_queue_reconstructs_payload(
            payload in proptest::collection::vec(any::<u8>(), 0..100),
            size in 1usize..=8,
        ) {
            let mut queue = SendQueue::new(size);
            queue.push(&payload);
            let mut out = Vec::new();
            while let Some(chunk) = queue.pop_chunk() {
                prop_assert!(!chunk.is_empty() && chunk.len() <= size);
                out.extend(chunk);
            }
            prop_assert_eq!(out, payload);
        }
    }
}
