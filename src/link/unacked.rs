//! Framing with a checksum but no acknowledgments.
//!
//! Damaged frames are dropped; nothing is retransmitted and there are no
//! sequence numbers. The two variants differ in where the checksum sits:
//!
//! ```text
//! parity: { [parity] [payload...] }
//! crc-7:  { [payload...] [crc] }
//! ```
//!
//! In both the checksum is taken over the payload alone and is escaped
//! like any other body byte.

use crate::core::{Client, LinkError, LinkResult, MAX_FRAME_PAYLOAD, Transport};
use crate::framing::{CrcParams, Deframer, chunk_by, encode};

/// Where the checksum byte sits inside the frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumPosition {
    /// Before the payload.
    Prefix,
    /// After the payload.
    Suffix,
}

/// Checksum instantiation plus its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnackedLayout {
    /// Checksum parameters.
    pub params: CrcParams,
    /// Placement of the checksum byte.
    pub position: ChecksumPosition,
}

impl UnackedLayout {
    /// Even parity byte ahead of the payload.
    pub const PARITY: Self = Self {
        params: CrcParams::PARITY,
        position: ChecksumPosition::Prefix,
    };

    /// CRC-7 byte after the payload.
    pub const CRC7: Self = Self {
        params: CrcParams::CRC7,
        position: ChecksumPosition::Suffix,
    };

    /// Frame one chunk.
    pub fn encode(&self, chunk: &[u8]) -> Vec<u8> {
        let check = self.params.checksum(chunk);
        match self.position {
            ChecksumPosition::Prefix => encode(&[check], chunk),
            ChecksumPosition::Suffix => encode(&[], &[chunk, &[check]].concat()),
        }
    }

    /// Split a frame body into carried checksum and payload.
    pub fn split<'a>(&self, body: &'a [u8]) -> Option<(u8, &'a [u8])> {
        let split = match self.position {
            ChecksumPosition::Prefix => body.split_first(),
            ChecksumPosition::Suffix => body.split_last(),
        };
        split.map(|(&check, payload)| (check, payload))
    }
}

/// Send half of an unacknowledged link.
#[derive(Debug)]
pub struct UnackedSender<T: Transport> {
    transport: T,
    layout: UnackedLayout,
    chunk_size: usize,
}

impl<T: Transport> UnackedSender<T> {
    /// Create a CRC-7 sender with 8-byte chunks.
    pub fn new(transport: T) -> Self {
        Self::with_layout(transport, UnackedLayout::CRC7)
    }

    /// Create a parity sender with 8-byte chunks.
    pub fn parity(transport: T) -> Self {
        Self::with_layout(transport, UnackedLayout::PARITY)
    }

    /// Create a sender for any layout.
    pub fn with_layout(transport: T, layout: UnackedLayout) -> Self {
        Self {
            transport,
            layout,
            chunk_size: MAX_FRAME_PAYLOAD,
        }
    }

    /// Use a different chunk size; must be non-zero.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> LinkResult<Self> {
        if chunk_size == 0 {
            return Err(LinkError::Config("chunk size must be non-zero".into()));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Frame and transmit `payload`, returning the number of frames sent.
    ///
    /// A trailing empty frame follows whenever the payload length is a
    /// multiple of the chunk size, the empty payload included.
    pub fn send(&self, payload: &[u8]) -> LinkResult<usize> {
        let chunks = chunk_by(payload, self.chunk_size);
        for chunk in &chunks {
            self.transport.transmit(&self.layout.encode(chunk))?;
        }
        Ok(chunks.len())
    }

    /// The layout in use.
    pub fn layout(&self) -> UnackedLayout {
        self.layout
    }
}

/// Receive half of an unacknowledged link.
#[derive(Debug)]
pub struct UnackedReceiver<C: Client> {
    client: C,
    layout: UnackedLayout,
    deframer: Deframer,
    dropped: u64,
}

impl<C: Client> UnackedReceiver<C> {
    /// Create a CRC-7 receiver.
    pub fn new(client: C) -> Self {
        Self::with_layout(client, UnackedLayout::CRC7)
    }

    /// Create a parity receiver.
    pub fn parity(client: C) -> Self {
        Self::with_layout(client, UnackedLayout::PARITY)
    }

    /// Create a receiver for any layout.
    pub fn with_layout(client: C, layout: UnackedLayout) -> Self {
        Self {
            client,
            layout,
            deframer: Deframer::new(),
            dropped: 0,
        }
    }

    /// Feed bytes and deliver every intact frame; returns how many were
    /// delivered.
    pub fn receive(&mut self, bytes: &[u8]) -> usize {
        self.deframer.extend(bytes);

        let mut delivered = 0;
        while let Some(body) = self.deframer.next_frame() {
            let Some((carried, payload)) = self.layout.split(&body) else {
                tracing::debug!("empty frame, no checksum");
                self.dropped += 1;
                continue;
            };

            let computed = self.layout.params.checksum(payload);
            if computed != carried {
                tracing::debug!(carried, computed, len = payload.len(), "checksum mismatch, dropping frame");
                self.dropped += 1;
                continue;
            }

            self.client.deliver(payload.to_vec());
            delivered += 1;
        }
        delivered
    }

    /// Frames dropped as damaged.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// The client receiving payloads.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Consume the receiver, returning the client.
    pub fn into_client(self) -> C {
        self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Wire(Mutex<Vec<u8>>);

    impl Transport for Wire {
        fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }
    }

    impl Wire {
        fn take(&self) -> Vec<u8> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[test]
    fn test_crc7_checksum_trails_payload() {
        let wire = Arc::new(Wire::default());
        let sender = UnackedSender::new(Arc::clone(&wire));

        assert_eq!(sender.send(b"ABCDEFGH").unwrap(), 2);
        // CRC-7 of "ABCDEFGH" is 1, of the empty chunk 0.
        assert_eq!(wire.take(), b"{ABCDEFGH\x01}{\x00}".to_vec());

        sender.send(b"ABC").unwrap();
        assert_eq!(wire.take(), b"{ABC\x07}".to_vec());
    }

    #[test]
    fn test_crc7_accepts_trailing_checksum_frames() {
        let mut receiver = UnackedReceiver::new(Vec::new());

        assert_eq!(receiver.receive(b"{ABC\x07}{\x00}"), 2);
        assert_eq!(receiver.client(), &vec![b"ABC".to_vec(), Vec::new()]);
        assert_eq!(receiver.dropped(), 0);
    }

    #[test]
    fn test_parity_checksum_leads_payload() {
        let wire = Arc::new(Wire::default());
        let sender = UnackedSender::parity(Arc::clone(&wire));

        // 'A' = 0x41 has two set bits, 'C' = 0x43 three.
        sender.send(b"A").unwrap();
        sender.send(b"C").unwrap();
        assert_eq!(wire.take(), b"{\x00A}{\x01C}".to_vec());

        let mut receiver = UnackedReceiver::parity(Vec::new());
        assert_eq!(receiver.receive(b"{\x00A}{\x01C}"), 2);
        assert_eq!(receiver.client(), &vec![b"A".to_vec(), b"C".to_vec()]);
    }

    #[test]
    fn test_layout_split() {
        assert_eq!(UnackedLayout::CRC7.split(b"abc\x05"), Some((5, &b"abc"[..])));
        assert_eq!(UnackedLayout::PARITY.split(b"\x01abc"), Some((1, &b"abc"[..])));
        assert_eq!(UnackedLayout::CRC7.split(b""), None);
    }

    #[test]
    fn test_escaped_checksum_byte() {
        // A trailing checksum equal to '}' is escaped with the body.
        let layout = UnackedLayout {
            params: CrcParams::CRC8,
            position: ChecksumPosition::Suffix,
        };
        // CRC-8 of "xyz" is 0x7D.
        assert_eq!(layout.encode(b"xyz"), b"{xyz\\}}".to_vec());

        let mut receiver = UnackedReceiver::with_layout(Vec::new(), layout);
        assert_eq!(receiver.receive(&layout.encode(b"xyz")), 1);
        assert_eq!(receiver.client(), &vec![b"xyz".to_vec()]);
    }

    #[test]
    fn test_roundtrip_delivers_chunks() {
        let wire = Arc::new(Wire::default());
        let sender = UnackedSender::new(Arc::clone(&wire));
        let mut receiver = UnackedReceiver::new(Vec::new());

        sender.send(b"hello, {framed} world").unwrap();
        let delivered = receiver.receive(&wire.take());

        assert_eq!(delivered, 3);
        assert_eq!(receiver.client().concat(), b"hello, {framed} world".to_vec());
        assert_eq!(receiver.dropped(), 0);
    }

    #[test]
    fn test_damaged_frame_dropped() {
        let wire = Arc::new(Wire::default());
        let sender = UnackedSender::new(Arc::clone(&wire));
        let mut receiver = UnackedReceiver::new(Vec::new());

        sender.send(b"abc").unwrap();
        let mut bytes = wire.take();
        // Flip a payload bit: "{" "a" "b" ...
        bytes[2] ^= 0x02;

        assert_eq!(receiver.receive(&bytes), 0);
        assert_eq!(receiver.dropped(), 1);
        assert!(receiver.into_client().is_empty());
    }

    #[test]
    fn test_empty_frame_dropped() {
        let mut receiver = UnackedReceiver::parity(Vec::new());
        assert_eq!(receiver.receive(b"{}{\x01C}"), 1);
        assert_eq!(receiver.dropped(), 1);
        assert_eq!(receiver.client(), &vec![b"C".to_vec()]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let sender = UnackedSender::new(Arc::new(Wire::default()));
        assert!(matches!(
            sender.with_chunk_size(0),
            Err(LinkError::Config(_))
        ));
    }
}
