//! Receive half of the stop-and-wait link.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::core::{Client, LinkResult, Transport};
use crate::framing::{ControlFrame, ControlKind, DataFrame, Deframer, Frame, SeqBit};

/// What the receive half did with one extracted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// New in-sequence payload handed to the client and acknowledged.
    Delivered,
    /// Retransmission of an already delivered frame, re-acknowledged.
    Duplicate,
    /// Damaged data frame, answered with a NAK.
    Corrupted,
    /// Control frame handed to the send half.
    Control(ControlKind),
    /// Frame dropped without a reply.
    Discarded,
}

/// Receive-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Frames extracted from the byte stream.
    pub frames_received: u64,
    /// Payloads delivered to the client.
    pub delivered: u64,
    /// Duplicate data frames.
    pub duplicates: u64,
    /// Damaged data frames.
    pub corrupted: u64,
    /// ACKs transmitted.
    pub acks_sent: u64,
    /// NAKs transmitted.
    pub naks_sent: u64,
    /// Control frames passed to the send half.
    pub control_forwarded: u64,
    /// Control frames dropped: malformed, slot occupied, or sender gone.
    pub control_dropped: u64,
}

/// The receive half of a link.
///
/// Owns the receive accumulator, `receiverSeq` and the client. Runs inline
/// in whatever task feeds it bytes; one frame is processed completely,
/// including any ACK or NAK it causes, before the next is scanned.
pub struct LinkReceiver<T: Transport, C: Client> {
    transport: Arc<T>,
    client: C,
    control_tx: mpsc::Sender<ControlFrame>,
    deframer: Deframer,
    expected: SeqBit,
    stats: ReceiverStats,
}

impl<T: Transport, C: Client> LinkReceiver<T, C> {
    pub(crate) fn new(transport: Arc<T>, client: C, control_tx: mpsc::Sender<ControlFrame>) -> Self {
        Self {
            transport,
            client,
            control_tx,
            deframer: Deframer::new(),
            expected: SeqBit::Zero,
            stats: ReceiverStats::default(),
        }
    }

    /// Feed bytes from the transport and process every complete frame.
    ///
    /// Returns one outcome per extracted frame. If transmitting an ACK or
    /// NAK fails, only the error is returned: the outcomes of frames
    /// already handled in this call are lost, but their effects stand
    /// (deliveries, the sequence bit, [`stats`](Self::stats)). Frames not
    /// yet processed stay buffered for the next call.
    pub fn receive(&mut self, bytes: &[u8]) -> LinkResult<Vec<ReceiveOutcome>> {
        self.deframer.extend(bytes);

        let mut outcomes = Vec::new();
        while let Some(body) = self.deframer.next_frame() {
            outcomes.push(self.handle_frame(&body)?);
        }
        Ok(outcomes)
    }

    /// Process one extracted frame body.
    pub fn handle_frame(&mut self, body: &[u8]) -> LinkResult<ReceiveOutcome> {
        self.stats.frames_received += 1;

        match Frame::decode(body) {
            Ok(Frame::Control(frame)) => Ok(self.forward_control(frame)),
            Ok(Frame::Data(frame)) => self.accept_data(frame),
            Err(err) if Frame::looks_like_control(body) => {
                tracing::debug!(%err, "dropping malformed control frame");
                self.stats.control_dropped += 1;
                Ok(ReceiveOutcome::Discarded)
            }
            Err(err) => {
                tracing::debug!(%err, "malformed data frame");
                self.stats.corrupted += 1;
                self.send_nak()?;
                Ok(ReceiveOutcome::Corrupted)
            }
        }
    }

    fn forward_control(&mut self, frame: ControlFrame) -> ReceiveOutcome {
        match self.control_tx.try_send(frame) {
            Ok(()) => {
                self.stats.control_forwarded += 1;
                ReceiveOutcome::Control(frame.kind)
            }
            Err(TrySendError::Full(frame)) => {
                tracing::warn!(kind = ?frame.kind, seq = %frame.seq, "control slot occupied, dropping frame");
                self.stats.control_dropped += 1;
                ReceiveOutcome::Discarded
            }
            Err(TrySendError::Closed(frame)) => {
                tracing::debug!(kind = ?frame.kind, "send half gone, dropping control frame");
                self.stats.control_dropped += 1;
                ReceiveOutcome::Discarded
            }
        }
    }

    fn accept_data(&mut self, frame: DataFrame) -> LinkResult<ReceiveOutcome> {
        if !frame.is_intact() {
            tracing::debug!(seq = %frame.seq, "checksum mismatch");
            self.stats.corrupted += 1;
            self.send_nak()?;
            return Ok(ReceiveOutcome::Corrupted);
        }

        if frame.seq != self.expected {
            tracing::debug!(seq = %frame.seq, "duplicate frame, re-acknowledging");
            self.stats.duplicates += 1;
            self.send_control(ControlFrame::ack(self.expected.complement(), self.expected))?;
            return Ok(ReceiveOutcome::Duplicate);
        }

        tracing::debug!(seq = %frame.seq, len = frame.payload.len(), "delivering payload");
        self.client.deliver(frame.payload);
        self.stats.delivered += 1;

        let ack = ControlFrame::ack(self.expected, self.expected);
        self.expected.toggle();
        self.send_control(ack)?;
        Ok(ReceiveOutcome::Delivered)
    }

    fn send_nak(&mut self) -> LinkResult<()> {
        self.send_control(ControlFrame::nak(self.expected))
    }

    fn send_control(&mut self, frame: ControlFrame) -> LinkResult<()> {
        self.transport.transmit(&frame.encode())?;
        match frame.kind {
            ControlKind::Ack => self.stats.acks_sent += 1,
            _ => self.stats.naks_sent += 1,
        }
        Ok(())
    }

    /// Sequence number the next new data frame must carry.
    pub fn expected_seq(&self) -> SeqBit {
        self.expected
    }

    /// Bytes buffered without a complete frame yet.
    pub fn buffered(&self) -> usize {
        self.deframer.buffered()
    }

    /// The client receiving payloads.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access to the client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Consume the receive half, returning the client.
    pub fn into_client(self) -> C {
        self.client
    }

    /// The transport ACKs and NAKs go out on.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Counters.
    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }
}

impl<T: Transport, C: Client> std::fmt::Debug for LinkReceiver<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkReceiver")
            .field("expected", &self.expected)
            .field("buffered", &self.deframer.buffered())
            .field("stats", &self.stats)
            .finish()
    }
}
