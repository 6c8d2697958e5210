//! Send half of the stop-and-wait link.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::{LinkError, LinkResult, Transport};
use crate::framing::{ControlFrame, ControlKind, DataFrame, SendQueue, SeqBit};

use super::config::LinkConfig;
use super::retransmit::RetransmitController;

/// Sender state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing outstanding.
    Idle,
    /// A data frame with this sequence number is on the wire, unacknowledged.
    AwaitingAck(SeqBit),
}

/// Send-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Data frames transmitted, retransmissions included.
    pub frames_sent: u64,
    /// Retransmissions.
    pub retransmits: u64,
    /// Chunks acknowledged by the peer.
    pub chunks_acked: u64,
    /// NAKs, reserved control frames and mismatched ACKs received.
    pub rejections: u64,
    /// Control frames that failed their checksum.
    pub garbled_control: u64,
    /// Timer expiries.
    pub timeouts: u64,
    /// Leftover control frames discarded before a new chunk.
    pub stale_discarded: u64,
}

/// The send half of a link.
///
/// Owns the send queue and `senderSeq`. Control frames arrive from the
/// paired [`LinkReceiver`](super::LinkReceiver) through a single-slot
/// channel.
pub struct LinkSender<T: Transport> {
    transport: Arc<T>,
    control_rx: mpsc::Receiver<ControlFrame>,
    queue: SendQueue,
    seq: SeqBit,
    state: SenderState,
    retransmit: RetransmitController,
    stats: SenderStats,
}

impl<T: Transport> LinkSender<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        control_rx: mpsc::Receiver<ControlFrame>,
        config: &LinkConfig,
    ) -> Self {
        Self {
            transport,
            control_rx,
            queue: SendQueue::new(config.chunk_size),
            seq: SeqBit::Zero,
            state: SenderState::Idle,
            retransmit: RetransmitController::new(config),
            stats: SenderStats::default(),
        }
    }

    /// Queue `payload` and send it, one acknowledged chunk at a time.
    ///
    /// Resolves once every queued chunk has been acknowledged. An empty
    /// payload with nothing queued transmits nothing. On error the
    /// unacknowledged bytes stay queued and [`flush`](Self::flush) resumes
    /// from the same chunk.
    pub async fn send(&mut self, payload: &[u8]) -> LinkResult<()> {
        self.queue.push(payload);
        self.flush().await
    }

    /// Send whatever is still queued.
    pub async fn flush(&mut self) -> LinkResult<()> {
        while let Some(chunk) = self.queue.peek_chunk() {
            if let Err(err) = self.send_chunk(chunk).await {
                self.state = SenderState::Idle;
                return Err(err);
            }
            self.queue.pop_chunk();
            self.seq.toggle();
            self.state = SenderState::Idle;
        }
        Ok(())
    }

    async fn send_chunk(&mut self, chunk: Vec<u8>) -> LinkResult<()> {
        self.discard_stale_control();
        self.retransmit.on_ack();

        let wire = DataFrame::new(self.seq, chunk).encode();
        self.transmit(&wire)?;
        self.state = SenderState::AwaitingAck(self.seq);

        loop {
            match self.next_control().await? {
                Some(frame) if !frame.is_intact() => {
                    tracing::debug!(seq = %self.seq, "garbled control frame");
                    self.stats.garbled_control += 1;
                }
                Some(frame) if frame.kind == ControlKind::Ack && frame.seq == self.seq => {
                    tracing::debug!(seq = %self.seq, "chunk acknowledged");
                    self.stats.chunks_acked += 1;
                    return Ok(());
                }
                Some(frame) => {
                    tracing::debug!(
                        seq = %self.seq,
                        kind = ?frame.kind,
                        control_seq = %frame.seq,
                        "chunk rejected"
                    );
                    self.stats.rejections += 1;
                }
                None => {
                    tracing::debug!(seq = %self.seq, timeout = ?self.retransmit.timeout(), "ack timeout");
                    self.stats.timeouts += 1;
                    self.retransmit.on_timeout();
                }
            }

            if !self.retransmit.should_retransmit() {
                let attempts = self.retransmit.attempts();
                tracing::warn!(seq = %self.seq, attempts, "giving up on chunk");
                return Err(LinkError::MaxRetransmitsExceeded { attempts });
            }

            self.retransmit.on_retransmit();
            self.stats.retransmits += 1;
            tracing::debug!(
                seq = %self.seq,
                retransmit = self.retransmit.retransmit_count(),
                "retransmitting"
            );
            self.transmit(&wire)?;
        }
    }

    /// Wait for the next control frame; `None` on timeout.
    async fn next_control(&mut self) -> LinkResult<Option<ControlFrame>> {
        let received = match self.retransmit.timeout() {
            Some(rto) => match tokio::time::timeout(rto, self.control_rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
            None => self.control_rx.recv().await,
        };
        received.map(Some).ok_or(LinkError::Closed)
    }

    fn discard_stale_control(&mut self) {
        while let Ok(frame) = self.control_rx.try_recv() {
            tracing::debug!(kind = ?frame.kind, seq = %frame.seq, "discarding stale control frame");
            self.stats.stale_discarded += 1;
        }
    }

    fn transmit(&mut self, wire: &[u8]) -> LinkResult<()> {
        self.transport.transmit(wire)?;
        self.stats.frames_sent += 1;
        Ok(())
    }

    /// Sequence number of the next (or outstanding) chunk.
    pub fn seq(&self) -> SeqBit {
        self.seq
    }

    /// Current state.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Bytes accepted but not yet acknowledged.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Counters.
    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    /// The transport this half writes to.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T: Transport> std::fmt::Debug for LinkSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSender")
            .field("seq", &self.seq)
            .field("state", &self.state)
            .field("pending", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}
