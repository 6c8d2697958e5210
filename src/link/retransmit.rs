//! Retransmission timer and retry accounting for one outstanding chunk.

use std::time::Duration;

use super::config::LinkConfig;

/// Tracks retransmissions of the chunk currently awaiting acknowledgment.
///
/// The timeout backs off exponentially on every expiry, capped at
/// `max_retransmit_timeout`, and resets once the chunk is acknowledged.
/// NAK-triggered retransmissions count toward the limit but do not back
/// off.
#[derive(Debug, Clone)]
pub struct RetransmitController {
    /// Retransmissions of the current chunk.
    retransmit_count: u32,
    /// Current timeout (after backoff).
    current_timeout: Option<Duration>,
    /// Timeout a fresh chunk starts with.
    base_rto: Option<Duration>,
    max_rto: Duration,
    backoff: u32,
    limit: Option<u32>,
}

impl RetransmitController {
    /// Create a controller from link configuration.
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            retransmit_count: 0,
            current_timeout: config.retransmit_timeout,
            base_rto: config.retransmit_timeout,
            max_rto: config.max_retransmit_timeout,
            backoff: config.backoff_multiplier,
            limit: config.max_retransmits,
        }
    }

    /// How long to wait for the next control frame; `None` waits forever.
    pub fn timeout(&self) -> Option<Duration> {
        self.current_timeout
    }

    /// Record a timer expiry.
    pub fn on_timeout(&mut self) {
        self.current_timeout = self
            .current_timeout
            .map(|rto| rto.saturating_mul(self.backoff).min(self.max_rto));
    }

    /// Check whether another retransmission is allowed.
    pub fn should_retransmit(&self) -> bool {
        !self.is_failed()
    }

    /// Record that we're retransmitting.
    pub fn on_retransmit(&mut self) {
        self.retransmit_count += 1;
    }

    /// Reset for a fresh chunk.
    pub fn on_ack(&mut self) {
        self.retransmit_count = 0;
        self.current_timeout = self.base_rto;
    }

    /// Retransmissions of the current chunk so far.
    pub fn retransmit_count(&self) -> u32 {
        self.retransmit_count
    }

    /// Transmissions of the current chunk, the first one included.
    pub fn attempts(&self) -> u32 {
        self.retransmit_count + 1
    }

    /// Check if the retransmission limit has been reached.
    pub fn is_failed(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.retransmit_count >= limit)
    }
}
