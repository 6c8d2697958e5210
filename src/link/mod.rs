//! Stop-and-wait ARQ over a byte transport.
//!
//! A [`DataLink`] endpoint splits into a [`LinkSender`] and a
//! [`LinkReceiver`]:
//!
//! ```text
//!   client payload                               client
//!        │                                         ▲
//!   ┌────▼──────┐   control slot (cap 1)   ┌───────┴─────┐
//!   │LinkSender │◄─────────────────────────│LinkReceiver │
//!   └────┬──────┘                          └───────▲─────┘
//!        │ data frames          bytes, data + ACK/NAK │
//!        ▼                                          │
//!   ─────────────────────── transport ──────────────┴────
//! ```
//!
//! The sender transmits one chunk and waits for the matching ACK,
//! retransmitting on NAK, on a mismatched or garbled control frame, and on
//! timeout. The receiver delivers each in-sequence chunk exactly once and
//! answers every data frame with an ACK or NAK.
//!
//! The [`unacked`] module provides the same framing with a checksum only.

mod config;
mod datalink;
mod receiver;
mod retransmit;
mod sender;
pub mod unacked;

pub use config::{LinkConfig, LinkConfigBuilder};
pub use datalink::DataLink;
pub use receiver::{LinkReceiver, ReceiveOutcome, ReceiverStats};
pub use retransmit::RetransmitController;
pub use sender::{LinkSender, SenderState, SenderStats};
pub use unacked::{ChecksumPosition, UnackedLayout, UnackedReceiver, UnackedSender};
