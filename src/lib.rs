//! # framelink
//!
//! A data-link layer for unreliable, order-preserving byte channels.
//!
//! - **Framing**: `{`/`}` delimited frames with `\` byte stuffing
//! - **Error detection**: bit-serial CRC-8 (also CRC-7 and parity)
//! - **Reliability**: stop-and-wait ARQ with ACK/NAK control frames and
//!   alternating sequence numbers
//!
//! ## Feature Flags
//!
//! - `link` (default): ARQ engine and the unacknowledged link (tokio)
//! - `transport` (default): channel and stream adapters, fault simulator,
//!   loopback harness (tokio, rand)
//!
//! ## Modules
//!
//! - [`core`]: Capability traits, constants, and error types (always included)
//! - [`framing`]: Checksums, byte stuffing, chunking, frame model (always included)
//! - [`link`]: Stop-and-wait link (requires `link` feature)
//! - [`transport`]: Transports and test harness (requires `transport` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use framelink::prelude::*;
//!
//! let frame = DataFrame::new(SeqBit::Zero, b"hi".to_vec()).encode();
//!
//! let mut deframer = Deframer::new();
//! deframer.extend(b"noise");
//! deframer.extend(&frame);
//!
//! let body = deframer.next_frame().unwrap();
//! match Frame::decode(&body).unwrap() {
//!     Frame::Data(data) => {
//!         assert!(data.is_intact());
//!         assert_eq!(data.payload, b"hi");
//!     }
//!     Frame::Control(_) => unreachable!(),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Framing (always included)
pub mod framing;

// Stop-and-wait link (feature-gated)
#[cfg(feature = "link")]
#[cfg_attr(docsrs, doc(cfg(feature = "link")))]
pub mod link;

// Transports (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{Client, FrameError, LinkError, LinkResult, Transport};
    pub use crate::framing::{
        ControlFrame, ControlKind, CrcParams, DataFrame, Deframer, Frame, SeqBit,
    };

    #[cfg(feature = "link")]
    pub use crate::link::{
        DataLink, LinkConfig, LinkReceiver, LinkSender, ReceiveOutcome, UnackedReceiver,
        UnackedSender,
    };

    #[cfg(feature = "transport")]
    pub use crate::transport::{
        ChannelTransport, Fault, FaultModel, LossyTransport, SimulatorConfig,
    };
}

// Re-export commonly used items at crate root
pub use crate::core::{Client, FrameError, LinkError, LinkResult, Transport};

#[cfg(feature = "link")]
pub use crate::link::{DataLink, LinkConfig};
