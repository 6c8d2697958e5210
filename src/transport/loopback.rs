//! Two link endpoints wired back to back in one task.
//!
//! Each direction is a [`ChannelTransport`] wrapped in a [`LossyTransport`].
//! Both receive halves live in a [`Wire`], which pumps the channels while a
//! send future runs:
//!
//! ```ignore
//! let (mut a, mut b, mut wire) = loopback::connect(
//!     LinkConfig::default(),
//!     FaultModel::Reliable,
//!     FaultModel::Reliable,
//!     Vec::new(),
//!     Vec::new(),
//! )?;
//! wire.drive(a.send(b"ping")).await??;
//! assert_eq!(wire.b().client().concat(), b"ping");
//! ```

use std::future::Future;

use tokio::sync::mpsc;

use crate::core::{Client, LinkResult};
use crate::link::{DataLink, LinkConfig, LinkReceiver, LinkSender};

use super::channel::ChannelTransport;
use super::simulator::{FaultModel, LossyTransport};

/// Transport of a loopback endpoint.
pub type LossyChannel = LossyTransport<ChannelTransport>;

/// The two receive halves of a loopback link and the channels feeding them.
#[derive(Debug)]
pub struct Wire<CA: Client, CB: Client> {
    a: LinkReceiver<LossyChannel, CA>,
    b: LinkReceiver<LossyChannel, CB>,
    to_a: mpsc::UnboundedReceiver<Vec<u8>>,
    to_b: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Build endpoints A and B joined through fault models.
///
/// `a_to_b` applies to everything A transmits (its data frames and the
/// ACK/NAKs for B's data), `b_to_a` to everything B transmits.
pub fn connect<CA: Client, CB: Client>(
    config: LinkConfig,
    a_to_b: FaultModel,
    b_to_a: FaultModel,
    client_a: CA,
    client_b: CB,
) -> LinkResult<(LinkSender<LossyChannel>, LinkSender<LossyChannel>, Wire<CA, CB>)> {
    let (a_out, to_b) = ChannelTransport::pair();
    let (b_out, to_a) = ChannelTransport::pair();

    let (a_sender, a_receiver) =
        DataLink::new(LossyTransport::new(a_out, a_to_b), client_a, config.clone())?.into_split();
    let (b_sender, b_receiver) =
        DataLink::new(LossyTransport::new(b_out, b_to_a), client_b, config)?.into_split();

    let wire = Wire {
        a: a_receiver,
        b: b_receiver,
        to_a,
        to_b,
    };
    Ok((a_sender, b_sender, wire))
}

impl<CA: Client, CB: Client> Wire<CA, CB> {
    /// Run `fut` to completion while delivering bytes in both directions.
    ///
    /// Pending bytes are always delivered before `fut` is polled again, so
    /// a run is deterministic for a given fault script. Leftover frames
    /// are processed before returning.
    pub async fn drive<F: Future>(&mut self, fut: F) -> LinkResult<F::Output> {
        tokio::pin!(fut);
        let output = loop {
            tokio::select! {
                biased;
                Some(bytes) = self.to_b.recv() => {
                    self.b.receive(&bytes)?;
                }
                Some(bytes) = self.to_a.recv() => {
                    self.a.receive(&bytes)?;
                }
                output = &mut fut => break output,
            }
        };
        self.settle()?;
        Ok(output)
    }

    /// Process every frame already on the wire.
    pub fn settle(&mut self) -> LinkResult<()> {
        loop {
            let mut progressed = false;
            while let Ok(bytes) = self.to_b.try_recv() {
                self.b.receive(&bytes)?;
                progressed = true;
            }
            while let Ok(bytes) = self.to_a.try_recv() {
                self.a.receive(&bytes)?;
                progressed = true;
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    /// Receive half of endpoint A.
    pub fn a(&self) -> &LinkReceiver<LossyChannel, CA> {
        &self.a
    }

    /// Receive half of endpoint B.
    pub fn b(&self) -> &LinkReceiver<LossyChannel, CB> {
        &self.b
    }

    /// Consume the wire, returning both clients.
    pub fn into_clients(self) -> (CA, CB) {
        (self.a.into_client(), self.b.into_client())
    }
}
