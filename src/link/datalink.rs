//! Construction of a stop-and-wait link endpoint.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::{Client, LinkResult, Transport};

use super::config::LinkConfig;
use super::receiver::LinkReceiver;
use super::sender::LinkSender;

/// Capacity of the control-frame slot between the two halves.
const CONTROL_SLOT: usize = 1;

/// One end of a stop-and-wait link.
///
/// The two halves share only the transport and a single-slot control-frame
/// channel. Split them to run the send path and the receive path from
/// different tasks, or drive both from one task with `select!`.
#[derive(Debug)]
pub struct DataLink<T: Transport, C: Client> {
    sender: LinkSender<T>,
    receiver: LinkReceiver<T, C>,
}

impl<T: Transport, C: Client> DataLink<T, C> {
    /// Create a link endpoint over `transport`, delivering to `client`.
    pub fn new(transport: T, client: C, config: LinkConfig) -> LinkResult<Self> {
        config.validate()?;

        let transport = Arc::new(transport);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_SLOT);

        Ok(Self {
            sender: LinkSender::new(Arc::clone(&transport), control_rx, &config),
            receiver: LinkReceiver::new(transport, client, control_tx),
        })
    }

    /// Split into independently owned halves.
    pub fn into_split(self) -> (LinkSender<T>, LinkReceiver<T, C>) {
        (self.sender, self.receiver)
    }

    /// The send half.
    pub fn sender(&mut self) -> &mut LinkSender<T> {
        &mut self.sender
    }

    /// The receive half.
    pub fn receiver(&mut self) -> &mut LinkReceiver<T, C> {
        &mut self.receiver
    }
}
