//! Transports the link can run over.
//!
//! - [`ChannelTransport`]: one tokio channel message per transmitted frame
//! - [`stream`]: run a link over any `AsyncRead` / `AsyncWrite` pair
//! - [`LossyTransport`]: fault injection (seeded loss and bit flips, or a
//!   scripted fault per frame)
//! - [`loopback`]: two endpoints wired back to back through lossy channels

mod channel;
pub mod loopback;
mod simulator;
pub mod stream;

pub use channel::ChannelTransport;
pub use loopback::{LossyChannel, Wire};
pub use simulator::{
    Fault, FaultModel, LossyTransport, RandomFaults, SimulatorConfig, SimulatorStats,
};
