//! Fault injection for testing the link over an unreliable channel.
//!
//! [`LossyTransport`] wraps another transport and decides, per transmitted
//! frame, whether to deliver it, drop it, or deliver different bytes.
//! Faults never reorder frames: the physical channel the link assumes
//! loses and damages bytes but keeps them in order.
//!
//! | Fault      | Description                                          |
//! |------------|------------------------------------------------------|
//! | Loss       | Drop a frame with probability `loss_rate`.           |
//! | Corruption | Flip one random bit with probability `corruption_rate`. |
//! | Scripted   | A closure chooses the fault for every frame.         |

use std::fmt;
use std::io;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{LinkError, LinkResult, Transport};

/// Probabilistic fault model.
///
/// Probabilities are in `[0.0, 1.0]`. The same seed replays the same
/// faults for the same sequence of frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Probability that a frame is silently dropped.
    pub loss_rate: f64,
    /// Probability that a delivered frame has one bit flipped.
    pub corruption_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corruption_rate: 0.0,
            seed: 0,
        }
    }
}

impl SimulatorConfig {
    /// Check that both rates are valid probabilities.
    pub fn validate(&self) -> LinkResult<()> {
        for (name, rate) in [
            ("loss_rate", self.loss_rate),
            ("corruption_rate", self.corruption_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(LinkError::Config(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }
}

/// What happens to one transmitted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Pass the frame through untouched.
    Deliver,
    /// Lose the frame.
    Drop,
    /// Deliver these bytes instead.
    Replace(Vec<u8>),
}

type Script = Box<dyn FnMut(&[u8]) -> Fault + Send>;

/// Seeded random loss and corruption.
///
/// Only built through [`FaultModel::random`], so the rates are always
/// valid probabilities.
#[derive(Debug, Clone)]
pub struct RandomFaults {
    config: SimulatorConfig,
    rng: StdRng,
}

impl RandomFaults {
    /// Rates and seed.
    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    fn decide(&mut self, frame: &[u8]) -> Fault {
        if self.rng.gen_bool(self.config.loss_rate) {
            return Fault::Drop;
        }
        if frame.is_empty() || !self.rng.gen_bool(self.config.corruption_rate) {
            return Fault::Deliver;
        }
        let mut damaged = frame.to_vec();
        let index = self.rng.gen_range(0..damaged.len());
        damaged[index] ^= 1 << self.rng.gen_range(0..8u32);
        Fault::Replace(damaged)
    }
}

/// Chooses a [`Fault`] for each frame.
pub enum FaultModel {
    /// Every frame arrives intact.
    Reliable,
    /// Seeded random loss and corruption.
    Random(RandomFaults),
    /// Caller-supplied decision per frame.
    Scripted(Script),
}

impl FaultModel {
    /// Random faults from a validated configuration.
    pub fn random(config: SimulatorConfig) -> LinkResult<Self> {
        config.validate()?;
        Ok(Self::Random(RandomFaults {
            config,
            rng: StdRng::seed_from_u64(config.seed),
        }))
    }

    /// Faults chosen by `script`, called with the encoded frame.
    pub fn scripted<F>(script: F) -> Self
    where
        F: FnMut(&[u8]) -> Fault + Send + 'static,
    {
        Self::Scripted(Box::new(script))
    }

    fn decide(&mut self, frame: &[u8]) -> Fault {
        match self {
            FaultModel::Reliable => Fault::Deliver,
            FaultModel::Random(faults) => faults.decide(frame),
            FaultModel::Scripted(script) => script(frame),
        }
    }
}

impl fmt::Debug for FaultModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultModel::Reliable => f.write_str("Reliable"),
            FaultModel::Random(faults) => {
                f.debug_tuple("Random").field(&faults.config).finish()
            }
            FaultModel::Scripted(_) => f.write_str("Scripted"),
        }
    }
}

/// Frame counters of a [`LossyTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    /// Frames handed to the transport.
    pub transmitted: u64,
    /// Frames lost.
    pub dropped: u64,
    /// Frames delivered with different bytes.
    pub corrupted: u64,
}

#[derive(Debug)]
struct SimulatorState {
    model: FaultModel,
    stats: SimulatorStats,
}

/// A fault-injecting wrapper around another transport.
#[derive(Debug)]
pub struct LossyTransport<T> {
    inner: T,
    state: Mutex<SimulatorState>,
}

impl<T: Transport> LossyTransport<T> {
    /// Wrap `inner` with a fault model.
    pub fn new(inner: T, model: FaultModel) -> Self {
        Self {
            inner,
            state: Mutex::new(SimulatorState {
                model,
                stats: SimulatorStats::default(),
            }),
        }
    }

    /// Wrap `inner` with seeded random faults.
    pub fn random(inner: T, config: SimulatorConfig) -> LinkResult<Self> {
        Ok(Self::new(inner, FaultModel::random(config)?))
    }

    /// Wrap `inner` with a scripted fault per frame.
    pub fn scripted<F>(inner: T, script: F) -> Self
    where
        F: FnMut(&[u8]) -> Fault + Send + 'static,
    {
        Self::new(inner, FaultModel::scripted(script))
    }

    /// Counters so far.
    pub fn stats(&self) -> SimulatorStats {
        self.state
            .lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for LossyTransport<T> {
    fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
        let fault = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "simulator state poisoned"))?;
            state.stats.transmitted += 1;
            let fault = state.model.decide(bytes);
            match fault {
                Fault::Deliver => {}
                Fault::Drop => state.stats.dropped += 1,
                Fault::Replace(_) => state.stats.corrupted += 1,
            }
            fault
        };

        match fault {
            Fault::Deliver => self.inner.transmit(bytes),
            Fault::Drop => {
                tracing::trace!(len = bytes.len(), "simulator dropped frame");
                Ok(())
            }
            Fault::Replace(damaged) => {
                tracing::trace!(len = bytes.len(), "simulator damaged frame");
                self.inner.transmit(&damaged)
            }
        }
    }
}
