//! framelink loopback demo
//!
//! Sends a message from endpoint A to endpoint B across a simulated lossy
//! wire and prints what B received.
//!
//! Environment variables:
//! - FRAMELINK_MESSAGE: text to send (default: a short greeting)
//! - FRAMELINK_LOSS_RATE: probability a frame is lost, each direction (default 0.2)
//! - FRAMELINK_SEED: simulator seed (default 1)
//! - FRAMELINK_RTO_MS, FRAMELINK_MAX_RTO_MS, FRAMELINK_MAX_RETRANSMITS,
//!   FRAMELINK_CHUNK_SIZE: link configuration
//! - FRAMELINK_LOG: tracing filter (default: info)

use std::process::ExitCode;
use std::str::FromStr;

use framelink::LinkConfig;
use framelink::transport::{FaultModel, SimulatorConfig, loopback};
use tracing_subscriber::EnvFilter;

const DEFAULT_MESSAGE: &str = "Hello over a {lossy} link!";

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let message = std::env::var("FRAMELINK_MESSAGE").unwrap_or_else(|_| DEFAULT_MESSAGE.into());
    let loss_rate: f64 = env_or("FRAMELINK_LOSS_RATE", 0.2)?;
    let seed: u64 = env_or("FRAMELINK_SEED", 1)?;
    let config = LinkConfig::from_env()?;

    tracing::info!(?config, loss_rate, seed, "starting loopback");

    let simulator = |seed| {
        FaultModel::random(SimulatorConfig {
            loss_rate,
            corruption_rate: 0.0,
            seed,
        })
    };
    let (mut a, _b, mut wire) = loopback::connect(
        config,
        simulator(seed)?,
        simulator(seed.wrapping_add(1))?,
        Vec::new(),
        Vec::new(),
    )?;

    let started = tokio::time::Instant::now();
    wire.drive(a.send(message.as_bytes())).await??;
    let elapsed = started.elapsed();

    let received = wire.b().client().concat();
    println!("sent:     {message}");
    println!("received: {}", String::from_utf8_lossy(&received));

    let sender = a.stats();
    let receiver = wire.b().stats();
    let lost = a.transport().stats().dropped + wire.b().transport().stats().dropped;
    println!(
        "chunks acked: {}, retransmits: {}, timeouts: {}, duplicates: {}, frames lost: {}, elapsed: {:?}",
        sender.chunks_acked, sender.retransmits, sender.timeouts, receiver.duplicates, lost, elapsed
    );

    if received != message.as_bytes() {
        return Err("payload mismatch".into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = std::env::var("FRAMELINK_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_str(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("loopback failed: {err}");
            ExitCode::FAILURE
        }
    }
}
