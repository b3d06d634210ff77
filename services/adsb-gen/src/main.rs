//! ADS-B Gen - Mode S baseband generator
//!
//! Receives '0'/'1' bit strings over UDP, encodes each into a preamble plus
//! Manchester payload, and streams rate-paced baseband samples to a sink.

mod buffer;
mod config;
mod encoder;
mod ingest;
mod producer;
mod sink;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::Config;
use ingest::SocketIngest;
use producer::SampleProducer;
use sink::SampleSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, stdout may carry samples)
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("===========================================");
    info!("   ADS-B Gen - Mode S baseband generator");
    info!("===========================================");

    // Load configuration
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    let block_period = config.block_period();

    info!("Configuration:");
    info!("  Bind address: {}", config.bind_addr());
    info!("  Sample rate: {} Hz", config.sample_rate);
    info!("  Block size: {} samples ({:?} per block)", config.block_size, block_period);
    info!("  Output format: {:?}", config.output_format);

    // Bind failure is fatal
    let ingest = SocketIngest::bind(&config.ip_address, config.port)
        .with_context(|| format!("Failed to bind ingest socket to {}", config.bind_addr()))?;
    let mut producer = SampleProducer::new(ingest, config.multiplier());
    info!("Producer ready at {} samples/chip", producer.multiplier());

    let mut sink = SampleSink::start(config.output.as_deref(), config.output_format)
        .context("Failed to start sample sink")?;

    info!("===========================================");
    if let Ok(addr) = producer.source().local_addr() {
        info!("  Listening for bit strings on udp://{}", addr);
    }
    info!("  Press Ctrl+C to stop.");
    info!("===========================================");

    let mut ticker = tokio::time::interval(block_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let stats_interval = Duration::from_millis(config.stats_interval_ms.max(1));
    let mut last_stats = Instant::now();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let block = producer.produce(config.block_size);
                sink.submit(block);
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
        }

        if !sink.is_running() {
            warn!("Sample sink stopped unexpectedly");
            break;
        }

        if last_stats.elapsed() >= stats_interval {
            let stats = producer.stats();
            info!(
                "[Gen Stats] Messages: {} (dropped {}) | Chips queued: {} | Backlog: {} (peak {}) | Signal/Idle: {}/{} | Underruns: {} | Invalid chars: {} | Dropped blocks: {}",
                stats.messages_enqueued,
                stats.messages_dropped,
                stats.chips_enqueued,
                producer.backlog_len(),
                stats.peak_backlog,
                stats.signal_samples,
                stats.idle_samples,
                stats.underruns,
                stats.invalid_chars,
                sink.stats().blocks_dropped.load(Ordering::Relaxed)
            );
            last_stats = Instant::now();
        }
    }

    // Cleanup
    let discarded = producer.discard_backlog();
    if discarded > 0 {
        warn!("Discarding {} pending chips", discarded);
    }
    sink.stop();

    let stats = producer.stats();
    info!(
        "Shutdown complete. Cycles={}, Messages={}, Samples={}",
        stats.cycles, stats.messages_enqueued, stats.samples_produced
    );
    Ok(())
}
