//! Configuration loaded from environment variables

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Nominal Mode S chip rate (0.5µs per chip)
pub const MODE_S_CHIP_RATE: u32 = 2_000_000;

pub const DEFAULT_IP_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7331;
pub const DEFAULT_SAMPLE_RATE: f64 = 2_000_000.0;
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Accepted sample rate range in Hz
pub const MIN_SAMPLE_RATE: f64 = 1_000.0;
pub const MAX_SAMPLE_RATE: f64 = 100_000_000.0;

/// Largest block a single pull may request
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be a positive number of Hz, got {0}")]
    InvalidSampleRate(f64),

    #[error("sample rate {0} Hz is outside 1 kHz..=100 MHz")]
    SampleRateOutOfRange(f64),

    #[error("block size must be at least one sample")]
    ZeroBlockSize,

    #[error("block size {0} exceeds 1048576 samples")]
    BlockSizeOutOfRange(usize),
}

/// Sample layout handed to the transmit sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Interleaved f32 I/Q with Q held at zero (float-to-complex)
    Complex,
    /// Plain f32 levels
    Real,
}

impl OutputFormat {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complex" | "fc32" | "cf32" => Some(Self::Complex),
            "real" | "f32" => Some(Self::Real),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the ingest socket binds to
    pub ip_address: String,

    /// UDP port the ingest socket binds to
    pub port: u16,

    /// Output sample rate in Hz
    pub sample_rate: f64,

    /// Samples requested per production cycle
    pub block_size: usize,

    /// Sink destination, `None` for stdout
    pub output: Option<PathBuf>,

    pub output_format: OutputFormat,

    /// Statistics logging interval in milliseconds
    pub stats_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip_address: DEFAULT_IP_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            output: None,
            output_format: OutputFormat::Complex,
            stats_interval_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            ip_address: std::env::var("ADSB_IP_ADDRESS").unwrap_or(defaults.ip_address),

            port: std::env::var("ADSB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),

            sample_rate: std::env::var("ADSB_SAMPLE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sample_rate),

            block_size: std::env::var("ADSB_BLOCK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.block_size),

            output: std::env::var("ADSB_OUTPUT")
                .ok()
                .filter(|s| !s.is_empty() && s != "-")
                .map(PathBuf::from),

            output_format: std::env::var("ADSB_OUTPUT_FORMAT")
                .ok()
                .and_then(|s| OutputFormat::parse(&s))
                .unwrap_or(defaults.output_format),

            stats_interval_ms: std::env::var("STATS_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stats_interval_ms),
        };

        if config.sample_rate.is_finite() && config.sample_rate < MODE_S_CHIP_RATE as f64 {
            warn!(
                "Sample rate {} Hz is below the {} Hz chip rate, using multiplier 1",
                config.sample_rate, MODE_S_CHIP_RATE
            );
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::SampleRateOutOfRange(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BlockSizeOutOfRange(self.block_size));
        }
        Ok(())
    }

    /// Time one block covers at the configured rate.
    ///
    /// Only meaningful on a validated config.
    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate)
            .max(Duration::from_micros(1))
    }

    /// Samples emitted per chip at the configured rate
    pub fn multiplier(&self) -> usize {
        oversampling_multiplier(self.sample_rate)
    }

    /// Bind address as `ip:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.ip_address, self.port)
    }
}

/// Oversampling multiplier for a sample rate.
///
/// Rates under the 2 MHz chip rate still emit one sample per chip.
pub fn oversampling_multiplier(sample_rate: f64) -> usize {
    let chip_rate = MODE_S_CHIP_RATE as f64;
    if sample_rate < chip_rate {
        1
    } else {
        (sample_rate / chip_rate).floor() as usize
    }
}
