//! Sample producer - one pull cycle per call
//!
//! Each cycle polls the message source once, encodes and queues any message,
//! then fills the requested block from the backlog. Whatever the backlog
//! cannot cover stays at the idle level.

use tracing::{debug, trace, warn};

use crate::buffer::StreamBuffer;
use crate::encoder::{MessageBits, ModeSEncoder};
use crate::ingest::MessageSource;

/// Output level when no signal is pending
pub const IDLE_LEVEL: f32 = 0.0;

/// Producer counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProducerStats {
    pub cycles: u64,
    pub messages_received: u64,
    pub messages_enqueued: u64,
    /// Messages with no '0'/'1' characters at all
    pub messages_dropped: u64,
    pub invalid_chars: u64,
    pub chips_enqueued: u64,
    pub samples_produced: u64,
    pub signal_samples: u64,
    pub idle_samples: u64,
    /// Cycles where the backlog ran dry part way through the block
    pub underruns: u64,
    pub peak_backlog: usize,
}

/// Owns the message source, the encoder and the backlog
pub struct SampleProducer<S: MessageSource> {
    source: S,
    encoder: ModeSEncoder,
    backlog: StreamBuffer,
    stats: ProducerStats,
}

impl<S: MessageSource> SampleProducer<S> {
    pub fn new(source: S, multiplier: usize) -> Self {
        Self {
            source,
            encoder: ModeSEncoder::new(multiplier),
            backlog: StreamBuffer::new(),
            stats: ProducerStats::default(),
        }
    }

    /// Produce exactly `requested` samples
    pub fn produce(&mut self, requested: usize) -> Vec<f32> {
        let mut out = vec![IDLE_LEVEL; requested];
        self.produce_into(&mut out);
        out
    }

    /// Fill `out` completely, signal first and idle level after
    pub fn produce_into(&mut self, out: &mut [f32]) {
        out.fill(IDLE_LEVEL);
        self.stats.cycles += 1;

        if let Some(message) = self.source.try_receive() {
            self.stats.messages_received += 1;
            self.enqueue(&MessageBits::parse(&message));
        }

        let chips = self.backlog.drain(out.len());
        let filled = chips.len();
        for (slot, level) in out.iter_mut().zip(chips.levels()) {
            *slot = level;
        }

        if filled > 0 && filled < out.len() {
            self.stats.underruns += 1;
            trace!("Backlog ran dry after {} of {} samples", filled, out.len());
        }

        self.stats.samples_produced += out.len() as u64;
        self.stats.signal_samples += filled as u64;
        self.stats.idle_samples += (out.len() - filled) as u64;
    }

    fn enqueue(&mut self, payload: &MessageBits) {
        self.stats.invalid_chars += payload.skipped() as u64;

        // Same policy as an empty datagram: no bits, no frame
        if payload.is_empty() {
            warn!("Dropping message with no valid bits ({} skipped)", payload.skipped());
            self.stats.messages_dropped += 1;
            return;
        }

        let chips = self.encoder.encode(payload);
        let chip_count = chips.len();
        self.backlog.append(chips);

        self.stats.messages_enqueued += 1;
        self.stats.chips_enqueued += chip_count as u64;
        self.stats.peak_backlog = self.stats.peak_backlog.max(self.backlog.len());

        debug!(
            ">>> FRAME: {} bits | {} chips | backlog={} | *{};",
            payload.len(),
            chip_count,
            self.backlog.len(),
            payload.to_hex()
        );
    }

    /// Chips still waiting to be emitted
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Drop pending chips, returning how many were discarded
    pub fn discard_backlog(&mut self) -> usize {
        let pending = self.backlog.len();
        self.backlog.clear();
        pending
    }

    pub fn multiplier(&self) -> usize {
        self.encoder.multiplier()
    }

    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
