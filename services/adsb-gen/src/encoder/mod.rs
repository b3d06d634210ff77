//! Bit string to baseband chip encoding
//!
//! 1. Parse the control message into bits (invalid characters skipped)
//! 2. Hold each preamble bit for `multiplier` samples
//! 3. Manchester code the payload, `2 × multiplier` samples per bit

mod modulate;
mod types;

pub use modulate::{ModeSEncoder, PREAMBLE};
pub use types::{Chip, ChipSequence, ControlMessage, MessageBits};
