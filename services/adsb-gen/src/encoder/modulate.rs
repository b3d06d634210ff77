//! Mode S frame modulation
//!
//! Frame structure (at 2 MSPS, multiplier 1):
//! - Preamble: 16 bits, each held for one chip (8µs)
//! - Data: Manchester coded, 2 chips per bit (1µs per bit)
//!
//! Higher sample rates stretch every chip to `multiplier` samples.

use super::types::{Bit, Chip, ChipSequence, MessageBits};

/// Fixed preamble pattern, pulses at 0, 1, 3.5 and 4.5µs
pub const PREAMBLE: &str = "1010000101000000";

fn preamble_bits() -> impl Iterator<Item = Bit> {
    PREAMBLE.chars().filter_map(Bit::from_char)
}

/// Hold each bit's level for `multiplier` chips
pub fn expand_preamble<I>(bits: I, multiplier: usize, out: &mut ChipSequence)
where
    I: IntoIterator<Item = Bit>,
{
    for bit in bits {
        out.push_run(Chip::from(bit), multiplier);
    }
}

/// Manchester code each bit: 1 → high then low, 0 → low then high
pub fn expand_manchester<I>(bits: I, multiplier: usize, out: &mut ChipSequence)
where
    I: IntoIterator<Item = Bit>,
{
    for bit in bits {
        let (first, second) = match bit {
            Bit::One => (Chip::High, Chip::Low),
            Bit::Zero => (Chip::Low, Chip::High),
        };
        out.push_run(first, multiplier);
        out.push_run(second, multiplier);
    }
}

/// Upper bound on samples per chip
pub const MAX_MULTIPLIER: usize = 1024;

/// Stateless preamble + payload encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSEncoder {
    multiplier: usize,
}

impl ModeSEncoder {
    pub fn new(multiplier: usize) -> Self {
        Self {
            multiplier: multiplier.clamp(1, MAX_MULTIPLIER),
        }
    }

    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    pub fn preamble_chips(&self) -> usize {
        PREAMBLE.len().saturating_mul(self.multiplier)
    }

    pub fn payload_chips(&self, payload_bits: usize) -> usize {
        payload_bits.saturating_mul(2).saturating_mul(self.multiplier)
    }

    /// Encode a full frame: preamble followed by the Manchester coded payload
    pub fn encode(&self, payload: &MessageBits) -> ChipSequence {
        let capacity = self
            .preamble_chips()
            .saturating_add(self.payload_chips(payload.len()));
        let mut chips = ChipSequence::with_capacity(capacity);
        expand_preamble(preamble_bits(), self.multiplier, &mut chips);
        expand_manchester(payload.bits().iter().copied(), self.multiplier, &mut chips);
        chips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ControlMessage;

    fn bits(s: &str) -> MessageBits {
        MessageBits::parse(&ControlMessage::new(s))
    }

    #[test]
    fn test_preamble_direct_repeat() {
        let mut out = ChipSequence::new();
        expand_preamble([Bit::One, Bit::Zero], 1, &mut out);
        assert_eq!(out.to_string(), "10");

        let mut out = ChipSequence::new();
        expand_preamble([Bit::One, Bit::Zero], 2, &mut out);
        assert_eq!(out.to_string(), "1100");
    }

    #[test]
    fn test_manchester_bits() {
        let mut out = ChipSequence::new();
        expand_manchester([Bit::One], 1, &mut out);
        assert_eq!(out.to_string(), "10");

        let mut out = ChipSequence::new();
        expand_manchester([Bit::Zero], 1, &mut out);
        assert_eq!(out.to_string(), "01");

        let mut out = ChipSequence::new();
        expand_manchester([Bit::One, Bit::Zero], 3, &mut out);
        assert_eq!(out.to_string(), "111000000111");
    }

    #[test]
    fn test_frame_layout() {
        let encoder = ModeSEncoder::new(1);
        let chips = encoder.encode(&bits("1011"));

        assert_eq!(chips.len(), 24);
        assert_eq!(chips.to_string(), format!("{}{}", PREAMBLE, "10011010"));
    }

    #[test]
    fn test_chip_counts_scale_with_multiplier() {
        // 112-bit extended squitter length
        let payload = bits(&"10".repeat(56));
        for multiplier in 1..=5 {
            let encoder = ModeSEncoder::new(multiplier);
            let chips = encoder.encode(&payload);
            assert_eq!(encoder.preamble_chips(), 16 * multiplier);
            assert_eq!(
                chips.len(),
                16 * multiplier + payload.len() * 2 * multiplier,
                "multiplier {}",
                multiplier
            );
        }
    }

    #[test]
    fn test_invalid_characters_do_not_abort_encoding() {
        let encoder = ModeSEncoder::new(1);
        let clean = encoder.encode(&bits("1011"));
        let noisy = encoder.encode(&bits("1a0b1?1"));
        assert_eq!(clean, noisy);
    }

    #[test]
    fn test_multiplier_clamped() {
        let encoder = ModeSEncoder::new(usize::MAX);
        assert_eq!(encoder.multiplier(), MAX_MULTIPLIER);
        assert_eq!(encoder.preamble_chips(), 16 * MAX_MULTIPLIER);

        let chips = encoder.encode(&bits("1"));
        assert_eq!(chips.len(), 18 * MAX_MULTIPLIER);

        assert_eq!(ModeSEncoder::new(0).multiplier(), 1);
        assert_eq!(ModeSEncoder::new(50).payload_chips(112), 11_200);
        assert_eq!(ModeSEncoder::new(1).payload_chips(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_empty_payload_is_preamble_only() {
        let encoder = ModeSEncoder::new(2);
        let chips = encoder.encode(&MessageBits::default());
        assert_eq!(chips.len(), 32);
        assert_eq!(&chips.to_string()[..4], "1100");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = ModeSEncoder::new(3);
        let payload = bits("1000110101001000010000001101011000100000001011001100001101110001");
        assert_eq!(encoder.encode(&payload), encoder.encode(&payload));
    }
}
