//! Message, bit and chip types

use tracing::warn;

/// Raw control message as received from one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    text: String,
}

impl ControlMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One logical bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            _ => None,
        }
    }
}

/// One physical sample slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Chip {
    Low = 0,
    High = 1,
}

impl Chip {
    /// Baseband level for this chip
    #[inline(always)]
    pub fn level(self) -> f32 {
        match self {
            Self::Low => 0.0,
            Self::High => 1.0,
        }
    }
}

impl From<Bit> for Chip {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => Self::Low,
            Bit::One => Self::High,
        }
    }
}

/// Payload bits of a control message, invalid characters removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBits {
    bits: Vec<Bit>,
    skipped: usize,
}

impl MessageBits {
    /// Parse a message, skipping (and warning about) anything that is not '0' or '1'
    pub fn parse(message: &ControlMessage) -> Self {
        let mut bits = Vec::with_capacity(message.len());
        let mut skipped = 0;

        for (pos, c) in message.as_str().chars().enumerate() {
            match Bit::from_char(c) {
                Some(bit) => bits.push(bit),
                None => {
                    warn!("Skipping invalid character {:?} at position {}", c, pos);
                    skipped += 1;
                }
            }
        }

        Self { bits, skipped }
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of characters dropped while parsing
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Hex rendering, MSB first, last byte zero-padded (like dump1090 output)
    pub fn to_hex(&self) -> String {
        let mut bytes = vec![0u8; self.bits.len().div_ceil(8)];
        for (bit_idx, bit) in self.bits.iter().enumerate() {
            if *bit == Bit::One {
                bytes[bit_idx / 8] |= 1 << (7 - (bit_idx % 8));
            }
        }
        hex::encode_upper(bytes)
    }
}

/// Ordered run of chips produced by the encoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipSequence {
    chips: Vec<Chip>,
}

impl ChipSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chips: Vec::with_capacity(capacity),
        }
    }

    /// Append `count` copies of one chip
    pub fn push_run(&mut self, chip: Chip, count: usize) {
        self.chips.extend(std::iter::repeat(chip).take(count));
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Baseband levels in order
    pub fn levels(&self) -> impl Iterator<Item = f32> + '_ {
        self.chips.iter().map(|c| c.level())
    }
}

impl From<Vec<Chip>> for ChipSequence {
    fn from(chips: Vec<Chip>) -> Self {
        Self { chips }
    }
}

impl IntoIterator for ChipSequence {
    type Item = Chip;
    type IntoIter = std::vec::IntoIter<Chip>;

    fn into_iter(self) -> Self::IntoIter {
        self.chips.into_iter()
    }
}

impl std::fmt::Display for ChipSequence {
    /// Chips as a '0'/'1' string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chip in &self.chips {
            let c = match chip {
                Chip::Low => '0',
                Chip::High => '1',
            };
            std::fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}
