//! Pending chip backlog between the encoder and the sample output

use std::collections::VecDeque;

use crate::encoder::{Chip, ChipSequence};

/// FIFO of chips waiting to be emitted.
///
/// Unbounded: nothing here limits growth when messages arrive faster than
/// the output drains them. Watch `len()` to observe the backlog.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    chips: VecDeque<Chip>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add chips at the tail, order preserved
    pub fn append(&mut self, chips: ChipSequence) {
        self.chips.extend(chips);
    }

    /// Remove up to `n` chips from the head
    pub fn drain(&mut self, n: usize) -> ChipSequence {
        let take = n.min(self.chips.len());
        ChipSequence::from(self.chips.drain(..take).collect::<Vec<_>>())
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    pub fn clear(&mut self) {
        self.chips.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(pattern: &str) -> ChipSequence {
        pattern
            .chars()
            .map(|c| if c == '1' { Chip::High } else { Chip::Low })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_drain_preserves_order_across_appends() {
        let mut buffer = StreamBuffer::new();
        buffer.append(seq("110"));
        buffer.append(seq("01"));

        assert_eq!(buffer.drain(2).to_string(), "11");
        assert_eq!(buffer.drain(10).to_string(), "001");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_exact_length_empties() {
        let mut buffer = StreamBuffer::new();
        buffer.append(seq("1010"));

        let len = buffer.len();
        assert_eq!(buffer.drain(len).len(), 4);
        assert_eq!(buffer.len(), 0);
        assert!(buffer.drain(1).is_empty());
        assert!(buffer.drain(100).is_empty());
    }

    #[test]
    fn test_drain_empty_buffer() {
        let mut buffer = StreamBuffer::new();
        assert!(buffer.drain(0).is_empty());
        assert!(buffer.drain(16).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = StreamBuffer::new();
        buffer.append(seq("1111"));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
