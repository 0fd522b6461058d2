//! Fixed-capacity block buffer
//!
//! Holds exactly one physical block of native-order words. Two cursors
//! track it: `fill` is the next free word, `durable` is how many leading
//! words have already been transferred to the file by an interim flush.

use super::{BLOCK_WORDS, record_type};

/// One physical block under construction
pub struct BlockBuffer {
    words: Box<[u32; BLOCK_WORDS]>,
    fill: usize,
    durable: usize,
}

impl Default for BlockBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockBuffer {
    /// Create an empty, zeroed buffer
    pub fn new() -> Self {
        Self {
            words: Box::new([0; BLOCK_WORDS]),
            fill: 0,
            durable: 0,
        }
    }

    /// Next free word
    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Number of leading words already transferred
    pub fn durable(&self) -> usize {
        self.durable
    }

    /// Free words left in the block
    pub fn remaining(&self) -> usize {
        BLOCK_WORDS - self.fill
    }

    /// Whether no word can be added
    pub fn is_full(&self) -> bool {
        self.fill == BLOCK_WORDS
    }

    /// Append words
    pub fn push(&mut self, words: &[u32]) {
        debug_assert!(
            words.len() <= self.remaining(),
            "block overflow: {} words into {} free",
            words.len(),
            self.remaining()
        );
        self.words[self.fill..self.fill + words.len()].copy_from_slice(words);
        self.fill += words.len();
    }

    /// Append one word
    pub fn push_word(&mut self, word: u32) {
        debug_assert!(!self.is_full(), "block overflow");
        self.words[self.fill] = word;
        self.fill += 1;
    }

    /// Overwrite an already filled word
    pub fn set_word(&mut self, index: usize, word: u32) {
        debug_assert!(index < self.fill, "word {index} not filled yet");
        self.words[index] = word;
    }

    /// Word at `index`
    pub fn word(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Complete the block with a padding record
    ///
    /// Two or more free words get `[len, 5, 0...]`; a single free word gets
    /// a lone zero.
    pub fn pad(&mut self) {
        match self.remaining() {
            0 => {}
            1 => self.words[self.fill] = 0,
            remaining => {
                self.words[self.fill] = (remaining - 1) as u32;
                self.words[self.fill + 1] = record_type::PADDING;
                self.words[self.fill + 2..].fill(0);
            }
        }
        self.fill = BLOCK_WORDS;
    }

    /// Filled words not yet transferred
    pub fn pending(&self) -> &[u32] {
        &self.words[self.durable.min(self.fill)..self.fill]
    }

    /// Record that everything filled so far has been transferred
    pub fn mark_durable(&mut self) {
        self.durable = self.fill;
    }

    /// The part of the whole block an interim flush has not transferred
    pub fn undurable_tail(&self) -> &[u32] {
        &self.words[self.durable.min(BLOCK_WORDS)..]
    }

    /// Reset both cursors for the next block
    pub fn clear(&mut self) {
        self.fill = 0;
        self.durable = 0;
    }
}
