//! Steering block header
//!
//! The first 8 words of every steering block, big-endian on disk.

use super::{BLOCK_HEADER_WORDS, BLOCK_WORDS, END_OF_RUN_FORMAT};
use binrw::{BinRead, BinWrite};

/// FZ physical record signature
pub const FZ_SIGNATURE: [u32; 4] = [0x0123_cdef, 0x8070_8070, 0x4321_abcd, 0x8061_8061];

/// Steering block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct BlockHeader {
    /// FZ signature, must equal [`FZ_SIGNATURE`]
    pub signature: [u32; 4],
    /// Physical record length and flags
    pub format: u32,
    /// Block sequence number
    pub sequence: u32,
    /// Word offset of the first logical record that starts in this block
    pub first_record: u32,
    /// Number of fast blocks following this block
    pub fast_blocks: u32,
}

impl BlockHeader {
    /// Header of a data steering block
    ///
    /// `continuation` is the number of words at the start of the block that
    /// still belong to a record begun in an earlier block.
    pub fn steering(sequence: u32, continuation: usize) -> Self {
        Self {
            signature: FZ_SIGNATURE,
            format: BLOCK_WORDS as u32,
            sequence,
            first_record: (BLOCK_HEADER_WORDS + continuation) as u32,
            fast_blocks: 0,
        }
    }

    /// Header of an end-of-run or end-of-container block
    pub fn end_of_run() -> Self {
        Self {
            signature: FZ_SIGNATURE,
            format: END_OF_RUN_FORMAT,
            sequence: 0,
            first_record: BLOCK_HEADER_WORDS as u32,
            fast_blocks: 0,
        }
    }

    /// Decode a header from the first words of a block
    pub fn from_words(words: &[u32; BLOCK_HEADER_WORDS]) -> Self {
        Self {
            signature: [words[0], words[1], words[2], words[3]],
            format: words[4],
            sequence: words[5],
            first_record: words[6],
            fast_blocks: words[7],
        }
    }

    /// Header as native words
    pub fn to_words(&self) -> [u32; BLOCK_HEADER_WORDS] {
        let [s0, s1, s2, s3] = self.signature;
        [
            s0,
            s1,
            s2,
            s3,
            self.format,
            self.sequence,
            self.first_record,
            self.fast_blocks,
        ]
    }

    /// Whether the signature matches the FZ signature
    pub fn has_signature(&self) -> bool {
        self.signature == FZ_SIGNATURE
    }

    /// Whether this header marks the end of a run
    pub fn is_end_of_run(&self) -> bool {
        self.format == END_OF_RUN_FORMAT
    }
}
