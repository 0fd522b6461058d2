//! Physical block layout
//!
//! A ZDAB container is a sequence of fixed-size physical blocks of
//! [`BLOCK_WORDS`] big-endian 32-bit words. Steering blocks start with an
//! 8-word [`BlockHeader`]; fast blocks carry raw continuation words and no
//! header at all.
//!
//! ```text
//! steering block
//! +-----------+--------+-----+--------------+-------+
//! | FZ sig x4 | format | seq | first record | nfast |  logical records...
//! +-----------+--------+-----+--------------+-------+
//! ```
//!
//! Logical records start with `[length, type]`. Data records carry a pilot
//! segment, an optional MAST bank and one payload bank.

pub mod buffer;
pub mod header;

pub use buffer::BlockBuffer;
pub use header::{BlockHeader, FZ_SIGNATURE};

/// Words per physical block
pub const BLOCK_WORDS: usize = 3840;

/// Bytes per physical block
pub const BLOCK_BYTES: usize = BLOCK_WORDS * 4;

/// Words in a steering block header
pub const BLOCK_HEADER_WORDS: usize = 8;

/// Payload words a steering block can hold after its header
pub const STEERING_CAPACITY: usize = BLOCK_WORDS - BLOCK_HEADER_WORDS;

/// Index of the fast block count in a steering block header
pub const FAST_COUNT_WORD: usize = 7;

/// Format word marking the end-of-run steering blocks
pub const END_OF_RUN_FORMAT: u32 = 0x4000_0f00;

/// Words in a logical record header
pub const LOGICAL_HEADER_WORDS: usize = 2;

/// Words in a pilot segment without relocation table
pub const PILOT_WORDS: usize = 10;

/// Words in a relocation table
pub const RELOCATION_WORDS: usize = 2;

/// Words in a fixed bank header
pub const BANK_HEADER_WORDS: usize = 9;

/// Base ZEBRA link address
pub const BASE_LINK: u32 = 301;

/// Address of the supporting bank (up-link)
pub const SUPPORT_BANK_LINK: u32 = 327;

/// Logical record types
pub mod record_type {
    /// End of run or end of container
    pub const RUN_CONTROL: u32 = 1;
    /// Pilot plus bank material
    pub const DATA: u32 = 2;
    /// Padding to the end of a block
    pub const PADDING: u32 = 5;
}

/// End-of-run logical record
pub const END_OF_RUN_RECORD: [u32; 3] = [1, record_type::RUN_CONTROL, 0];

/// End-of-container logical record
pub const END_OF_CONTAINER_RECORD: [u32; 6] = [4, record_type::RUN_CONTROL, 0xffff_ffff, 0, 0, 73];

/// Pilot segment of a data record
///
/// Carries the ZEBRA pilot signature and version, the size of the bank
/// material that follows and, for MAST'd banks, a two-entry relocation
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pilot {
    words: [u32; PILOT_WORDS + RELOCATION_WORDS],
}

impl Pilot {
    /// Pilot signature word
    pub const SIGNATURE: u32 = 0x4640_e400;
    /// ZEBRA version
    pub const VERSION: u32 = 37700;

    /// Pilot for a bank written without a supporting bank
    pub fn plain(material_words: usize) -> Self {
        let mut words = [0u32; PILOT_WORDS + RELOCATION_WORDS];
        words[0] = Self::SIGNATURE;
        words[1] = Self::VERSION;
        words[7] = material_words as u32;
        words[10] = BASE_LINK;
        Self { words }
    }

    /// Pilot for a bank preceded by a MAST bank
    ///
    /// `material_words` covers both banks; the second relocation entry
    /// points just past the payload bank.
    pub fn relocated(material_words: usize) -> Self {
        let mut pilot = Self::plain(material_words);
        pilot.words[6] = RELOCATION_WORDS as u32;
        pilot.words[8] = SUPPORT_BANK_LINK;
        pilot.words[11] = BASE_LINK + material_words as u32;
        pilot
    }

    /// Number of words this pilot occupies in the record
    pub fn word_count(&self) -> usize {
        PILOT_WORDS + self.words[6] as usize
    }

    /// Words as written
    pub fn as_words(&self) -> &[u32] {
        &self.words[..self.word_count()]
    }
}
