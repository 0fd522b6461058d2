//! PMT event record sizing
//!
//! The primary `ZDAB` bank holds one PMT event record whose length is not
//! stored anywhere explicitly. It is derived from the hit count and the
//! chain of sub-fields that follows the hits:
//!
//! ```text
//! word 0..3   record info, run, event, DAQ status and hit count
//!             (word 3: status in the upper half, hit count in the lower)
//! word 4      first sub-field header (CalPckType)
//! word 5..10  MTC trigger card data
//! 3 words per hit
//! sub-fields, each starting with a header word
//! ```
//!
//! Each sub-field header carries its length in words and a flag telling
//! whether another sub-field follows. The chain starts at word 4, whose
//! length is the offset to the first real sub-field.

use crate::error::{Result, WriterError};

/// Words in the fixed event record header
pub const EVENT_HEADER_WORDS: usize = 11;

/// Words per PMT hit
pub const HIT_WORDS: usize = 3;

/// Word holding the hit count
pub const HIT_COUNT_WORD: usize = 3;

/// Word holding the first sub-field header
pub const FIRST_SUB_HEADER_WORD: usize = 4;

/// Set in a sub-field header when another sub-field follows
pub const SUB_NOT_LAST: u32 = 0x0040_0000;

/// Length bits of a sub-field header
pub const SUB_LENGTH_MASK: u32 = 0x0003_ffff;

/// Hit count bits of the hit count word; the upper half is DAQ status
pub const HIT_COUNT_MASK: u32 = 0x0000_ffff;

/// Number of PMT hits recorded in an event record
pub fn hit_count(record: &[u32]) -> Option<usize> {
    record
        .get(HIT_COUNT_WORD)
        .map(|&word| (word & HIT_COUNT_MASK) as usize)
}

/// Total size of an event record in words
///
/// The record must contain at least the fixed header and every sub-field
/// header the chain visits.
pub fn event_record_words(record: &[u32]) -> Result<usize> {
    if record.len() < EVENT_HEADER_WORDS {
        return Err(WriterError::invalid_event_record(format!(
            "{} words is shorter than the {EVENT_HEADER_WORDS}-word header",
            record.len()
        )));
    }

    let hits = hit_count(record).unwrap_or_default();
    let mut size = EVENT_HEADER_WORDS + hits * HIT_WORDS;

    let mut header = FIRST_SUB_HEADER_WORD;
    while record[header] & SUB_NOT_LAST != 0 {
        let step = (record[header] & SUB_LENGTH_MASK) as usize;
        if step == 0 {
            return Err(WriterError::invalid_event_record(format!(
                "zero-length sub-field at word {header} is not last"
            )));
        }
        header += step;
        let Some(&next) = record.get(header) else {
            return Err(WriterError::invalid_event_record(format!(
                "sub-field chain reaches word {header} of {}",
                record.len()
            )));
        };
        size += (next & SUB_LENGTH_MASK) as usize;
    }

    Ok(size)
}
