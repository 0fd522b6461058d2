//! Resume scan over an existing container
//!
//! Appending to a container means finding where the previous writer sealed
//! it. The scan walks steering blocks from the start of the file, checks
//! each FZ signature, skips the fast blocks each steering block announces,
//! and stops at the first end-of-run block. That block and everything after
//! it are overwritten by the resumed writer.
//!
//! Scanning only reads; seeking to [`ResumePoint::resume_offset`] is left
//! to the caller.

use crate::block::{BLOCK_BYTES, BLOCK_HEADER_WORDS, BlockHeader};
use crate::error::{Result, WriterError};
use binrw::BinRead;
use std::io::{self, Cursor, Read};
use tracing::debug;

/// Where and how to continue an existing container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    /// Sequence number of the last data steering block, `None` if the
    /// container holds no data block
    pub last_sequence: Option<u32>,
    /// Byte offset of the end-of-run block
    pub resume_offset: u64,
    /// Number of blocks before the end-of-run block
    pub blocks_scanned: u64,
}

impl ResumePoint {
    /// Sequence number the next steering block must carry
    pub fn next_sequence(&self) -> u32 {
        self.last_sequence.map_or(0, |seq| seq.wrapping_add(1))
    }
}

/// Scan a container from its first block
pub fn scan<R: Read>(mut reader: R) -> Result<ResumePoint> {
    let mut block = vec![0u8; BLOCK_BYTES];
    let mut blocks: u64 = 0;
    let mut last_sequence = None;

    loop {
        if !read_block(&mut reader, &mut block)? {
            return Err(WriterError::MissingEndOfRun { blocks });
        }

        let header = parse_header(&block)?;
        if !header.has_signature() {
            return Err(WriterError::BadSignature {
                block: blocks,
                found: header.signature,
            });
        }

        if header.is_end_of_run() {
            debug!("End-of-run marker at block {}", blocks);
            return Ok(ResumePoint {
                last_sequence,
                resume_offset: blocks * BLOCK_BYTES as u64,
                blocks_scanned: blocks,
            });
        }

        last_sequence = Some(header.sequence);
        blocks += 1;

        if header.fast_blocks > 0 {
            debug!(
                "Block {} announces {} fast blocks",
                blocks - 1,
                header.fast_blocks
            );
        }
        for _ in 0..header.fast_blocks {
            if !read_block(&mut reader, &mut block)? {
                return Err(WriterError::TruncatedFastRun { block: blocks });
            }
            blocks += 1;
        }
    }
}

fn parse_header(block: &[u8]) -> Result<BlockHeader> {
    let mut cursor = Cursor::new(&block[..BLOCK_HEADER_WORDS * 4]);
    BlockHeader::read_be(&mut cursor).map_err(|e| match e {
        binrw::Error::Io(source) => WriterError::io("decoding block header", source),
        other => WriterError::io("decoding block header", io::Error::other(other.to_string())),
    })
}

/// Fill `block` completely; `Ok(false)` on a short or empty read
fn read_block<R: Read>(reader: &mut R, block: &mut [u8]) -> Result<bool> {
    match reader.read_exact(block) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(WriterError::io("reading existing container", e)),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block::{BLOCK_WORDS, FZ_SIGNATURE};
    use crate::io::encode_words;

    fn steering(sequence: u32, fast: u32) -> Vec<u8> {
        let mut words = vec![0u32; BLOCK_WORDS];
        let header = BlockHeader {
            fast_blocks: fast,
            ..BlockHeader::steering(sequence, 0)
        };
        words[..BLOCK_HEADER_WORDS].copy_from_slice(&header.to_words());
        encode_words(&words)
    }

    fn end_of_run() -> Vec<u8> {
        let mut words = vec![0u32; BLOCK_WORDS];
        words[..BLOCK_HEADER_WORDS].copy_from_slice(&BlockHeader::end_of_run().to_words());
        encode_words(&words)
    }

    fn raw() -> Vec<u8> {
        vec![0x55; BLOCK_BYTES]
    }

    #[test]
    fn test_scan_finds_end_of_run() {
        let data = [steering(0, 0), steering(1, 2), raw(), raw(), steering(2, 0), end_of_run(), end_of_run()]
            .concat();
        let point = scan(Cursor::new(data)).unwrap();
        assert_eq!(point.last_sequence, Some(2));
        assert_eq!(point.next_sequence(), 3);
        assert_eq!(point.blocks_scanned, 5);
        assert_eq!(point.resume_offset, 5 * BLOCK_BYTES as u64);
    }

    #[test]
    fn test_marker_first_resumes_at_zero() {
        let point = scan(Cursor::new(end_of_run())).unwrap();
        assert_eq!(point.last_sequence, None);
        assert_eq!(point.next_sequence(), 0);
        assert_eq!(point.resume_offset, 0);
    }

    #[test]
    fn test_missing_marker() {
        let data = [steering(0, 0), steering(1, 0)].concat();
        assert!(matches!(
            scan(Cursor::new(data)),
            Err(WriterError::MissingEndOfRun { blocks: 2 })
        ));
        assert!(matches!(
            scan(Cursor::new(Vec::new())),
            Err(WriterError::MissingEndOfRun { blocks: 0 })
        ));
    }

    #[test]
    fn test_partial_block_counts_as_missing_marker() {
        let mut data = steering(0, 0);
        data.extend_from_slice(&end_of_run()[..100]);
        assert!(matches!(
            scan(Cursor::new(data)),
            Err(WriterError::MissingEndOfRun { blocks: 1 })
        ));
    }

    #[test]
    fn test_truncated_fast_run() {
        let data = [steering(0, 3), raw()].concat();
        assert!(matches!(
            scan(Cursor::new(data)),
            Err(WriterError::TruncatedFastRun { block: 2 })
        ));
    }

    #[test]
    fn test_bad_signature() {
        let data = [steering(0, 0), raw(), end_of_run()].concat();
        match scan(Cursor::new(data)) {
            Err(WriterError::BadSignature { block, found }) => {
                assert_eq!(block, 1);
                assert_ne!(found, FZ_SIGNATURE);
                assert_eq!(found[0], 0x5555_5555);
            }
            other => panic!("expected bad signature, got {other:?}"),
        }
    }
}
