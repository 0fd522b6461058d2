//! Shared helpers for container tests
//!
//! Holds an in-memory output file with fault injection and a minimal
//! container reader that is just enough to check what the writer produced.

#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::cell::RefCell;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use zdab_format::block::{
    BANK_HEADER_WORDS, BLOCK_BYTES, BLOCK_HEADER_WORDS, BLOCK_WORDS, BlockHeader, PILOT_WORDS,
    record_type,
};
use zdab_format::event::{EVENT_HEADER_WORDS, FIRST_SUB_HEADER_WORD, HIT_COUNT_WORD, SUB_NOT_LAST};
use zdab_format::io::decode_words;
use zdab_format::{BankKind, ContainerFile};

#[derive(Default)]
struct FaultState {
    /// Bytes that may be written before writes start failing
    budget: Option<usize>,
    written: usize,
    write_calls: usize,
    fail_sync: bool,
}

/// In-memory container file whose contents stay reachable after the writer
/// dropped it
#[derive(Clone, Default)]
pub struct SharedFile {
    data: Rc<RefCell<Cursor<Vec<u8>>>>,
    faults: Rc<RefCell<FaultState>>,
}

impl SharedFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: Vec<u8>) -> Self {
        let file = Self::default();
        *file.data.borrow_mut() = Cursor::new(bytes);
        file
    }

    /// Fail every write once `bytes` bytes have been written
    pub fn fail_after(self, bytes: usize) -> Self {
        self.faults.borrow_mut().budget = Some(bytes);
        self
    }

    /// Fail every sync
    pub fn fail_sync(self) -> Self {
        self.faults.borrow_mut().fail_sync = true;
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.data.borrow().get_ref().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.faults.borrow().write_calls
    }
}

impl Read for SharedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.borrow_mut().read(buf)
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut faults = self.faults.borrow_mut();
        faults.write_calls += 1;
        if let Some(budget) = faults.budget
            && faults.written + buf.len() > budget
        {
            return Err(io::Error::other("injected write failure"));
        }
        let n = self.data.borrow_mut().write(buf)?;
        faults.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.borrow_mut().seek(pos)
    }
}

impl ContainerFile for SharedFile {
    fn sync(&mut self) -> io::Result<()> {
        if self.faults.borrow().fail_sync {
            return Err(io::Error::other("injected sync failure"));
        }
        Ok(())
    }
}

/// PMT event record with `hits` hits and an optional trailing sub-field of
/// `tail` words
pub fn event_record(hits: usize, tail: usize) -> Vec<u32> {
    let body = EVENT_HEADER_WORDS + hits * 3;
    let mut words: Vec<u32> = (0..body as u32).map(|i| 0x1000_0000 | i).collect();
    words[HIT_COUNT_WORD] = (0x0042 << 16) | hits as u32;
    if tail == 0 {
        words[FIRST_SUB_HEADER_WORD] = 0x0200_0000;
    } else {
        words[FIRST_SUB_HEADER_WORD] = SUB_NOT_LAST | (body - FIRST_SUB_HEADER_WORD) as u32;
        words.push(tail as u32);
        words.extend((1..tail as u32).map(|i| 0x2000_0000 | i));
    }
    words
}

/// Fixed-size bank payload filled with a recognizable pattern
pub fn bank_payload(kind: BankKind, seed: u32) -> Vec<u32> {
    let words = kind.definition().words;
    (0..words).map(|i| seed.wrapping_mul(0x0101_0101) ^ i).collect()
}

/// Physical blocks of a container as native words
pub fn blocks(bytes: &[u8]) -> Vec<Vec<u32>> {
    assert_eq!(bytes.len() % BLOCK_BYTES, 0, "partial block at end of file");
    bytes.chunks(BLOCK_BYTES).map(decode_words).collect()
}

pub fn header(block: &[u32]) -> BlockHeader {
    let mut words = [0u32; BLOCK_HEADER_WORDS];
    words.copy_from_slice(&block[..BLOCK_HEADER_WORDS]);
    BlockHeader::from_words(&words)
}

/// A logical record: its type and the words after `[length, type]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: u32,
    pub words: Vec<u32>,
}

struct Partial {
    kind: u32,
    needed: usize,
    words: Vec<u32>,
}

impl Partial {
    /// Take words until complete, returns how many were consumed
    fn feed(&mut self, words: &[u32]) -> usize {
        let take = (self.needed - self.words.len()).min(words.len());
        self.words.extend_from_slice(&words[..take]);
        take
    }

    fn is_complete(&self) -> bool {
        self.words.len() == self.needed
    }
}

/// Logical records of a container, reassembled across blocks
pub fn records(bytes: &[u8]) -> Vec<Record> {
    let blocks = blocks(bytes);
    let mut records = Vec::new();
    let mut partial: Option<Partial> = None;
    let mut index = 0;

    while index < blocks.len() {
        let block = &blocks[index];
        let header = header(block);
        assert!(header.has_signature(), "block {index} is not a steering block");
        let first_record = header.first_record as usize;

        if first_record > BLOCK_HEADER_WORDS {
            let p = partial.as_mut().expect("continuation without open record");
            let used = p.feed(&block[BLOCK_HEADER_WORDS..first_record]);
            assert_eq!(used, first_record - BLOCK_HEADER_WORDS);
            assert!(p.is_complete(), "continuation shorter than record");
            let p = partial.take().unwrap();
            records.push(Record { kind: p.kind, words: p.words });
        } else {
            assert!(partial.is_none(), "record interrupted at block {index}");
        }

        let mut pos = first_record;
        while pos < BLOCK_WORDS {
            if pos == BLOCK_WORDS - 1 {
                assert_eq!(block[pos], 0, "single word padding must be zero");
                break;
            }
            let length = block[pos] as usize;
            let kind = block[pos + 1];
            if kind == record_type::PADDING {
                assert_eq!(length, BLOCK_WORDS - pos - 1, "padding length");
                assert!(block[pos + 2..].iter().all(|&w| w == 0), "padding not zeroed");
                break;
            }
            pos += 2;
            let mut p = Partial {
                kind,
                needed: length,
                words: Vec::with_capacity(length),
            };
            pos += p.feed(&block[pos..]);
            if p.is_complete() {
                records.push(Record { kind: p.kind, words: p.words });
            } else {
                partial = Some(p);
            }
        }

        for fast in 1..=header.fast_blocks as usize {
            let raw = &blocks[index + fast];
            let p = partial.as_mut().expect("fast block without open record");
            p.feed(raw);
            if p.is_complete() {
                let p = partial.take().unwrap();
                records.push(Record { kind: p.kind, words: p.words });
                assert_eq!(fast, header.fast_blocks as usize, "record ended before last fast block");
            }
        }
        index += 1 + header.fast_blocks as usize;
    }

    assert!(partial.is_none(), "container ends inside a record");
    records
}

/// A bank decoded from a data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    /// Offset of the characteristic in the bank material
    pub offset: usize,
    pub iochar: Vec<u32>,
    pub header: [u32; BANK_HEADER_WORDS],
    pub data: Vec<u32>,
}

impl Bank {
    pub fn name(&self) -> u32 {
        self.header[4]
    }

    /// Offset of the fixed header in the bank material
    pub fn header_offset(&self) -> usize {
        self.offset + self.iochar.len()
    }
}

/// Pilot and banks of a data record
pub fn banks(record: &Record) -> (Vec<u32>, Vec<Bank>) {
    assert_eq!(record.kind, record_type::DATA);
    let words = &record.words;
    let pilot_len = PILOT_WORDS + words[6] as usize;
    let pilot = words[..pilot_len].to_vec();
    let material = &words[pilot_len..];
    assert_eq!(material.len(), pilot[7] as usize, "pilot material size");

    let mut banks = Vec::new();
    let mut pos = 0;
    while pos < material.len() {
        let io_links = (material[pos] & 0xffff) as usize - 12;
        let iochar = material[pos..=pos + io_links].to_vec();
        let header_start = pos + 1 + io_links;
        let mut header = [0u32; BANK_HEADER_WORDS];
        header.copy_from_slice(&material[header_start..header_start + BANK_HEADER_WORDS]);
        let data_start = header_start + BANK_HEADER_WORDS;
        let data = material[data_start..data_start + header[7] as usize].to_vec();
        banks.push(Bank {
            offset: pos,
            iochar,
            header,
            data,
        });
        pos = data_start + header[7] as usize;
    }
    (pilot, banks)
}

/// Name and data of every payload bank in the container, MAST banks skipped
pub fn payloads(bytes: &[u8]) -> Vec<(u32, Vec<u32>)> {
    records(bytes)
        .iter()
        .filter(|record| record.kind == record_type::DATA)
        .flat_map(|record| banks(record).1)
        .filter(|bank| bank.name() != BankKind::Mast.definition().name)
        .map(|bank| (bank.name(), bank.data))
        .collect()
}

/// Run control records (end of run and end of container) in file order
pub fn run_control(bytes: &[u8]) -> Vec<Vec<u32>> {
    records(bytes)
        .into_iter()
        .filter(|record| record.kind == record_type::RUN_CONTROL)
        .map(|record| record.words)
        .collect()
}
