//! Record composition
//!
//! Lays one bank out as a logical record: `[length, type]`, the pilot, the
//! MAST bank for everything except event records, the bank header and the
//! payload. Payloads that do not fit the current steering block continue
//! either in a fresh steering block or, when even that is too small, in a
//! run of headerless fast blocks announced by the steering block.

use super::ZdabWriter;
use crate::block::{
    BANK_HEADER_WORDS, BASE_LINK, BLOCK_HEADER_WORDS, BLOCK_WORDS, FAST_COUNT_WORD,
    LOGICAL_HEADER_WORDS, Pilot, STEERING_CAPACITY, SUPPORT_BANK_LINK, record_type,
};
use crate::catalog::{BankDef, BankKind, MAST_DATA, MAST_LINKS};
use crate::error::{Result, WriterError};
use crate::event;
use crate::io::ContainerFile;
use tracing::debug;

/// Sizes and links of one logical record
struct RecordLayout {
    def: &'static BankDef,
    payload_words: usize,
}

impl RecordLayout {
    fn new(kind: BankKind, payload_words: usize) -> Self {
        Self {
            def: kind.definition(),
            payload_words,
        }
    }

    fn has_mast(&self) -> bool {
        !self.def.kind.is_primary()
    }

    /// Bank headers, plus the whole MAST bank when present
    fn header_words(&self) -> usize {
        let mut words = self.def.header_words();
        if self.has_mast() {
            let mast = BankKind::Mast.definition();
            words += mast.header_words() + mast.words as usize;
        }
        words
    }

    fn material_words(&self) -> usize {
        self.header_words() + self.payload_words
    }

    fn pilot(&self) -> Pilot {
        if self.has_mast() {
            Pilot::relocated(self.material_words())
        } else {
            Pilot::plain(self.material_words())
        }
    }

    /// Everything in front of the payload, including the record header
    fn overhead_words(&self) -> usize {
        LOGICAL_HEADER_WORDS + self.pilot().word_count() + self.header_words()
    }

    fn record_words(&self) -> usize {
        self.overhead_words() + self.payload_words
    }

    /// Link from the MAST bank to the payload bank
    fn mast_link(&self) -> u32 {
        let mast = BankKind::Mast.definition();
        BASE_LINK + mast.header_words() as u32 + mast.words + 1 + self.def.io_link_words() as u32
    }

    /// MAST characteristic with only the link for this bank set
    fn mast_iochar(&self) -> [u32; 1 + MAST_LINKS] {
        let mut iochar = [0u32; 1 + MAST_LINKS];
        iochar.copy_from_slice(BankKind::Mast.definition().iochar);
        iochar[1..].fill(0);
        iochar[1 + MAST_LINKS - self.def.id as usize] = self.mast_link();
        iochar
    }

    fn mast_header(&self) -> [u32; BANK_HEADER_WORDS] {
        let mast = BankKind::Mast.definition();
        [0, 0, 0, mast.id, mast.name, mast.links, mast.links, mast.words, mast.status]
    }

    fn bank_header(&self) -> [u32; BANK_HEADER_WORDS] {
        let def = self.def;
        [
            0,
            SUPPORT_BANK_LINK,
            SUPPORT_BANK_LINK - def.id,
            def.id,
            def.name,
            def.links,
            def.links,
            self.payload_words as u32,
            def.status,
        ]
    }
}

/// The payload words that will be written for `kind`
fn resolve_payload(payload: &[u32], kind: BankKind) -> Result<&[u32]> {
    let needed = if kind.is_primary() {
        event::event_record_words(payload)?
    } else {
        kind.definition().words as usize
    };
    payload.get(..needed).ok_or(WriterError::PayloadTooShort {
        bank: kind.definition().tag,
        needed,
        available: payload.len(),
    })
}

impl<F: ContainerFile> ZdabWriter<F> {
    /// Write one bank as a logical record
    ///
    /// Every bank except the primary event bank is preceded by a MAST bank
    /// linking to it. Writing a MAST bank directly does nothing. For fixed
    /// size banks extra trailing words in `payload` are ignored; the event
    /// record size is derived from its contents.
    ///
    /// `payload` is never modified.
    pub fn write_bank(&mut self, payload: &[u32], kind: BankKind) -> Result<()> {
        self.ensure_open()?;
        if kind == BankKind::Mast {
            return Ok(());
        }

        let words = resolve_payload(payload, kind)?;
        if kind.is_primary() {
            self.last_event_words = words.len() as u32;
        }
        let layout = RecordLayout::new(kind, words.len());

        self.place_record(&layout)?;
        self.push_record_header(&layout);
        self.stream_payload(words)
    }

    /// Make sure the record header and at least one payload word fit
    fn place_record(&mut self, layout: &RecordLayout) -> Result<()> {
        // an interim flush already wrote this block's header, so the record
        // must not need a fast block run from here
        if self.buffer.durable() > 0
            && self.buffer.fill() + layout.record_words() > 2 * BLOCK_WORDS - BLOCK_HEADER_WORDS
        {
            debug!(
                "{} record of {} words needs a fresh block after flush",
                layout.def.tag,
                layout.record_words()
            );
            self.finish_block()?;
            self.advance_block(0);
        }

        if self.buffer.fill() >= BLOCK_WORDS - layout.overhead_words() {
            self.finish_block()?;
            self.advance_block(0);
        }
        Ok(())
    }

    fn push_record_header(&mut self, layout: &RecordLayout) {
        let pilot = layout.pilot();
        let record_length = pilot.word_count() + layout.material_words();
        self.buffer.push(&[record_length as u32, record_type::DATA]);
        self.buffer.push(pilot.as_words());

        if layout.has_mast() {
            self.buffer.push(&layout.mast_iochar());
            self.buffer.push(&layout.mast_header());
            self.buffer.push(&MAST_DATA);
        }

        self.buffer
            .push(&layout.def.iochar[..=layout.def.io_link_words()]);
        self.buffer.push(&layout.bank_header());
    }

    /// Copy payload words into blocks, opening steering or fast blocks as
    /// the current one fills up
    fn stream_payload(&mut self, words: &[u32]) -> Result<()> {
        let mut fast_run = false;

        for (i, &word) in words.iter().enumerate() {
            if self.buffer.is_full() {
                let left = words.len() - i;
                if left > STEERING_CAPACITY {
                    if !fast_run {
                        let fast_blocks = ((left - STEERING_CAPACITY - 1) / BLOCK_WORDS + 1) as u32;
                        if self.buffer.durable() > FAST_COUNT_WORD {
                            return Err(self.fail(WriterError::SteeringHeaderFlushed { fast_blocks }));
                        }
                        debug!("Steering block {} starts {} fast blocks", self.sequence, fast_blocks);
                        self.buffer.set_word(FAST_COUNT_WORD, fast_blocks);
                        fast_run = true;
                    }
                    self.emit_block()?;
                } else {
                    fast_run = false;
                    self.emit_block()?;
                    self.advance_block(left);
                }
            }
            self.buffer.push_word(word);
        }

        // the payload ended inside a fast block
        if fast_run {
            self.finish_block()?;
            self.advance_block(0);
        }
        Ok(())
    }
}
