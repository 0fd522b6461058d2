//! ZDAB container writer
//!
//! [`ZdabWriter`] owns one output file and one block buffer for its whole
//! life. Banks go in through [`write_bank`](ZdabWriter::write_bank), are
//! laid out into physical blocks and transferred one full block at a time.
//! [`close`](ZdabWriter::close) seals the container with the end-of-run and
//! end-of-container markers.
//!
//! Any I/O failure releases the file and leaves the writer permanently
//! failed: everything written up to the last complete block stays a valid
//! prefix, later calls return an error without touching the file.
//!
//! # Example
//!
//! ```no_run
//! use zdab_format::{BankKind, WriterConfig, ZdabWriter};
//!
//! let config = WriterConfig::new("run_100.zdab").with_checksum(true);
//! let mut writer = ZdabWriter::try_open(&config)?;
//! writer.write_bank(&[0u32; 18], BankKind::Rhdr)?;
//! writer.close()?;
//! println!("md5 {}", writer.checksum_hex().unwrap_or_default());
//! # Ok::<(), zdab_format::WriterError>(())
//! ```

mod compose;

use crate::block::{
    BlockBuffer, BlockHeader, END_OF_CONTAINER_RECORD, END_OF_RUN_RECORD,
};
use crate::catalog::BankKind;
use crate::config::WriterConfig;
use crate::error::{FailureKind, Result, WriterError};
use crate::io::{ContainerFile, PhysicalWriter};
use crate::resume::{self, ResumePoint};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use tracing::{debug, error, info, warn};

/// Streaming writer for ZDAB containers
pub struct ZdabWriter<F: ContainerFile = File> {
    physical: PhysicalWriter<F>,
    buffer: BlockBuffer,
    /// Sequence number of the steering block in the buffer
    sequence: u32,
    failure: Option<FailureKind>,
    /// Word count of the last primary bank written
    last_event_words: u32,
    name: String,
}

impl ZdabWriter<File> {
    /// Open the configured container for writing
    ///
    /// Never fails: if the container cannot be opened the writer is
    /// returned in a permanently failed state, see [`failure`](Self::failure).
    pub fn open(config: &WriterConfig) -> Self {
        match Self::try_open(config) {
            Ok(writer) => writer,
            Err(e) => {
                error!(
                    "Can't write events to file {}: {}",
                    config.path.display(),
                    e
                );
                let kind = e.kind().unwrap_or(FailureKind::Io);
                Self::failed(kind, config.checksum, config.path.display().to_string())
            }
        }
    }

    /// Open the configured container, reporting why it could not be opened
    ///
    /// An existing file is resumed, a missing one is created.
    pub fn try_open(config: &WriterConfig) -> Result<Self> {
        config.validate()?;
        let name = config.path.display().to_string();

        match OpenOptions::new().read(true).write(true).open(&config.path) {
            Ok(file) => {
                info!("Output zdab file {} already exists, scanning for last record", name);
                let mut writer = Self::resume(file, config.checksum)?;
                writer.name = name;
                info!("Appending events to zdab file {}", writer.name);
                Ok(writer)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let file = File::create(&config.path)
                    .map_err(|e| WriterError::io("creating output file", e))?;
                let mut writer = Self::create(file, config.checksum);
                writer.name = name;
                info!("Created output zdab file {}", writer.name);
                Ok(writer)
            }
            Err(e) => Err(WriterError::io("opening output file", e)),
        }
    }
}

impl<F: ContainerFile> ZdabWriter<F> {
    /// Start a new container on an empty file
    pub fn create(file: F, checksum: bool) -> Self {
        Self::staged(PhysicalWriter::new(file, checksum), 0)
    }

    /// Continue an existing container
    ///
    /// Scans `file` from its start for the end-of-run marker and positions
    /// it so the marker gets overwritten.
    pub fn resume(mut file: F, checksum: bool) -> Result<Self> {
        file.seek(SeekFrom::Start(0))
            .map_err(|e| WriterError::io("rewinding existing container", e))?;
        let point: ResumePoint = resume::scan(&mut file)?;
        file.seek(SeekFrom::Start(point.resume_offset))
            .map_err(|e| WriterError::io("seeking to end-of-run marker", e))?;
        debug!(
            "Resuming after {} blocks at sequence {}",
            point.blocks_scanned,
            point.next_sequence()
        );
        Ok(Self::staged(
            PhysicalWriter::new(file, checksum),
            point.next_sequence(),
        ))
    }

    fn staged(physical: PhysicalWriter<F>, sequence: u32) -> Self {
        let mut writer = Self {
            physical,
            buffer: BlockBuffer::new(),
            sequence,
            failure: None,
            last_event_words: 0,
            name: String::from("<stream>"),
        };
        writer.begin_block(0);
        writer
    }

    fn failed(kind: FailureKind, checksum: bool, name: String) -> Self {
        Self {
            physical: PhysicalWriter::detached(checksum),
            buffer: BlockBuffer::new(),
            sequence: 0,
            failure: Some(kind),
            last_event_words: 0,
            name,
        }
    }

    /// Whether the output file is open for writing
    pub fn is_open(&self) -> bool {
        self.physical.is_open()
    }

    /// Sticky failure, if any operation has failed
    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Sequence number of the steering block currently being filled
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Bytes transferred to the file by this writer
    pub fn bytes_written(&self) -> u64 {
        self.physical.bytes_written()
    }

    /// MD5 of the bytes transferred so far, if the checksum is enabled
    pub fn checksum(&self) -> Option<[u8; 16]> {
        self.physical.digest()
    }

    /// [`checksum`](Self::checksum) as lowercase hex
    pub fn checksum_hex(&self) -> Option<String> {
        self.checksum().map(hex::encode)
    }

    /// Data word count of a bank type
    ///
    /// For the variable-size primary bank this is the size of the last one
    /// written (0 before the first).
    pub fn bank_word_count(&self, kind: BankKind) -> u32 {
        if kind.is_primary() {
            self.last_event_words
        } else {
            kind.definition().word_count()
        }
    }

    /// Transfer buffered words and synchronize the file
    ///
    /// Does not complete the current block; later writes continue filling
    /// it and only the part not yet transferred is written when it is full.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;

        if let Err(e) = self.physical.transfer(self.buffer.pending()) {
            return Err(self.fail(WriterError::io("flushing buffered words", e)));
        }
        self.buffer.mark_durable();

        if let Err(e) = self.physical.sync() {
            return Err(self.fail(WriterError::io("synchronizing output file", e)));
        }
        Ok(())
    }

    /// Seal the container and release the file
    ///
    /// Safe to call more than once; later calls only report the sticky
    /// status.
    pub fn close(&mut self) -> Result<()> {
        if self.physical.is_open() {
            self.seal()?;
            match self.physical.close() {
                Ok(_) => info!("Closed output zdab file {}", self.name),
                Err(e) => return Err(self.fail(WriterError::io("closing output file", e))),
            }
        }

        match self.failure {
            Some(kind) => Err(WriterError::Failed(kind)),
            None => Ok(()),
        }
    }

    /// Complete the current block, then write the end-of-run and
    /// end-of-container marker blocks
    fn seal(&mut self) -> Result<()> {
        self.finish_block()?;

        let marker = BlockHeader::end_of_run().to_words();
        self.buffer.push(&marker);
        self.buffer.push(&END_OF_RUN_RECORD);
        self.finish_block()?;

        self.buffer.push(&marker);
        self.buffer.push(&END_OF_CONTAINER_RECORD);
        self.finish_block()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.physical.is_open() {
            Ok(())
        } else {
            Err(WriterError::NotOpen)
        }
    }

    /// Record a sticky failure and release the file
    fn fail(&mut self, err: WriterError) -> WriterError {
        error!(
            "Error writing to output zdab file {}, file closed: {}",
            self.name, err
        );
        self.physical.abandon();
        if let Some(kind) = err.kind() {
            self.failure.get_or_insert(kind);
        }
        err
    }

    /// Stage a steering block header with the current sequence number
    fn begin_block(&mut self, continuation: usize) {
        self.buffer
            .push(&BlockHeader::steering(self.sequence, continuation).to_words());
    }

    /// Stage the header of the next steering block
    fn advance_block(&mut self, continuation: usize) {
        self.sequence = self.sequence.wrapping_add(1);
        self.begin_block(continuation);
    }

    /// Pad the current block and transfer it
    fn finish_block(&mut self) -> Result<()> {
        self.buffer.pad();
        self.emit_block()
    }

    /// Transfer a full block, skipping whatever a flush already wrote
    fn emit_block(&mut self) -> Result<()> {
        debug_assert!(self.buffer.is_full());
        let result = self.physical.transfer(self.buffer.undurable_tail());
        self.buffer.clear();
        result.map_err(|e| self.fail(WriterError::io("writing block", e)))
    }
}

impl<F: ContainerFile> Drop for ZdabWriter<F> {
    fn drop(&mut self) {
        if self.physical.is_open()
            && let Err(e) = self.close()
        {
            warn!("Closing zdab file {} on drop failed: {}", self.name, e);
        }
    }
}

impl<F: ContainerFile> std::fmt::Debug for ZdabWriter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZdabWriter")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("sequence", &self.sequence)
            .field("fill", &self.buffer.fill())
            .field("durable", &self.buffer.durable())
            .field("bytes_written", &self.bytes_written())
            .field("failure", &self.failure)
            .finish()
    }
}
