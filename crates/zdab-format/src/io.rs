//! Physical record I/O
//!
//! Everything that touches the output file goes through [`PhysicalWriter`]:
//! words are converted to big-endian bytes owned by the writer, transferred,
//! counted and fed to the optional MD5 accumulator in file order.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, Write};
use tracing::debug;

/// File-like output a container can be written to
///
/// Besides plain I/O the writer needs a way to force data to stable
/// storage on [`flush`](crate::ZdabWriter::flush).
pub trait ContainerFile: Read + Write + Seek {
    /// Synchronize written data with the underlying storage
    fn sync(&mut self) -> io::Result<()>;
}

impl ContainerFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl ContainerFile for Cursor<Vec<u8>> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ContainerFile + ?Sized> ContainerFile for &mut T {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// Convert native words to their on-disk byte representation
pub fn encode_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

/// Convert on-disk bytes back to native words
///
/// Trailing bytes that do not form a whole word are ignored.
pub fn decode_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Owner of the output handle, byte counter and checksum
pub struct PhysicalWriter<F> {
    file: Option<F>,
    checksum: Option<Md5>,
    bytes_written: u64,
}

impl<F: ContainerFile> PhysicalWriter<F> {
    /// Wrap an open file
    pub fn new(file: F, checksum: bool) -> Self {
        Self {
            file: Some(file),
            checksum: checksum.then(Md5::new),
            bytes_written: 0,
        }
    }

    /// A writer that never had a file
    pub fn detached(checksum: bool) -> Self {
        Self {
            file: None,
            checksum: checksum.then(Md5::new),
            bytes_written: 0,
        }
    }

    /// Whether the file handle is still held
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Bytes successfully transferred
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// MD5 of every byte transferred so far, if enabled
    pub fn digest(&self) -> Option<[u8; 16]> {
        self.checksum.as_ref().map(|md5| {
            let result = md5.clone().finalize();
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&result);
            bytes
        })
    }

    /// Transfer words to the file
    ///
    /// The checksum only sees the bytes that were written successfully.
    pub fn transfer(&mut self, words: &[u32]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(not_open)?;
        if words.is_empty() {
            return Ok(());
        }

        let bytes = encode_words(words);
        file.write_all(&bytes)?;
        self.bytes_written += bytes.len() as u64;
        if let Some(md5) = self.checksum.as_mut() {
            md5.update(&bytes);
        }
        debug!(
            "Transferred {} words ({} bytes total)",
            words.len(),
            self.bytes_written
        );
        Ok(())
    }

    /// Flush and synchronize the file
    pub fn sync(&mut self) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(not_open)?;
        file.flush()?;
        file.sync()
    }

    /// Synchronize and release the file handle
    ///
    /// Deferred write errors surface here, since dropping a file discards
    /// them. The handle is released either way. Returns `Ok(false)` when
    /// there was no handle to release.
    pub fn close(&mut self) -> io::Result<bool> {
        match self.file.take() {
            Some(mut file) => {
                file.flush()?;
                file.sync()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the file handle without flushing
    pub fn abandon(&mut self) {
        self.file = None;
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "output file not open")
}
