//! Writer configuration

use crate::error::{Result, WriterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`ZdabWriter`](crate::ZdabWriter)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Output container path
    pub path: PathBuf,

    /// Accumulate an MD5 checksum of every byte written
    #[serde(default)]
    pub checksum: bool,
}

impl WriterConfig {
    /// Create a configuration for the given output path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the output path
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Enable or disable the MD5 checksum
    #[must_use]
    pub const fn with_checksum(mut self, enable: bool) -> Self {
        self.checksum = enable;
        self
    }

    /// Check that the configuration names an output file
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(WriterError::EmptyPath);
        }
        Ok(())
    }
}
