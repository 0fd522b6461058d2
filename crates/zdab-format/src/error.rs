//! Error types for ZDAB container writing
//!
//! Errors fall into three sticky classes (see [`FailureKind`]) plus a small
//! set of argument errors that reject a single call without disturbing the
//! writer.

use thiserror::Error;

/// Class of a failure that permanently disables a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No usable output path was configured
    Configuration,
    /// An existing container could not be resumed
    Format,
    /// A read, write, flush or close on the output file failed
    Io,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => f.write_str("configuration error"),
            Self::Format => f.write_str("format error"),
            Self::Io => f.write_str("I/O error"),
        }
    }
}

/// ZDAB writer error types
#[derive(Error, Debug)]
pub enum WriterError {
    /// Output path was empty
    #[error("No output path given")]
    EmptyPath,

    /// Existing container has a block without the FZ signature
    #[error("Existing container has wrong FZ signature in block {block}: {found:08x?}")]
    BadSignature {
        /// Index of the offending block
        block: u64,
        /// Signature words actually found
        found: [u32; 4],
    },

    /// Existing container ended before an end-of-run marker was found
    #[error("Existing container has no end-of-run marker after {blocks} blocks")]
    MissingEndOfRun {
        /// Number of complete blocks scanned
        blocks: u64,
    },

    /// Existing container ended inside a run of fast blocks
    #[error("Existing container is truncated in fast block run at block {block}")]
    TruncatedFastRun {
        /// Index of the missing block
        block: u64,
    },

    /// Operation on the output file failed
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the writer was doing
        context: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A fast block run was needed after the steering header was flushed
    #[error("Steering block header already written, cannot record {fast_blocks} fast blocks")]
    SteeringHeaderFlushed {
        /// Fast block count that could not be recorded
        fast_blocks: u32,
    },

    /// The writer has no open output file
    #[error("Output file not open")]
    NotOpen,

    /// The writer failed earlier and stays failed
    #[error("Writer failed earlier: {0}")]
    Failed(FailureKind),

    /// Payload holds fewer words than the bank requires
    #[error("Payload for {bank} bank too short: need {needed} words, got {available}")]
    PayloadTooShort {
        /// Bank name
        bank: &'static str,
        /// Words required
        needed: usize,
        /// Words supplied
        available: usize,
    },

    /// Primary event record is structurally inconsistent
    #[error("Invalid PMT event record: {reason}")]
    InvalidEventRecord {
        /// Description of the inconsistency
        reason: String,
    },
}

/// Result type for ZDAB writer operations
pub type Result<T> = std::result::Result<T, WriterError>;

impl WriterError {
    /// Create an I/O error with context
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Create an invalid event record error
    pub fn invalid_event_record<S: Into<String>>(reason: S) -> Self {
        Self::InvalidEventRecord {
            reason: reason.into(),
        }
    }

    /// Sticky failure class of this error, `None` for rejected arguments
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::EmptyPath => Some(FailureKind::Configuration),
            Self::BadSignature { .. } | Self::MissingEndOfRun { .. } | Self::TruncatedFastRun { .. } => {
                Some(FailureKind::Format)
            }
            Self::Io { .. } | Self::SteeringHeaderFlushed { .. } => Some(FailureKind::Io),
            Self::Failed(kind) => Some(*kind),
            Self::NotOpen | Self::PayloadTooShort { .. } | Self::InvalidEventRecord { .. } => None,
        }
    }

    /// Legacy status code
    ///
    /// `-1` when the file is not open or could not be opened, `-2` when an
    /// I/O failure closed the file, `-3` when the call itself was rejected.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotOpen
            | Self::EmptyPath
            | Self::BadSignature { .. }
            | Self::MissingEndOfRun { .. }
            | Self::TruncatedFastRun { .. } => -1,
            Self::Io { .. } | Self::SteeringHeaderFlushed { .. } => -2,
            Self::Failed(FailureKind::Io) => -2,
            Self::Failed(_) => -1,
            Self::PayloadTooShort { .. } | Self::InvalidEventRecord { .. } => -3,
        }
    }

    /// Check if this error leaves the writer permanently disabled
    pub fn is_sticky(&self) -> bool {
        self.kind().is_some()
    }
}
