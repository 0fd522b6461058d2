//! Streaming writer for ZDAB containers
//!
#![allow(clippy::cast_possible_truncation)] // Word counts always fit the 32-bit fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // ZEBRA terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::float_cmp)] // Version words compared bit-exact
//! ZDAB is the ZEBRA FZ based container SNO and SNO+ use to archive
//! detector events. This crate writes it bit-exact:
//!
//! - **Physical blocks**: fixed 3840-word blocks, big-endian on disk
//! - **Steering and fast blocks**: records too large for one block continue
//!   in headerless fast blocks announced by the steering block
//! - **MAST banks**: synthesized in front of every non-event bank, with the
//!   relocation link to the bank they support
//! - **Resume**: an existing container is scanned and extended in place
//! - **Checksum**: optional MD5 of every byte written
//!
//! # Design Principles
//!
//! - **Fail closed**: the first I/O error releases the file; what was
//!   written before stays a valid container prefix
//! - **Caller data is read-only**: byte order conversion happens in writer
//!   owned memory
//! - **One block in flight**: nothing is buffered beyond the current block

#![warn(missing_docs)]

pub mod block;
/// Bank catalog and bank kinds
pub mod catalog;
/// Writer configuration
pub mod config;
pub mod error;
pub mod event;
pub mod io;
pub mod resume;
mod writer;

pub use catalog::{BankDef, BankKind, lookup_index};
pub use config::WriterConfig;
pub use error::{FailureKind, Result, WriterError};
pub use io::ContainerFile;
pub use resume::ResumePoint;
pub use writer::ZdabWriter;
