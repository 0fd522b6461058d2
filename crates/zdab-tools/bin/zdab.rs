//! ZDAB container tool.
//!
//! Thin wrapper around the zdab-format library:
//! - `scan` reports where an existing container would be resumed
//! - `init` creates or reseals a container without adding banks
//! - `digest` prints the MD5 of a file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zdab_format::{WriterConfig, ZdabWriter, resume};

#[derive(Parser)]
#[command(
    name = "zdab",
    about = "Inspect and seal ZDAB event containers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the end-of-run marker and report where writing would resume
    Scan {
        /// Container to scan
        file: PathBuf,
    },

    /// Create a container, or reseal an existing one
    Init {
        /// Container to create or reseal
        file: PathBuf,

        /// Print the MD5 of the bytes written
        #[arg(long)]
        md5: bool,
    },

    /// Print the MD5 of a whole file
    Digest {
        /// File to hash
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { file } => scan(&file),
        Commands::Init { file, md5 } => init(&file, md5),
        Commands::Digest { file } => {
            println!("{}  {}", digest(&file)?, file.display());
            Ok(())
        }
    }
}

fn scan(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let point = resume::scan(BufReader::new(file))
        .with_context(|| format!("scanning {}", path.display()))?;

    match point.last_sequence {
        Some(sequence) => println!("last sequence:  {sequence}"),
        None => println!("last sequence:  none"),
    }
    println!("next sequence:  {}", point.next_sequence());
    println!("resume offset:  {}", point.resume_offset);
    println!("blocks scanned: {}", point.blocks_scanned);
    Ok(())
}

fn init(path: &Path, md5: bool) -> Result<()> {
    let config = WriterConfig::new(path).with_checksum(md5);
    let mut writer = ZdabWriter::try_open(&config)
        .with_context(|| format!("opening {}", path.display()))?;
    tracing::debug!("Opened {:?}", writer);
    writer
        .close()
        .with_context(|| format!("sealing {}", path.display()))?;

    if let Some(hex) = writer.checksum_hex() {
        println!("{hex}  (bytes written: {})", writer.bytes_written());
    }
    Ok(())
}

fn digest(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Md5::new();
    std::io::copy(&mut file, &mut hasher).with_context(|| format!("reading {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}
