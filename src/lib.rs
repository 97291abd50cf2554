//! # folderzip
//!
//! Bundle a folder into a single ZIP archive and unpack it again, with
//! fractional progress reporting and cooperative cancellation.
//!
//! Both operations make two passes: the first adds up the bytes to move, the
//! second moves them in fixed-size chunks. After every chunk the progress sink
//! receives `bytes_so_far / total_bytes`, and the cancellation token is polled
//! around every chunk and before every entry. When there is nothing to copy no
//! progress is reported at all.
//!
//! ## Features
//!
//! - Archive a folder tree, including empty directories, with STORED or DEFLATE entries
//! - Extract STORED and DEFLATE entries, ZIP64 archives included, with CRC-32 checks
//! - Entry names relative to the folder, `/`-separated, `dir/` for empty directories
//! - Timestamps clamped to the 1980..=2107 range ZIP can store
//! - Cancellation surfaces as [`Error::Canceled`], distinct from real failures
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use folderzip::{CancellationToken, TransferOptions};
//!
//! #[tokio::main]
//! async fn main() -> folderzip::Result<()> {
//!     let cancel = CancellationToken::new();
//!     let options = TransferOptions::default()
//!         .with_progress(Arc::new(|f: f64| eprintln!("{:>3.0}%", f * 100.0)))
//!         .with_cancel(cancel.clone());
//!
//!     folderzip::create_from_folder("project", "project.zip", options.clone()).await?;
//!     folderzip::extract_to_folder("project.zip", "restored", options).await?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod copy;
pub mod error;
pub mod io;
pub mod names;
pub mod pipeline;
pub mod plan;
pub mod timestamp;
pub mod zip;

pub use archive::{TransferOptions, create_from_folder, extract_to_folder};
pub use cli::Cli;
pub use copy::{DEFAULT_BUFFER_SIZE, ProgressSink, StreamCopier, TransferState};
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use tokio_util::sync::CancellationToken;
pub use zip::{CompressionMethod, ZipFileEntry, ZipReader, ZipWriter};
