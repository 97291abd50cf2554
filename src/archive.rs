//! Async entry points.
//!
//! Arguments are checked up front, before anything touches the destination.
//! The traversal and copy then run on a blocking worker so the caller's
//! runtime thread is never tied up by file I/O.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::copy::{DEFAULT_BUFFER_SIZE, ProgressSink};
use crate::error::{Error, Result};
use crate::pipeline;
use crate::zip::CompressionMethod;

/// Knobs for a single create or extract call.
#[derive(Clone)]
pub struct TransferOptions {
    /// Receives the completed fraction after every chunk
    pub progress: Option<Arc<dyn ProgressSink>>,
    /// Polled before each entry and around every chunk
    pub cancel: Option<CancellationToken>,
    /// Chunk size of the copy loop
    pub buffer_size: usize,
    /// Method used for new entries; ignored by extraction
    pub compression: CompressionMethod,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            progress: None,
            cancel: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            compression: CompressionMethod::Deflate,
        }
    }
}

impl TransferOptions {
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }
}

impl fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferOptions")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .field("buffer_size", &self.buffer_size)
            .field("compression", &self.compression)
            .finish()
    }
}

/// Bundle the contents of `folder_path` into a new ZIP archive.
///
/// An existing file at `archive_file_path` is overwritten.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if either path is blank
/// - [`Error::NotFound`] if `folder_path` is not an existing directory
/// - [`Error::Canceled`] if the cancellation token fires
/// - [`Error::Io`] for any file-system failure
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folderzip::{TransferOptions, create_from_folder};
///
/// # async fn run() -> folderzip::Result<()> {
/// let options = TransferOptions::default()
///     .with_progress(Arc::new(|fraction: f64| println!("{:.0}%", fraction * 100.0)));
/// create_from_folder("photos", "photos.zip", options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_from_folder(
    folder_path: impl AsRef<Path>,
    archive_file_path: impl AsRef<Path>,
    options: TransferOptions,
) -> Result<()> {
    let folder = require_not_blank(folder_path.as_ref(), "folder_path")?;
    let archive = require_not_blank(archive_file_path.as_ref(), "archive_file_path")?;
    if !folder.is_dir() {
        return Err(Error::NotFound {
            param: "folder_path",
            path: folder.to_path_buf(),
        });
    }

    let folder = std::path::absolute(folder)?;
    let archive = std::path::absolute(archive)?;

    run_blocking(move || pipeline::create(&folder, &archive, &options)).await
}

/// Unpack a ZIP archive into `dest_folder_path`, creating it if needed.
///
/// Existing files with the same names are overwritten.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if either path is blank
/// - [`Error::NotFound`] if `archive_file_path` is not an existing file
/// - [`Error::Canceled`] if the cancellation token fires
/// - [`Error::InvalidPath`] for entries that would land outside the destination
/// - [`Error::InvalidArchive`] / [`Error::Io`] for corrupt archives and I/O failures
pub async fn extract_to_folder(
    archive_file_path: impl AsRef<Path>,
    dest_folder_path: impl AsRef<Path>,
    options: TransferOptions,
) -> Result<()> {
    let archive = require_not_blank(archive_file_path.as_ref(), "archive_file_path")?;
    let dest = require_not_blank(dest_folder_path.as_ref(), "dest_folder_path")?;
    if !archive.is_file() {
        return Err(Error::NotFound {
            param: "archive_file_path",
            path: archive.to_path_buf(),
        });
    }

    let archive = std::path::absolute(archive)?;
    let dest = std::path::absolute(dest)?;
    tokio::fs::create_dir_all(&dest).await?;

    run_blocking(move || pipeline::extract(&archive, &dest, &options)).await
}

fn require_not_blank<'a>(path: &'a Path, param: &'static str) -> Result<&'a Path> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(Error::InvalidArgument { param });
    }
    Ok(path)
}

async fn run_blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Worker(e.to_string()))?
}
