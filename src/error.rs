use std::path::PathBuf;

use thiserror::Error;

/// Every way a create or extract call can fail.
///
/// Argument and existence problems are reported before any work starts.
/// [`Error::Canceled`] is kept apart from real failures so callers can tell
/// "the user stopped it" from "something broke".
#[derive(Error, Debug)]
pub enum Error {
    #[error("argument `{param}` must not be blank")]
    InvalidArgument { param: &'static str },

    #[error("`{param}` does not exist: {}", path.display())]
    NotFound { param: &'static str, path: PathBuf },

    #[error("operation canceled")]
    Canceled,

    #[error("path {} is not inside {}", path.display(), root.display())]
    InvalidPath { root: PathBuf, path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("archive exceeds the limits of the classic ZIP format")]
    ArchiveTooLarge,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// True when the operation stopped because cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
