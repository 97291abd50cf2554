//! Chunked stream copy with progress reporting and cancellation.
//!
//! A single [`StreamCopier`] is used for a whole create or extract call. It
//! owns the chunk buffer and the [`TransferState`], so progress is cumulative
//! across every entry copied through it.

use std::io::{self, ErrorKind, Read, Write};

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Default chunk size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 81_920;

/// Receives the completed fraction of an operation, in `[0.0, 1.0]`.
///
/// Called synchronously on the worker, so a slow sink slows the copy down.
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// Bytes planned and bytes moved so far for one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferState {
    pub total_bytes: u64,
    pub transferred: u64,
}

impl TransferState {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            transferred: 0,
        }
    }

    /// Completed fraction. `None` when there is nothing to transfer.
    pub fn fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.transferred as f64 / self.total_bytes as f64).min(1.0))
    }
}

/// Fails with [`Error::Canceled`] if the token has been triggered.
pub fn check_canceled(cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Canceled),
        _ => Ok(()),
    }
}

pub struct StreamCopier<'a> {
    buffer: Vec<u8>,
    state: TransferState,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancellationToken>,
    last_reported: Option<f64>,
}

impl<'a> StreamCopier<'a> {
    pub fn new(
        total_bytes: u64,
        buffer_size: usize,
        progress: Option<&'a dyn ProgressSink>,
        cancel: Option<&'a CancellationToken>,
    ) -> Self {
        Self {
            buffer: vec![0u8; buffer_size.max(1)],
            state: TransferState::new(total_bytes),
            progress,
            cancel,
            last_reported: None,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Close out a successful run with a final `1.0` report.
    ///
    /// Only reports when the last fraction fell short, which happens when a
    /// source shrank between the size pass and the copy. Nothing is reported
    /// for a zero-byte total.
    pub fn finish(&mut self) {
        let Some(sink) = self.progress else {
            return;
        };
        if self.state.total_bytes > 0 && self.last_reported.is_none_or(|f| f < 1.0) {
            sink.report(1.0);
            self.last_reported = Some(1.0);
        }
    }

    /// Copy `source` into `destination` chunk by chunk until end of stream.
    ///
    /// Each chunk is filled as far as the source allows before it is written.
    /// Cancellation is checked right before a chunk is written and again
    /// after its progress report, so nothing is written once cancellation has
    /// been observed.
    ///
    /// # Returns
    ///
    /// The number of bytes copied by this call.
    ///
    /// # Errors
    ///
    /// [`Error::Canceled`] when cancellation is observed; I/O errors from
    /// either stream are passed through.
    pub fn copy<R, W>(&mut self, source: &mut R, destination: &mut W) -> Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut copied = 0u64;
        loop {
            let n = fill_chunk(source, &mut self.buffer)?;
            if n == 0 {
                break;
            }

            check_canceled(self.cancel)?;
            destination.write_all(&self.buffer[..n])?;

            copied += n as u64;
            self.state.transferred += n as u64;
            if let (Some(sink), Some(fraction)) = (self.progress, self.state.fraction()) {
                sink.report(fraction);
                self.last_reported = Some(fraction);
            }

            check_canceled(self.cancel)?;
        }
        Ok(copied)
    }
}

/// Read until `buf` is full or the source is exhausted.
fn fill_chunk<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
