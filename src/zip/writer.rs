//! Sequential ZIP writer.
//!
//! Entries are appended one at a time. Each local header is written up front
//! with placeholder CRC and sizes and patched once the entry's data is done,
//! which is why the output must be seekable. The central directory and EOCD
//! are written by [`ZipWriter::finish`], or on drop if the writer is abandoned
//! halfway, so an interrupted archive still opens with whatever entries were
//! completed.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crc32fast::Hasher;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::timestamp;

use super::structures::*;

pub struct ZipWriter<W: Write + Seek> {
    /// `None` once the archive has been finalized
    inner: Option<W>,
    records: Vec<CentralRecord>,
    compression: CompressionMethod,
}

impl ZipWriter<BufWriter<File>> {
    /// Create (or truncate) an archive file on disk
    pub fn create(path: &Path, compression: CompressionMethod) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), compression))
    }
}

impl<W: Write + Seek> ZipWriter<W> {
    pub fn new(inner: W, compression: CompressionMethod) -> Self {
        Self {
            inner: Some(inner),
            records: Vec::new(),
            compression,
        }
    }

    /// Start a file entry. Write its bytes through the returned handle.
    pub fn start_entry(&mut self, name: &str) -> Result<EntryWriter<'_, W>> {
        let compression = match self.compression {
            CompressionMethod::Unknown(method) => return Err(Error::UnsupportedCompression(method)),
            method => method,
        };
        let inner = self.inner.as_mut().ok_or_else(finished)?;

        let record = new_record(inner, name, compression, 0)?;
        record.write_local_header(inner)?;

        let counter = CountingWriter::new(inner);
        let sink = match compression {
            CompressionMethod::Deflate => {
                EntrySink::Deflated(DeflateEncoder::new(counter, Compression::default()))
            }
            _ => EntrySink::Stored(counter),
        };

        Ok(EntryWriter {
            sink: Some(sink),
            records: &mut self.records,
            record,
            hasher: Hasher::new(),
            size: 0,
        })
    }

    /// Add an empty directory marker. `name` must end with `/`.
    pub fn add_directory(&mut self, name: &str, modified: OffsetDateTime) -> Result<()> {
        let inner = self.inner.as_mut().ok_or_else(finished)?;

        let mut record = new_record(inner, name, CompressionMethod::Stored, ATTR_DIRECTORY)?;
        (record.last_mod_time, record.last_mod_date) = timestamp::to_dos(modified);
        record.write_local_header(inner)?;
        self.records.push(record);
        Ok(())
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the central directory and EOCD, returning the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let mut inner = self.inner.take().ok_or_else(finished)?;
        write_central_directory(&mut inner, &self.records)?;
        Ok(inner)
    }
}

impl<W: Write + Seek> Drop for ZipWriter<W> {
    fn drop(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            if let Err(e) = write_central_directory(&mut inner, &self.records) {
                tracing::warn!("failed to finalize archive: {e}");
            }
        }
    }
}

fn finished() -> Error {
    Error::Io(io::Error::other("archive already finalized"))
}

fn new_record<W: Seek>(
    inner: &mut W,
    name: &str,
    compression_method: CompressionMethod,
    external_attrs: u32,
) -> Result<CentralRecord> {
    let offset = inner.stream_position()?;
    if offset > MAX_U32_FIELD {
        return Err(Error::ArchiveTooLarge);
    }
    let (last_mod_time, last_mod_date) = timestamp::to_dos(timestamp::DOS_EPOCH);
    Ok(CentralRecord {
        file_name: name.to_owned(),
        compression_method,
        crc32: 0,
        compressed_size: 0,
        uncompressed_size: 0,
        last_mod_time,
        last_mod_date,
        external_attrs,
        lfh_offset: offset as u32,
    })
}

fn write_central_directory<W: Write + Seek>(inner: &mut W, records: &[CentralRecord]) -> Result<()> {
    // 0xFFFF would announce a ZIP64 record
    let total = u16::try_from(records.len())
        .ok()
        .filter(|&n| n < 0xFFFF)
        .ok_or(Error::ArchiveTooLarge)?;

    let cd_offset = inner.stream_position()?;
    let mut cd_size = 0u64;
    for record in records {
        record.write_central_header(inner)?;
        cd_size += record.central_header_len();
    }
    if cd_offset > MAX_U32_FIELD || cd_size > MAX_U32_FIELD {
        return Err(Error::ArchiveTooLarge);
    }

    EndOfCentralDirectory::new(total, cd_size as u32, cd_offset as u32).write_to(inner)?;
    inner.flush()?;
    Ok(())
}

/// Counts bytes passed through to the archive
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

enum EntrySink<'a, W: Write> {
    Stored(CountingWriter<&'a mut W>),
    Deflated(DeflateEncoder<CountingWriter<&'a mut W>>),
}

/// Write handle for one file entry.
///
/// The entry is completed by [`EntryWriter::finish`]; dropping the handle
/// completes it as well, ignoring errors.
pub struct EntryWriter<'a, W: Write + Seek> {
    sink: Option<EntrySink<'a, W>>,
    records: &'a mut Vec<CentralRecord>,
    record: CentralRecord,
    hasher: Hasher,
    size: u64,
}

impl<W: Write + Seek> EntryWriter<'_, W> {
    /// Stamp the entry's modification time (clamped to the DOS range).
    pub fn set_modified(&mut self, modified: OffsetDateTime) {
        (self.record.last_mod_time, self.record.last_mod_date) = timestamp::to_dos(modified);
    }

    pub fn finish(mut self) -> Result<()> {
        self.complete()
    }

    fn complete(&mut self) -> Result<()> {
        let Some(sink) = self.sink.take() else {
            return Ok(());
        };
        let counter = match sink {
            EntrySink::Stored(counter) => counter,
            EntrySink::Deflated(encoder) => encoder.finish()?,
        };
        let compressed = counter.count;
        let inner = counter.inner;

        if self.size > MAX_U32_FIELD || compressed > MAX_U32_FIELD {
            return Err(Error::ArchiveTooLarge);
        }
        self.record.crc32 = self.hasher.clone().finalize();
        self.record.compressed_size = compressed as u32;
        self.record.uncompressed_size = self.size as u32;

        inner.seek(SeekFrom::Start(self.record.lfh_offset as u64 + LFH_TIME_OFFSET))?;
        self.record.write_patchable_fields(inner)?;
        inner.seek(SeekFrom::End(0))?;

        self.records.push(self.record.clone());
        Ok(())
    }
}

impl<W: Write + Seek> Write for EntryWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match self.sink.as_mut() {
            Some(EntrySink::Stored(w)) => w.write(buf)?,
            Some(EntrySink::Deflated(w)) => w.write(buf)?,
            None => return Err(io::Error::other("entry already finished")),
        };
        self.hasher.update(&buf[..n]);
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(EntrySink::Stored(w)) => w.flush(),
            Some(EntrySink::Deflated(w)) => w.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write + Seek> Drop for EntryWriter<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            tracing::warn!("failed to complete entry {}: {e}", self.record.file_name);
        }
    }
}
