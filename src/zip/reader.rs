use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use crc32fast::Hasher;
use flate2::read::DeflateDecoder;

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt, SliceReader};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Sequential reader over the entries of a ZIP archive
pub struct ZipReader<R: ReadAt> {
    parser: ZipParser<R>,
}

impl ZipReader<LocalFileReader> {
    /// Open an archive on disk
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(LocalFileReader::new(path)?))
    }
}

impl<R: ReadAt> ZipReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries, in central directory order
    pub fn entries(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Open a stream over an entry's uncompressed bytes.
    ///
    /// The stream checks length and CRC-32 once the end is reached and fails
    /// with [`ErrorKind::InvalidData`] on mismatch. Directory markers yield an
    /// empty stream.
    pub fn open_entry(&self, entry: &ZipFileEntry) -> Result<EntryReader<'_, R>> {
        let data_offset = self.parser.get_data_offset(entry)?;
        let raw = SliceReader::new(self.parser.reader(), data_offset, entry.compressed_size);

        let inner = match entry.compression_method {
            CompressionMethod::Stored => EntryData::Stored(raw),
            CompressionMethod::Deflate => {
                EntryData::Deflated(Box::new(DeflateDecoder::new(BufReader::new(raw))))
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::UnsupportedCompression(method));
            }
        };

        Ok(EntryReader {
            inner,
            hasher: Hasher::new(),
            read: 0,
            expected_size: entry.uncompressed_size,
            expected_crc: entry.crc32,
        })
    }

    /// Read a whole entry into memory
    pub fn read_to_vec(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
        self.open_entry(entry)?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

enum EntryData<'a, R: ReadAt> {
    Stored(SliceReader<'a, R>),
    Deflated(Box<DeflateDecoder<BufReader<SliceReader<'a, R>>>>),
}

/// Uncompressed bytes of one entry
pub struct EntryReader<'a, R: ReadAt> {
    inner: EntryData<'a, R>,
    hasher: Hasher,
    read: u64,
    expected_size: u64,
    expected_crc: u32,
}

impl<R: ReadAt> EntryReader<'_, R> {
    fn verify(&self) -> io::Result<()> {
        if self.read != self.expected_size {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "entry length mismatch: expected {} bytes, got {}",
                    self.expected_size, self.read
                ),
            ));
        }
        if self.hasher.clone().finalize() != self.expected_crc {
            return Err(io::Error::new(ErrorKind::InvalidData, "entry CRC-32 mismatch"));
        }
        Ok(())
    }
}

impl<R: ReadAt> Read for EntryReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = match &mut self.inner {
            EntryData::Stored(r) => r.read(buf)?,
            EntryData::Deflated(r) => r.read(buf)?,
        };
        if n == 0 {
            self.verify()?;
        } else {
            self.hasher.update(&buf[..n]);
            self.read += n as u64;
            if self.read > self.expected_size {
                return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    "entry is longer than its recorded size",
                ));
            }
        }
        Ok(n)
    }
}
