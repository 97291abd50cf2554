//! ZIP archive reading and writing.
//!
//! ## Architecture
//!
//! - [`structures`]: records of the ZIP format (EOCD, file headers, etc.)
//! - [`parser`]: low-level parsing of those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`reader`]: entry listing and streaming decompression
//! - [`writer`]: sequential archive creation
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions when reading
//! - STORED (no compression) and DEFLATE methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - The writer does not emit ZIP64 records; entries and archives are capped at 4 GiB

pub mod parser;
pub mod reader;
pub mod structures;
pub mod writer;

pub use parser::ZipParser;
pub use reader::{EntryReader, ZipReader};
pub use structures::*;
pub use writer::{EntryWriter, ZipWriter};
