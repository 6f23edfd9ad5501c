//! ZIP archive parsing, indexing and entry access.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (EOCD, ZIP64 records, entry metadata)
//! - [`parser`]: low-level parsing of those records from any [`ReadAt`](crate::io::ReadAt) source
//! - [`index`]: the name-keyed entry index built once per search
//! - [`reader`]: entry content as one contiguous view or as overlapping chunks
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first, then the Central Directory, so an archive can be
//! indexed without touching entry data.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod index;
mod parser;
mod reader;
mod structures;

pub use index::{ArchiveIndex, IndexEntry, build_index, index_reader};
pub use parser::{CentralDirectory, ZipParser};
pub use reader::{ChunkStream, EntryContent, EntryReader, MappedView, Window};
pub use structures::*;
