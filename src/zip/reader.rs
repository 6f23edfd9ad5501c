//! Entry content access: one contiguous view, or chunks with overlap.

use std::fs::File;
use std::io::{self, Read};
use std::ops::Deref;
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use memmap2::{Mmap, MmapOptions};
use tokio::runtime::Handle;

use crate::error::{Result, SearchError, chain};
use crate::io::{RangeReader, ReadAt};
use crate::search::config::Access;

use super::index::IndexEntry;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Whole entry content in one slice.
pub enum MappedView {
    /// Raw byte range of a stored entry, mapped from the archive file
    Mmap(Mmap),
    /// Inflated or downloaded content
    Buffer(Vec<u8>),
}

impl Deref for MappedView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            MappedView::Mmap(map) => map,
            MappedView::Buffer(buf) => buf,
        }
    }
}

/// A window handed out by [`ChunkStream`].
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    /// Carried tail of the previous window followed by the new chunk
    pub bytes: &'a [u8],
    /// Content offset of `bytes[0]`
    pub start: u64,
    /// Matches starting at or after this index belong to the next window,
    /// which carries these bytes forward.
    pub report_until: usize,
}

/// Lazily reads an entry in fixed-size chunks, prefixing each chunk with
/// the last `overlap` bytes of the previous window.
///
/// A match that starts in the carried tail is reported by the window that
/// carries it, so every match is seen exactly once and in offset order.
/// No match is lost at a boundary as long as `overlap` is at least the
/// longest pattern length minus one and no pattern is longer than
/// `chunk_size`.
pub struct ChunkStream {
    source: Box<dyn Read>,
    chunk_size: usize,
    overlap: usize,
    buf: Vec<u8>,
    start: u64,
    finished: bool,
}

impl ChunkStream {
    pub fn new(source: Box<dyn Read>, chunk_size: usize, overlap: usize) -> Self {
        Self {
            source,
            chunk_size: chunk_size.max(1),
            overlap,
            buf: Vec::new(),
            start: 0,
            finished: false,
        }
    }

    /// Next window, or `None` once the entry is exhausted.
    pub fn next_window(&mut self) -> io::Result<Option<Window<'_>>> {
        if self.finished {
            return Ok(None);
        }

        let carry = self.overlap.min(self.buf.len());
        let consumed = self.buf.len() - carry;
        self.buf.drain(..consumed);
        self.start += consumed as u64;

        let read = self
            .source
            .by_ref()
            .take(self.chunk_size as u64)
            .read_to_end(&mut self.buf)?;

        let report_until = if read < self.chunk_size {
            self.finished = true;
            if self.buf.is_empty() {
                return Ok(None);
            }
            self.buf.len()
        } else {
            self.buf.len() - self.overlap.min(self.buf.len())
        };

        Ok(Some(Window {
            bytes: &self.buf,
            start: self.start,
            report_until,
        }))
    }
}

pub enum EntryContent {
    Mapped(MappedView),
    Chunked(ChunkStream),
}

/// Opens index entries of one archive handle.
///
/// Meant to be owned by a single blocking worker thread: async parser calls
/// are driven to completion on `handle`.
pub struct EntryReader<R: ReadAt> {
    parser: ZipParser<R>,
    handle: Handle,
}

impl<R: ReadAt + 'static> EntryReader<R> {
    pub fn new(reader: Arc<R>, handle: Handle) -> Self {
        Self {
            parser: ZipParser::new(reader),
            handle,
        }
    }

    /// Open `entry` for the given access strategy. Chunked content carries
    /// `overlap` bytes between chunks.
    pub fn open(
        &self,
        entry: &IndexEntry,
        access: Access,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<EntryContent> {
        let header = self.locate(entry)?;

        if header.is_encrypted() {
            return Err(open_error(entry, "encrypted entries are not supported"));
        }
        if let CompressionMethod::Unknown(method) = header.compression_method {
            return Err(open_error(
                entry,
                format!("unsupported compression method {}", method),
            ));
        }
        if header.is_directory || header.uncompressed_size == 0 {
            return Ok(EntryContent::Mapped(MappedView::Buffer(Vec::new())));
        }

        let data_offset = self
            .handle
            .block_on(self.parser.get_data_offset(&header))
            .map_err(|e| open_error(entry, chain(&e)))?;

        match access {
            Access::Mapped => self
                .contiguous(entry, &header, data_offset)
                .map(EntryContent::Mapped),
            Access::Chunked => {
                let source = self.decoded(&header, data_offset);
                Ok(EntryContent::Chunked(ChunkStream::new(
                    source, chunk_size, overlap,
                )))
            }
        }
    }

    /// Resolve the central header by offset token, falling back to a name
    /// lookup when the token is missing or stale.
    fn locate(&self, entry: &IndexEntry) -> Result<ZipFileEntry> {
        if entry.offset != 0 {
            match self.handle.block_on(self.parser.read_entry_at(entry.offset)) {
                Ok(header) if header.file_name == entry.name => return Ok(header),
                Ok(header) => tracing::warn!(
                    entry = %entry.name,
                    found = %header.file_name,
                    "offset points at another entry, locating by name"
                ),
                Err(e) => tracing::warn!(
                    entry = %entry.name,
                    error = %chain(&e),
                    "unable to set offset, locating by name"
                ),
            }
        }

        match self.handle.block_on(self.parser.locate(&entry.name)) {
            Ok(Some(header)) => Ok(header),
            Ok(None) => Err(SearchError::EntryNotFound {
                name: entry.name.clone(),
            }),
            Err(e) => Err(open_error(entry, chain(&e))),
        }
    }

    /// Uncompressed byte stream of the entry.
    fn decoded(&self, header: &ZipFileEntry, data_offset: u64) -> Box<dyn Read> {
        let raw = RangeReader::new(
            self.parser.reader().clone(),
            self.handle.clone(),
            data_offset,
            header.compressed_size,
        );
        match header.compression_method {
            CompressionMethod::Deflate => {
                Box::new(DeflateDecoder::new(raw).take(header.uncompressed_size))
            }
            _ => Box::new(raw.take(header.uncompressed_size)),
        }
    }

    fn contiguous(
        &self,
        entry: &IndexEntry,
        header: &ZipFileEntry,
        data_offset: u64,
    ) -> Result<MappedView> {
        let expected = header.uncompressed_size;
        let read_error = |actual: u64| SearchError::EntryRead {
            name: entry.name.clone(),
            reason: format!("expected {} bytes, got {}", expected, actual),
        };

        if header.compression_method == CompressionMethod::Stored {
            if header.compressed_size != expected {
                return Err(read_error(header.compressed_size));
            }
            if let Some(path) = self.parser.reader().local_path() {
                let map = File::open(path).and_then(|file| {
                    // SAFETY: the mapping is read-only and the archive is not
                    // modified while a search runs.
                    unsafe {
                        MmapOptions::new()
                            .offset(data_offset)
                            .len(expected as usize)
                            .map(&file)
                    }
                });
                let map = map.map_err(|e| SearchError::EntryRead {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                })?;
                if map.len() as u64 != expected {
                    return Err(read_error(map.len() as u64));
                }
                verify_crc(entry, header, &map)?;
                return Ok(MappedView::Mmap(map));
            }
        }

        // The size comes from the central directory and may be bogus.
        let mut buf = Vec::new();
        usize::try_from(expected)
            .ok()
            .and_then(|len| buf.try_reserve_exact(len).ok())
            .ok_or_else(|| SearchError::EntryRead {
                name: entry.name.clone(),
                reason: format!("cannot allocate {} bytes for entry content", expected),
            })?;
        self.decoded(header, data_offset)
            .read_to_end(&mut buf)
            .map_err(|e| SearchError::EntryRead {
                name: entry.name.clone(),
                reason: e.to_string(),
            })?;
        if buf.len() as u64 != expected {
            return Err(read_error(buf.len() as u64));
        }
        verify_crc(entry, header, &buf)?;
        Ok(MappedView::Buffer(buf))
    }
}

/// Whole-content reads are checked against the central directory CRC.
fn verify_crc(entry: &IndexEntry, header: &ZipFileEntry, content: &[u8]) -> Result<()> {
    let mut crc = Crc::new();
    crc.update(content);
    if crc.sum() != header.crc32 {
        return Err(SearchError::EntryRead {
            name: entry.name.clone(),
            reason: format!(
                "CRC mismatch: expected {:08x}, got {:08x}",
                header.crc32,
                crc.sum()
            ),
        });
    }
    Ok(())
}

fn open_error(entry: &IndexEntry, reason: impl Into<String>) -> SearchError {
    SearchError::EntryOpen {
        name: entry.name.clone(),
        reason: reason.into(),
    }
}
