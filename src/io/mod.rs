mod http;
mod local;
mod range;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use range::RangeReader;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Filesystem path backing this source, if it can be memory-mapped
    fn local_path(&self) -> Option<&Path> {
        None
    }
}

/// Where an archive lives.
///
/// Each worker calls [`ArchiveSource::open`] for its own handle, so no file
/// descriptor or HTTP client is shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(String),
}

impl ArchiveSource {
    /// Classify a command-line argument as a URL or a local path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ArchiveSource::Remote(location.to_string())
        } else {
            ArchiveSource::Local(PathBuf::from(location))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ArchiveSource::Remote(_))
    }

    /// Open a new read handle on the archive.
    pub async fn open(&self) -> Result<SourceReader> {
        match self {
            ArchiveSource::Local(path) => Ok(SourceReader::Local(LocalFileReader::new(path)?)),
            ArchiveSource::Remote(url) => {
                Ok(SourceReader::Remote(HttpRangeReader::new(url.clone()).await?))
            }
        }
    }
}

impl std::fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveSource::Local(path) => write!(f, "{}", path.display()),
            ArchiveSource::Remote(url) => f.write_str(url),
        }
    }
}

/// An open handle on either kind of [`ArchiveSource`].
pub enum SourceReader {
    Local(LocalFileReader),
    Remote(HttpRangeReader),
}

impl SourceReader {
    /// Bytes pulled over the network so far (zero for local files).
    pub fn transferred_bytes(&self) -> u64 {
        match self {
            SourceReader::Local(_) => 0,
            SourceReader::Remote(reader) => reader.transferred_bytes(),
        }
    }
}

#[async_trait]
impl ReadAt for SourceReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self {
            SourceReader::Local(reader) => reader.read_at(offset, buf).await,
            SourceReader::Remote(reader) => reader.read_at(offset, buf).await,
        }
    }

    fn size(&self) -> u64 {
        match self {
            SourceReader::Local(reader) => reader.size(),
            SourceReader::Remote(reader) => reader.size(),
        }
    }

    fn local_path(&self) -> Option<&Path> {
        match self {
            SourceReader::Local(reader) => reader.local_path(),
            SourceReader::Remote(reader) => reader.local_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert!(ArchiveSource::parse("https://example.com/a.zip").is_remote());
        assert!(ArchiveSource::parse("http://example.com/a.zip").is_remote());
        assert_eq!(
            ArchiveSource::parse("data/a.zip"),
            ArchiveSource::Local(PathBuf::from("data/a.zip"))
        );
    }
}
