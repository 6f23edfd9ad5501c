//! # zipseek
//!
//! Keyword search across every entry of a ZIP archive, without extracting
//! the archive first.
//!
//! The archive's central directory is indexed once, then a fixed pool of
//! worker threads claims entries and scans them. Large entries are read as
//! one contiguous view (memory-mapped when stored uncompressed in a local
//! file); smaller ones are streamed in 1 MiB chunks that carry an overlap,
//! so a keyword spanning two chunks is still found. Each hit is reported
//! with its line, column and surrounding context.
//!
//! - Local archives and HTTP/HTTPS URLs (via Range requests)
//! - ZIP64, STORED and DEFLATE entries
//! - Single keywords use a bad-character skip search; several keywords are
//!   matched in one pass with a failure-link automaton
//! - Optional ASCII case-insensitive matching
//!
//! ## Example
//!
//! ```no_run
//! use zipseek::{ArchiveSource, PatternSet, SearchConfig, search_archive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = ArchiveSource::parse("logs.zip");
//!     let config = SearchConfig::default().case_insensitive(true);
//!     let patterns = PatternSet::new(["timeout", "refused"], &config)?;
//!
//!     let summary = search_archive(&source, patterns, config, |result| {
//!         println!("{}: {}", result.entry_name, result.occurrences.len());
//!     })
//!     .await?;
//!
//!     println!("total: {}", summary.total_matches);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod search;
pub mod zip;

pub use cli::Cli;
pub use error::SearchError;
pub use io::{ArchiveSource, HttpRangeReader, LocalFileReader, ReadAt, SourceReader};
pub use search::{
    MatchOccurrence, PatternSet, SearchConfig, SearchResult, SearchSummary, search_archive,
};
pub use zip::{ArchiveIndex, IndexEntry, build_index};
