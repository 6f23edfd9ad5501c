//! Keyword search over archive entries.
//!
//! [`search_archive`] indexes the archive, then a fixed pool of blocking
//! workers claims entries one at a time, reads each one (mapped or
//! chunked), runs the matcher over it, resolves every hit to a line and
//! column, and publishes the entry's result under a single lock.

pub mod config;
mod dispatcher;
pub mod location;
pub mod matcher;
mod pattern;
mod result;
mod scan;

pub use config::{Access, Algorithm, Plan, SearchConfig, plan};
pub use dispatcher::search_archive;
pub use matcher::{Match, Matcher};
pub use pattern::PatternSet;
pub use result::{AggregateState, MatchOccurrence, SearchResult, SearchSummary};
pub use scan::{scan_content, scan_slice, scan_stream};
