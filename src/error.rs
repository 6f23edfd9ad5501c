use thiserror::Error;

/// Failures surfaced by the search engine.
///
/// Archive-level variants abort a run. Entry-level variants are confined to
/// the entry that produced them; the dispatcher logs them and moves on.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot open archive {archive}: {reason}")]
    ArchiveOpen { archive: String, reason: String },

    #[error("cannot read archive metadata: {0}")]
    ArchiveMetadata(String),

    #[error("cannot advance to the next archive entry: {0}")]
    ArchiveIteration(String),

    #[error("cannot open entry {name}: {reason}")]
    EntryOpen { name: String, reason: String },

    #[error("entry {name} not found in archive")]
    EntryNotFound { name: String },

    #[error("cannot read entry {name}: {reason}")]
    EntryRead { name: String, reason: String },

    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
}

impl SearchError {
    /// Whether the failure is confined to a single archive entry.
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            SearchError::EntryOpen { .. }
                | SearchError::EntryNotFound { .. }
                | SearchError::EntryRead { .. }
        )
    }
}

/// Render an `anyhow` chain on one line for embedding in a [`SearchError`].
pub(crate) fn chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

pub type Result<T> = std::result::Result<T, SearchError>;
