use std::sync::Mutex;
use std::time::Duration;

/// One keyword hit inside an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOccurrence {
    pub pattern: String,
    /// 1-based
    pub line: u32,
    /// 1-based byte column
    pub column: u32,
    /// Byte offset inside the uncompressed entry
    pub offset: u64,
    pub context: String,
}

/// All occurrences found in one archive entry, ascending by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub entry_name: String,
    pub occurrences: Vec<MatchOccurrence>,
}

/// Outcome of a whole-archive search.
#[derive(Debug, Default)]
pub struct SearchSummary {
    pub total_matches: u64,
    /// In completion order
    pub results: Vec<SearchResult>,
    /// Entries that could not be searched, with the reason
    pub failed_entries: Vec<(String, String)>,
    pub elapsed: Duration,
    /// Network bytes read by all workers (zero for local archives)
    pub bytes_transferred: u64,
}

impl SearchSummary {
    pub fn result(&self, entry_name: &str) -> Option<&SearchResult> {
        self.results.iter().find(|r| r.entry_name == entry_name)
    }
}

#[derive(Debug, Default)]
struct Aggregate {
    total_matches: u64,
    results: Vec<SearchResult>,
    failed_entries: Vec<(String, String)>,
}

/// State shared by all workers of one run.
///
/// The count, the result list and the observer callback are all handled
/// under the same lock, so one entry's output is never interleaved with
/// another's and the count always agrees with the stored results.
#[derive(Debug, Default)]
pub struct AggregateState {
    inner: Mutex<Aggregate>,
}

impl AggregateState {
    /// Publish a finished entry. `observer` runs while the lock is held.
    pub fn record<F>(&self, result: SearchResult, observer: &F)
    where
        F: Fn(&SearchResult) + ?Sized,
    {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        observer(&result);
        inner.total_matches += result.occurrences.len() as u64;
        inner.results.push(result);
    }

    pub fn record_failure(&self, entry_name: String, reason: String) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.failed_entries.push((entry_name, reason));
    }

    /// Move the collected results out, once every worker has finished.
    pub fn take_summary(&self, elapsed: Duration, bytes_transferred: u64) -> SearchSummary {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let inner = std::mem::take(&mut *guard);
        SearchSummary {
            total_matches: inner.total_matches,
            results: inner.results,
            failed_entries: inner.failed_entries,
            elapsed,
            bytes_transferred,
        }
    }
}
