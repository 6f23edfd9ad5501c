//! Fans archive entries out to a fixed pool of blocking workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tokio::runtime::Handle;

use crate::error::{Result, SearchError};
use crate::io::{ArchiveSource, ReadAt};
use crate::zip::{ArchiveIndex, EntryReader, IndexEntry, build_index};

use super::config::{SearchConfig, plan};
use super::matcher::Matcher;
use super::pattern::PatternSet;
use super::result::{AggregateState, SearchResult, SearchSummary};
use super::scan::scan_content;

/// Everything a worker needs, shared read-only across the pool.
struct Job {
    source: ArchiveSource,
    index: ArchiveIndex,
    patterns: PatternSet,
    config: SearchConfig,
    /// The algorithm depends only on the pattern count, so one matcher
    /// serves every entry.
    matcher: Matcher,
    next_entry: AtomicUsize,
    state: AggregateState,
}

/// Search every entry of the archive for the given patterns.
///
/// `observer` is called once per searched entry, in completion order, while
/// the aggregation lock is held. Entry-level failures are logged and
/// collected in [`SearchSummary::failed_entries`]; only archive-level
/// failures return an error.
pub async fn search_archive<F>(
    source: &ArchiveSource,
    patterns: PatternSet,
    config: SearchConfig,
    observer: F,
) -> Result<SearchSummary>
where
    F: Fn(&SearchResult) + Send + Sync + 'static,
{
    let started = Instant::now();
    let index = build_index(source).await?;

    let workers = config.worker_count(index.len());
    tracing::debug!(entries = index.len(), workers, "dispatching search");

    let matcher = Matcher::new(&patterns, plan(patterns.len(), 0, &config).algorithm);

    let job = Arc::new(Job {
        source: source.clone(),
        index,
        patterns,
        config,
        matcher,
        next_entry: AtomicUsize::new(0),
        state: AggregateState::default(),
    });
    let observer = Arc::new(observer);

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let job = job.clone();
            let observer = observer.clone();
            let runtime = Handle::current();
            tokio::task::spawn_blocking(move || run_worker(id, &job, observer.as_ref(), runtime))
        })
        .collect();

    let mut bytes_transferred = 0;
    for handle in handles {
        match handle.await {
            Ok(transferred) => bytes_transferred += transferred,
            Err(e) => tracing::error!("search worker panicked: {}", e),
        }
    }

    // Entries no worker claimed, e.g. because none could open the archive.
    let claimed = job.next_entry.load(Ordering::Relaxed).min(job.index.len());
    for entry in &job.index.entries()[claimed..] {
        job.state.record_failure(
            entry.name.clone(),
            "no search worker could open the archive".to_string(),
        );
    }

    Ok(job.state.take_summary(started.elapsed(), bytes_transferred))
}

/// Pull entries until the cursor runs past the index. Returns the bytes this
/// worker fetched over the network.
fn run_worker<F>(id: usize, job: &Job, observer: &F, runtime: Handle) -> u64
where
    F: Fn(&SearchResult) + ?Sized,
{
    let reader = match runtime.block_on(job.source.open()) {
        Ok(reader) => Arc::new(reader),
        Err(e) => {
            // Remaining entries go to workers that did get a handle.
            tracing::error!(worker = id, "cannot open archive: {:#}", e);
            return 0;
        }
    };
    let entries = EntryReader::new(reader.clone(), runtime);

    loop {
        let i = job.next_entry.fetch_add(1, Ordering::Relaxed);
        let Some(entry) = job.index.entries().get(i) else {
            break;
        };

        match search_entry(job, &entries, entry) {
            Ok(result) => job.state.record(result, observer),
            Err(e) => {
                tracing::error!(entry = %entry.name, "error processing entry: {}", e);
                job.state.record_failure(entry.name.clone(), e.to_string());
            }
        }
    }

    reader.transferred_bytes()
}

fn search_entry<R: ReadAt + 'static>(
    job: &Job,
    entries: &EntryReader<R>,
    entry: &IndexEntry,
) -> Result<SearchResult> {
    let plan = plan(job.patterns.len(), entry.size, &job.config);
    tracing::debug!(entry = %entry.name, ?plan, "searching entry");
    debug_assert_eq!(plan.algorithm, job.matcher.algorithm());

    let content = entries.open(
        entry,
        plan.access,
        job.config.chunk_size,
        job.patterns.max_len().saturating_sub(1),
    )?;
    let occurrences = scan_content(
        content,
        &job.matcher,
        &job.patterns,
        job.config.context_radius,
    )
    .map_err(|e| SearchError::EntryRead {
        name: entry.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(SearchResult {
        entry_name: entry.name.clone(),
        occurrences,
    })
}
