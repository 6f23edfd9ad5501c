/// Chunk size for streamed entries.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Entries at or above this size are read as one contiguous view.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Bytes of context kept on each side of a match.
pub const DEFAULT_CONTEXT_RADIUS: usize = 20;

/// Immutable settings for one search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub case_insensitive: bool,
    pub chunk_size: usize,
    pub mmap_threshold: u64,
    pub context_radius: usize,
    /// Worker count override; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            workers: None,
        }
    }
}

impl SearchConfig {
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Clamped to at least one byte.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    pub fn mmap_threshold(mut self, bytes: u64) -> Self {
        self.mmap_threshold = bytes;
        self
    }

    pub fn context_radius(mut self, bytes: usize) -> Self {
        self.context_radius = bytes;
        self
    }

    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Number of worker threads for `entry_count` entries.
    pub fn worker_count(&self, entry_count: usize) -> usize {
        let wanted = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });
        wanted.min(entry_count).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Bad-character skip search for a single pattern
    Exact,
    /// Trie with failure links for several patterns
    Automaton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Whole entry as one contiguous view
    Mapped,
    /// Fixed-size chunks with a carried overlap
    Chunked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub algorithm: Algorithm,
    pub access: Access,
}

/// Pick the matcher and read strategy for one entry.
pub fn plan(pattern_count: usize, entry_size: u64, config: &SearchConfig) -> Plan {
    let algorithm = if pattern_count > 1 {
        Algorithm::Automaton
    } else {
        Algorithm::Exact
    };
    let access = if entry_size >= config.mmap_threshold {
        Access::Mapped
    } else {
        Access::Chunked
    };
    Plan { algorithm, access }
}
