//! Substring matching over byte spans.
//!
//! Two strategies share one contract: every occurrence, as
//! `(pattern index, start offset)`, ascending by offset. A single keyword
//! uses the bad-character skip search; several keywords go through the
//! automaton so the text is scanned once regardless of pattern count.

mod automaton;
mod exact;

pub use automaton::Automaton;
pub use exact::ExactMatcher;

use super::config::Algorithm;
use super::pattern::PatternSet;

/// One occurrence of `pattern` starting at byte `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub pattern: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(ExactMatcher),
    Automaton(Automaton),
}

impl Matcher {
    /// Build the requested strategy. `Exact` only applies to a single
    /// pattern; larger sets always get the automaton.
    pub fn new(patterns: &PatternSet, algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Exact if patterns.len() == 1 => Matcher::Exact(ExactMatcher::new(
                patterns.needle(0),
                patterns.case_insensitive(),
            )),
            _ => Matcher::Automaton(Automaton::new(
                patterns.needles(),
                patterns.case_insensitive(),
            )),
        }
    }

    pub fn find_all(&self, text: &[u8]) -> Vec<Match> {
        match self {
            Matcher::Exact(matcher) => matcher
                .find_all(text)
                .into_iter()
                .map(|offset| Match { pattern: 0, offset })
                .collect(),
            Matcher::Automaton(automaton) => automaton.find_all(text),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Matcher::Exact(_) => Algorithm::Exact,
            Matcher::Automaton(_) => Algorithm::Automaton,
        }
    }
}
