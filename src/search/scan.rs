//! Turns entry content into located occurrences.

use std::io;

use crate::zip::{ChunkStream, EntryContent};

use super::location::{LineCursor, context};
use super::matcher::Matcher;
use super::pattern::PatternSet;
use super::result::MatchOccurrence;

/// Scan one entry's content, whichever way it is being read.
pub fn scan_content(
    content: EntryContent,
    matcher: &Matcher,
    patterns: &PatternSet,
    radius: usize,
) -> io::Result<Vec<MatchOccurrence>> {
    match content {
        EntryContent::Mapped(view) => Ok(scan_slice(&view, matcher, patterns, radius)),
        EntryContent::Chunked(mut stream) => scan_stream(&mut stream, matcher, patterns, radius),
    }
}

/// Scan content that is fully in memory.
pub fn scan_slice(
    content: &[u8],
    matcher: &Matcher,
    patterns: &PatternSet,
    radius: usize,
) -> Vec<MatchOccurrence> {
    let mut cursor = LineCursor::default();
    matcher
        .find_all(content)
        .into_iter()
        .map(|m| {
            let len = patterns.needle(m.pattern).len();
            let (line, column) = cursor.advance(content, 0, m.offset as u64);
            MatchOccurrence {
                pattern: patterns.keyword(m.pattern).to_string(),
                line,
                column,
                offset: m.offset as u64,
                context: context(content, m.offset, len, radius),
            }
        })
        .collect()
}

/// Scan content window by window, carrying the line cursor along.
pub fn scan_stream(
    stream: &mut ChunkStream,
    matcher: &Matcher,
    patterns: &PatternSet,
    radius: usize,
) -> io::Result<Vec<MatchOccurrence>> {
    let mut occurrences = Vec::new();
    let mut cursor = LineCursor::default();

    while let Some(window) = stream.next_window()? {
        for m in matcher.find_all(window.bytes) {
            if m.offset >= window.report_until {
                break;
            }
            let offset = window.start + m.offset as u64;
            let (line, column) = cursor.advance(window.bytes, window.start, offset);
            occurrences.push(MatchOccurrence {
                pattern: patterns.keyword(m.pattern).to_string(),
                line,
                column,
                offset,
                context: context(window.bytes, m.offset, patterns.needle(m.pattern).len(), radius),
            });
        }
        // The next window starts where reporting stopped.
        cursor.advance(
            window.bytes,
            window.start,
            window.start + window.report_until as u64,
        );
    }

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::{Algorithm, SearchConfig};
    use proptest::prelude::*;
    use std::io::Cursor;

    fn patterns(words: &[&str]) -> PatternSet {
        PatternSet::new(words.iter().copied(), &SearchConfig::default()).unwrap()
    }

    fn streamed(data: &[u8], set: &PatternSet, chunk_size: usize) -> Vec<MatchOccurrence> {
        let matcher = Matcher::new(set, Algorithm::Automaton);
        let mut stream = ChunkStream::new(
            Box::new(Cursor::new(data.to_vec())),
            chunk_size,
            set.max_len() - 1,
        );
        scan_stream(&mut stream, &matcher, set, 20).unwrap()
    }

    fn whole(data: &[u8], set: &PatternSet) -> Vec<MatchOccurrence> {
        scan_slice(data, &Matcher::new(set, Algorithm::Automaton), set, 20)
    }

    fn positions(found: &[MatchOccurrence]) -> Vec<(String, u64, u32, u32)> {
        found
            .iter()
            .map(|o| (o.pattern.clone(), o.offset, o.line, o.column))
            .collect()
    }

    #[test]
    fn test_match_across_chunk_boundary() {
        let set = patterns(&["keyword"]);
        let data = b"xxxxx\nkeyword tail";
        let found = streamed(data, &set, 8);
        assert_eq!(positions(&found), vec![("keyword".to_string(), 6, 2, 1)]);
    }

    #[test]
    fn test_foo_bar_foo_columns() {
        let set = patterns(&["foo"]);
        let found = whole(b"foo bar foo", &set);
        assert_eq!(
            positions(&found),
            vec![("foo".to_string(), 0, 1, 1), ("foo".to_string(), 8, 1, 9)]
        );
        assert_eq!(found[0].context, "foo bar foo");
    }

    #[test]
    fn test_mixed_lengths_not_duplicated() {
        let set = patterns(&["ab", "xaby"]);
        let data = b"..xaby..ab..xaby";
        for chunk_size in 4..=data.len() {
            assert_eq!(
                positions(&streamed(data, &set, chunk_size)),
                positions(&whole(data, &set)),
                "chunk size {}",
                chunk_size
            );
        }
    }

    proptest! {
        #[test]
        fn prop_chunked_equals_whole(
            data in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'\n')], 0..400),
            words in proptest::collection::vec("[ab\n]{1,4}", 1..4),
            chunk_extra in 0usize..16,
        ) {
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let set = patterns(&refs);
            let chunk_size = set.max_len() + chunk_extra;
            prop_assert_eq!(
                positions(&streamed(&data, &set, chunk_size)),
                positions(&whole(&data, &set))
            );
        }
    }
}
