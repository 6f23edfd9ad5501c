use crate::error::{Result, SearchError};

use super::config::SearchConfig;

/// Keywords prepared for matching.
///
/// Needles are stored ASCII-lowercased when the run is case-insensitive;
/// content bytes are folded the same way as they are compared.
#[derive(Debug, Clone)]
pub struct PatternSet {
    keywords: Vec<String>,
    needles: Vec<Vec<u8>>,
    case_insensitive: bool,
}

impl PatternSet {
    pub fn new<I, S>(keywords: I, config: &SearchConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        if keywords.is_empty() {
            return Err(SearchError::InvalidPattern(
                "at least one keyword is required".to_string(),
            ));
        }
        if keywords.iter().any(|k| k.is_empty()) {
            return Err(SearchError::InvalidPattern(
                "keywords must not be empty".to_string(),
            ));
        }

        let case_insensitive = config.case_insensitive;
        let needles = keywords
            .iter()
            .map(|k| {
                k.bytes()
                    .map(|b| fold(b, case_insensitive))
                    .collect::<Vec<u8>>()
            })
            .collect();

        Ok(Self {
            keywords,
            needles,
            case_insensitive,
        })
    }

    /// Keyword as the user typed it.
    pub fn keyword(&self, index: usize) -> &str {
        &self.keywords[index]
    }

    /// Folded bytes actually searched for.
    pub fn needle(&self, index: usize) -> &[u8] {
        &self.needles[index]
    }

    pub fn needles(&self) -> &[Vec<u8>] {
        &self.needles
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.needles.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

#[inline]
pub(crate) fn fold(byte: u8, case_insensitive: bool) -> u8 {
    if case_insensitive {
        byte.to_ascii_lowercase()
    } else {
        byte
    }
}
