use crate::search::pattern::fold;

/// Single-pattern search with a bad-character skip table.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    needle: Vec<u8>,
    /// Rightmost index of each byte value in the needle, -1 if absent
    bad_char: [isize; 256],
    case_insensitive: bool,
}

impl ExactMatcher {
    /// `needle` must already be folded if `case_insensitive` is set.
    pub fn new(needle: &[u8], case_insensitive: bool) -> Self {
        let mut bad_char = [-1isize; 256];
        for (i, &b) in needle.iter().enumerate() {
            bad_char[b as usize] = i as isize;
        }
        Self {
            needle: needle.to_vec(),
            bad_char,
            case_insensitive,
        }
    }

    /// Start offsets of every occurrence, ascending.
    pub fn find_all(&self, text: &[u8]) -> Vec<usize> {
        let mut found = Vec::new();
        let m = self.needle.len();
        let n = text.len();
        if m == 0 || n == 0 || m > n {
            return found;
        }

        let byte = |i: usize| fold(text[i], self.case_insensitive);
        let mut s = 0usize;
        while s <= n - m {
            let mut j = m as isize - 1;
            while j >= 0 && self.needle[j as usize] == byte(s + j as usize) {
                j -= 1;
            }

            if j < 0 {
                found.push(s);
                // bad_char never exceeds m - 1, so this shift is at least 1.
                s += if s + m < n {
                    (m as isize - self.bad_char[byte(s + m) as usize]) as usize
                } else {
                    1
                };
            } else {
                let shift = j - self.bad_char[byte(s + j as usize) as usize];
                s += shift.max(1) as usize;
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"foo bar foo", b"foo", vec![0, 8])]
    #[case(b"aaaa", b"aa", vec![0, 1, 2])]
    #[case(b"abc", b"abcd", vec![])]
    #[case(b"", b"a", vec![])]
    #[case(b"abc", b"", vec![])]
    #[case(b"xxabc", b"abc", vec![2])]
    #[case(b"abcabcab", b"cab", vec![2, 5])]
    fn test_find_all(#[case] text: &[u8], #[case] needle: &[u8], #[case] expected: Vec<usize>) {
        assert_eq!(ExactMatcher::new(needle, false).find_all(text), expected);
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = ExactMatcher::new(b"foo", true);
        assert_eq!(matcher.find_all(b"Foo fOO foo"), vec![0, 4, 8]);
    }

    #[test]
    fn test_non_ascii_bytes() {
        let needle = "été".as_bytes();
        let text = "un été chaud".as_bytes();
        assert_eq!(ExactMatcher::new(needle, false).find_all(text), vec![3]);
    }
}
