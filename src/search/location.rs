//! Byte offset to line/column conversion and context extraction.

use memchr::memchr_iter;

/// Running line position over content that arrives front to back.
///
/// Callers advance it to increasing offsets only; bytes between the
/// previous target and the new one must be present in the window handed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCursor {
    /// Absolute offset the cursor has counted up to
    position: u64,
    /// 1-based line at `position`
    line: u32,
    /// Absolute offset where the current line starts
    line_start: u64,
}

impl Default for LineCursor {
    fn default() -> Self {
        Self {
            position: 0,
            line: 1,
            line_start: 0,
        }
    }
}

impl LineCursor {
    /// Count newlines up to `target` and return its 1-based (line, column).
    ///
    /// `window` holds content starting at absolute offset `window_start`,
    /// which must not lie past the cursor's current position.
    pub fn advance(&mut self, window: &[u8], window_start: u64, target: u64) -> (u32, u32) {
        debug_assert!(window_start <= self.position);
        if target > self.position {
            let from = (self.position - window_start) as usize;
            let to = ((target - window_start) as usize).min(window.len());
            for nl in memchr_iter(b'\n', &window[from.min(to)..to]) {
                self.line = self.line.saturating_add(1);
                self.line_start = window_start + (from + nl) as u64 + 1;
            }
            self.position = target;
        }
        let column = u32::try_from(target - self.line_start + 1).unwrap_or(u32::MAX);
        (self.line, column)
    }
}

/// Bytes around a match, clipped to the slice bounds.
pub fn context(content: &[u8], offset: usize, pattern_len: usize, radius: usize) -> String {
    let start = offset.saturating_sub(radius).min(content.len());
    let end = offset
        .saturating_add(pattern_len)
        .saturating_add(radius)
        .min(content.len());
    String::from_utf8_lossy(&content[start..end.max(start)]).into_owned()
}

/// Resolve a match in fully available content to (line, column, context).
pub fn resolve(
    content: &[u8],
    offset: usize,
    pattern_len: usize,
    radius: usize,
) -> (u32, u32, String) {
    let mut cursor = LineCursor::default();
    let (line, column) = cursor.advance(content, 0, offset as u64);
    (line, column, context(content, offset, pattern_len, radius))
}
