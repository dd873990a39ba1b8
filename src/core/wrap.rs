//! Line wrapping for the scrollback buffer
//!
//! Splits raw output text into rows that fit the console width. Widths are
//! counted in characters; no display-width or bidi handling is attempted.

/// Split `raw` into rows of at most `width - 1` characters.
///
/// Carriage returns are stripped, then the text is split on `\n`. Every
/// segment yields at least one row (an empty segment is an empty row), and
/// longer segments are chunked greedily without producing a trailing empty
/// chunk.
pub fn wrap(raw: &str, width: usize) -> Vec<String> {
    let limit = width.saturating_sub(1).max(1);
    let cleaned = raw.replace('\r', "");

    let mut rows = Vec::new();
    for segment in cleaned.split('\n') {
        if segment.is_empty() {
            rows.push(String::new());
            continue;
        }

        let mut chunk = String::new();
        let mut count = 0;
        for ch in segment.chars() {
            if count == limit {
                rows.push(std::mem::take(&mut chunk));
                count = 0;
            }
            chunk.push(ch);
            count += 1;
        }
        if !chunk.is_empty() {
            rows.push(chunk);
        }
    }
    rows
}
