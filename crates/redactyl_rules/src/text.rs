//! Line and column arithmetic over scanned content.

/// Returns the byte offset of the start of the line containing `byte_offset`.
#[must_use]
pub fn find_line_start(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset.min(content.len())]
        .rfind('\n')
        .map_or(0, |pos| pos + 1)
}

/// Returns the byte offset just past the end of the line containing
/// `byte_offset` (excluding the newline itself).
#[must_use]
pub fn find_line_end(content: &str, byte_offset: usize) -> usize {
    let clamped = byte_offset.min(content.len());
    content[clamped..].find('\n').map_or(content.len(), |pos| clamped + pos)
}

/// Computes the 1-based `(line, column)` of a byte offset.
#[must_use]
pub fn line_col_at(content: &str, byte_offset: usize) -> (u32, u32) {
    let clamped = byte_offset.min(content.len());
    let line = content[..clamped].bytes().filter(|&b| b == b'\n').count() + 1;
    let column = clamped - find_line_start(content, clamped) + 1;

    #[expect(
        clippy::cast_possible_truncation,
        reason = "scanned content is size-capped far below u32::MAX lines/columns"
    )]
    (line as u32, column as u32)
}
