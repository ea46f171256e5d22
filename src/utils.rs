/// Calculates the byte offset of a 1-based line and column in the source text.
/// Positions past the end of a line or of the text are clamped to the end.
pub fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let mut current_line = 1;
    let mut current_column = 1;
    for (offset, c) in source.char_indices() {
        if current_line == line && (current_column == column || c == '\n') {
            return offset;
        }
        if current_line > line {
            return offset;
        }
        if c == '\n' {
            current_line += 1;
            current_column = 1;
        } else {
            current_column += 1;
        }
    }
    source.len()
}

/// The length in bytes of the token starting at `offset`: everything up to the
/// next whitespace or the end of the line.
pub fn token_length(source: &str, offset: usize) -> usize {
    source
        .get(offset..)
        .map_or(0, |rest| rest.find(char::is_whitespace).unwrap_or(rest.len()))
}
