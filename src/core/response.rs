//! Splitting long replies to fit transport limits
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Discord message content limit, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Chunk text into pieces of at most `max_chars` characters
///
/// Prefers splitting between lines; a single line longer than the limit is
/// split on character boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count() + 1;

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }

        if line_len > max_chars {
            let mut piece = String::new();
            for (i, ch) in line.chars().enumerate() {
                if i > 0 && i % max_chars == 0 {
                    chunks.push(std::mem::take(&mut piece));
                }
                piece.push(ch);
            }
            current = piece;
            current.push('\n');
            current_len = current.chars().count();
        } else {
            current.push_str(line);
            current.push('\n');
            current_len += line_len;
        }
    }

    if !current.trim_end().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

/// Chunk text for message content
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}
