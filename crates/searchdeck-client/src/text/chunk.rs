//! Splitting of normalized text into bounded pages.
//!
//! Lengths are counted in characters, not bytes, so Cyrillic text gets the
//! same budget as ASCII.

/// Appended to the last kept page when text is cut short.
pub const TRUNCATION_MARKER: &str = "*Текст сокращен*";

/// Split `text` into chunks of at most `max_length` characters.
///
/// The returned list is never empty. Each chunk is trimmed; the whitespace
/// dropped at chunk boundaries is the only content lost.
#[must_use]
pub fn split(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    let mut rest = text.trim();
    let mut chunks = Vec::new();

    while !rest.is_empty() {
        let Some((window_end, _)) = rest.char_indices().nth(max_length) else {
            chunks.push(rest.to_string());
            break;
        };

        let window = &rest[..window_end];
        let cut = boundary_cut(window, &rest[window_end..]);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head.trim_end().to_string());
        rest = tail.trim_start();
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Split like [`split`] but keep at most `max_chunks` pages, marking the last
/// kept page when anything was dropped.
#[must_use]
pub fn paginate(text: &str, max_length: usize, max_chunks: usize) -> Vec<String> {
    let max_chunks = max_chunks.max(1);
    let mut chunks = split(text, max_length);
    if chunks.len() > max_chunks {
        chunks.truncate(max_chunks);
        if let Some(last) = chunks.last_mut() {
            last.push_str("\n\n");
            last.push_str(TRUNCATION_MARKER);
        }
    }
    chunks
}

/// Byte offset inside `window` where the current chunk should end.
fn boundary_cut(window: &str, following: &str) -> usize {
    let ends_on_space = window.chars().last().is_some_and(char::is_whitespace);
    let followed_by_space = following.chars().next().is_some_and(char::is_whitespace);
    if ends_on_space || followed_by_space {
        return window.len();
    }

    match window.rfind('\n') {
        Some(position) if position > 0 => position,
        _ => match window.rfind(' ') {
            Some(position) if position > 0 => position,
            _ => window.len(),
        },
    }
}
