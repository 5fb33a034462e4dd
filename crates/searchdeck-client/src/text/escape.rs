use scraper::Html;

/// Characters with meaning in Telegram legacy Markdown.
const RESERVED: [char; 4] = ['_', '*', '`', '['];

/// Escape `text` so it renders literally inside a Markdown message.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Wrap `text` in `marker` emphasis (`*` bold, `_` italic).
///
/// Escapes are not honored inside an entity, so the span is closed before
/// each reserved character and reopened after it: `a*b` becomes `*a*\**b*`.
#[must_use]
pub fn emphasize(text: &str, marker: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut span = String::new();
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            push_span(&mut out, &span, marker);
            span.clear();
            out.push('\\');
            out.push(ch);
        } else {
            span.push(ch);
        }
    }
    push_span(&mut out, &span, marker);
    out
}

/// Emphasize `span`, keeping surrounding whitespace outside the markers.
fn push_span(out: &mut String, span: &str, marker: char) {
    let inner = span.trim();
    if inner.is_empty() {
        out.push_str(span);
        return;
    }
    let start = span.len() - span.trim_start().len();
    let end = start + inner.len();
    out.push_str(&span[..start]);
    out.push(marker);
    out.push_str(inner);
    out.push(marker);
    out.push_str(&span[end..]);
}

/// Decode HTML entities (`&quot;`, `&#39;`, ...) found in API text fields.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<String>()
}

/// Collapse all whitespace runs into single spaces.
#[must_use]
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `limit` characters, adding `...` when shortened.
#[must_use]
pub fn ellipsize(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
