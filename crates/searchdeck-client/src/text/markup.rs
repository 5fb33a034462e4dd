//! Wiki markup to chat Markdown conversion.
//!
//! Each pass is a regex rewrite applied in a fixed order; later passes rely on
//! headings and emphasis having been collapsed already.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Heading markers from the widest to the narrowest, so `===x===` is never
/// consumed by the `==` rule first.
static HEADING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    (2..=6)
        .rev()
        .map(|width| {
            let marks = "=".repeat(width);
            Regex::new(&format!("{marks}(.+?){marks}")).expect("heading regex")
        })
        .collect()
});

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'''(.*?)'''").expect("bold regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"''(.*?)''").expect("italic regex"));
static PIPED_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^|\]]+)\|([^\]]+)\]\]").expect("piped link regex"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("link regex"));
// Non-greedy and line-bound: `{{a {{b}} c}}` leaves ` c}}` behind.
static TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("template regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("tag regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\*+)([ \t]*)(.*)$").expect("bullet regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("spaces regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank lines regex"));

/// Rewrite encyclopedia markup into the chat display dialect.
#[must_use]
pub fn normalize_wiki(text: &str) -> String {
    let mut result = text.to_string();

    for heading in HEADING_RES.iter() {
        result = heading
            .replace_all(&result, |caps: &Captures| format!("*{}*", caps[1].trim()))
            .into_owned();
    }

    result = BOLD_RE.replace_all(&result, "*${1}*").into_owned();
    result = ITALIC_RE.replace_all(&result, "_${1}_").into_owned();
    result = PIPED_LINK_RE.replace_all(&result, "${2}").into_owned();
    result = LINK_RE.replace_all(&result, "${1}").into_owned();
    result = TEMPLATE_RE.replace_all(&result, "").into_owned();
    result = TAG_RE.replace_all(&result, "").into_owned();
    result = BULLET_RE.replace_all(&result, bullet).into_owned();
    result = SPACES_RE.replace_all(&result, " ").into_owned();
    result = BLANK_LINES_RE.replace_all(&result, "\n\n").into_owned();

    result.trim().to_string()
}

/// A leading `*` run is a list marker, except a single `*` closed later on
/// the same line, which is emphasis left by the heading and bold passes.
fn bullet(caps: &Captures) -> String {
    let (marks, gap, rest) = (&caps[1], &caps[2], &caps[3]);
    if marks.len() == 1 && gap.is_empty() && rest.contains('*') {
        return caps[0].to_string();
    }
    format!("• {rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_become_bold_without_markers() {
        assert_eq!(normalize_wiki("===Heading==="), "*Heading*");
        assert_eq!(normalize_wiki("== История =="), "*История*");
        assert_eq!(normalize_wiki("====== Deep ======"), "*Deep*");
    }

    #[test]
    fn emphasis_quotes_are_converted() {
        assert_eq!(
            normalize_wiki("'''Фотосинтез''' is ''a process''"),
            "*Фотосинтез* is _a process_"
        );
    }

    #[test]
    fn links_keep_label_or_target() {
        assert_eq!(normalize_wiki("[[A|B]]"), "B");
        assert_eq!(normalize_wiki("see [[Хлорофилл]] here"), "see Хлорофилл here");
    }

    #[test]
    fn templates_and_tags_are_removed() {
        assert_eq!(
            normalize_wiki("text{{cite web|url=x}} more<ref>note</ref>"),
            "text morenote"
        );
    }

    #[test]
    fn nested_templates_are_only_partially_stripped() {
        assert_eq!(normalize_wiki("a {{outer {{inner}} tail}} b"), "a tail}} b");
    }

    #[test]
    fn bullets_and_whitespace_are_normalized() {
        let input = "* first\n** second\n\n\n\nafter    gap";
        assert_eq!(normalize_wiki(input), "• first\n• second\n\nafter gap");
    }

    #[test]
    fn bullets_without_space_are_converted() {
        assert_eq!(normalize_wiki("*item\n**nested"), "• item\n• nested");
        assert_eq!(normalize_wiki("*"), "•");
    }

    #[test]
    fn bold_at_line_start_is_not_a_bullet() {
        assert_eq!(
            normalize_wiki("'''Интернет''' is a network"),
            "*Интернет* is a network"
        );
    }

    #[test]
    fn bold_heading_at_line_start_is_not_a_bullet() {
        let input = "== Section ==\n* item";
        assert_eq!(normalize_wiki(input), "*Section*\n• item");
    }

    #[test]
    fn already_normalized_text_is_stable() {
        let once = normalize_wiki("== A ==\n'''b''' [[c|d]]\n\n\n* e");
        assert_eq!(normalize_wiki(&once), once);
    }
}
