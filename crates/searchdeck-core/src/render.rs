//! Page composition under the chat message ceiling.

use searchdeck_client::text::{ellipsize, emphasize, escape_markdown, TRUNCATION_MARKER};
use searchdeck_client::types::{ContentResult, ProviderType};

use crate::actions::Action;
use crate::messages;
use crate::store::PageView;
use crate::transport::{plain_fallback, Control, OutgoingMessage};

/// Telegram's message length limit, in characters.
pub const MESSAGE_LIMIT: usize = 4096;
/// Extra characters dropped from an overflowing body so the marker fits.
pub const OVERFLOW_MARGIN: usize = 100;
/// Length of the first-paragraph excerpt in a photo caption.
pub const CAPTION_EXCERPT_LENGTH: usize = 300;

/// A page in both renderings: Markdown first, plain text for the retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub message: OutgoingMessage,
    pub fallback: OutgoingMessage,
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    limit: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(MESSAGE_LIMIT)
    }
}

impl Renderer {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Render `view` as a text page.
    #[must_use]
    pub fn page(&self, view: &PageView) -> RenderedPage {
        let header = header(view);
        let footer = footer(view);
        let text = self.fit(&header, view.body(), &footer);
        finish(OutgoingMessage::markdown(text).with_controls(controls(view)))
    }

    /// Render the first page of a freshly started search. Encyclopedia pages
    /// with a thumbnail become a photo with a short caption.
    #[must_use]
    pub fn first_page(&self, view: &PageView) -> RenderedPage {
        let thumbnail = view.content.thumbnail.clone();
        match thumbnail {
            Some(photo) if view.is_first() && view.article_id.is_none() => {
                let page = self.page(view);
                let caption = caption(view);
                RenderedPage {
                    message: OutgoingMessage::markdown(caption)
                        .with_photo(Some(photo))
                        .with_controls(controls(view)),
                    fallback: page.fallback,
                }
            }
            _ => self.page(view),
        }
    }

    /// One message listing a provider's results with a numbered button per
    /// cached article.
    ///
    /// Entries are added whole while they fit. An entry too long for the
    /// remaining room is reduced to its title and link; once even that does
    /// not fit the listing stops and ends with the truncation marker.
    #[must_use]
    pub fn overview(
        &self,
        provider: ProviderType,
        subject: &str,
        entries: &[(String, ContentResult)],
    ) -> RenderedPage {
        let marker = format!("\n\n{TRUNCATION_MARKER}");
        let marker_length = marker.chars().count();

        let mut text = format!(
            "{}: {}",
            emphasize(provider.name(), '*'),
            escape_markdown(subject)
        );
        let mut length = text.chars().count();
        let mut blocks: Vec<(String, usize)> = Vec::with_capacity(entries.len());
        let mut truncated = false;

        for (position, (_, result)) in entries.iter().enumerate() {
            let number = position + 1;
            let full = overview_entry(number, provider, &result.content, &result.url);
            let full_length = full.chars().count();
            if length + full_length <= self.limit {
                length += full_length;
                blocks.push((full, full_length));
                continue;
            }

            truncated = true;
            let compact = overview_entry(
                number,
                provider,
                &emphasize(&ellipsize(&result.title, CAPTION_EXCERPT_LENGTH), '*'),
                &result.url,
            );
            let compact_length = compact.chars().count();
            if length + compact_length > self.limit {
                break;
            }
            length += compact_length;
            blocks.push((compact, compact_length));
        }

        if truncated {
            while length + marker_length > self.limit {
                let Some((_, dropped)) = blocks.pop() else {
                    break;
                };
                length -= dropped;
            }
        }

        let mut buttons = Vec::with_capacity(blocks.len());
        for ((block, _), (id, _)) in blocks.iter().zip(entries) {
            text.push_str(block);
            buttons.push(Control {
                label: format!("{} {}", messages::OPEN_BUTTON, buttons.len() + 1),
                token: Action::Read(id.clone()).to_token(),
            });
        }
        if truncated {
            text.push_str(&marker);
        }

        let text = hard_cut(&text, self.limit);
        finish(OutgoingMessage::markdown(text).with_controls(buttons))
    }

    fn fit(&self, header: &str, body: &str, footer: &str) -> String {
        let composed = format!("{header}{body}{footer}");
        let total = composed.chars().count();
        if total <= self.limit {
            return composed;
        }

        let excess = total - self.limit;
        let keep = body.chars().count().saturating_sub(excess + OVERFLOW_MARGIN);
        let cut: String = body.chars().take(keep).collect();
        let recomposed = format!(
            "{header}{}\n\n{TRUNCATION_MARKER}{footer}",
            cut.trim_end()
        );
        hard_cut(&recomposed, self.limit)
    }
}

fn finish(message: OutgoingMessage) -> RenderedPage {
    let fallback = plain_fallback(&message, plain_text(&message.text));
    RenderedPage { message, fallback }
}

fn header(view: &PageView) -> String {
    let title = emphasize(&view.content.title, '*');
    if view.article_id.is_some() {
        format!("{title}\n{}\n\n", emphasize(view.content.source(), '_'))
    } else {
        format!("{title}\n\n")
    }
}

fn footer(view: &PageView) -> String {
    format!(
        "\n\n{}\n[{}]({})",
        page_counter(view),
        view.content.provider.link_label(),
        view.content.url
    )
}

fn page_counter(view: &PageView) -> String {
    format!(
        "Страница {} из {}",
        view.index + 1,
        view.content.chunk_count()
    )
}

fn caption(view: &PageView) -> String {
    let first_paragraph = view
        .content
        .chunk(0)
        .and_then(|chunk| chunk.split("\n\n").next())
        .unwrap_or_default();
    format!(
        "{}{}{}",
        header(view),
        ellipsize(first_paragraph, CAPTION_EXCERPT_LENGTH),
        footer(view)
    )
}

fn controls(view: &PageView) -> Vec<Control> {
    let mut controls = Vec::with_capacity(2);
    if !view.is_first() {
        let action = match &view.article_id {
            Some(id) => Action::ArticlePrev {
                id: id.clone(),
                index: view.index,
            },
            None => Action::Prev(view.index),
        };
        controls.push(Control {
            label: messages::PREV_BUTTON.to_string(),
            token: action.to_token(),
        });
    }
    if !view.is_last() {
        let action = match &view.article_id {
            Some(id) => Action::ArticleNext {
                id: id.clone(),
                index: view.index,
            },
            None => Action::Next(view.index),
        };
        controls.push(Control {
            label: messages::NEXT_BUTTON.to_string(),
            token: action.to_token(),
        });
    }
    controls
}

fn overview_entry(number: usize, provider: ProviderType, content: &str, url: &str) -> String {
    format!("\n\n{number}. {content}\n[{}]({url})", provider.link_label())
}

fn hard_cut(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Strip chat Markdown: unescape `\x`, drop emphasis markers and turn
/// `[label](url)` into `label: url`.
#[must_use]
pub fn plain_text(markdown: &str) -> String {
    let mut plain = String::with_capacity(markdown.len());
    let mut rest = markdown;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '\\' => {
                let escaped = &rest[1..];
                if let Some(next) = escaped.chars().next() {
                    plain.push(next);
                    rest = &escaped[next.len_utf8()..];
                } else {
                    rest = escaped;
                }
                continue;
            }
            '[' => {
                if let Some((label, url, consumed)) = parse_link(rest) {
                    plain.push_str(label);
                    plain.push_str(": ");
                    plain.push_str(url);
                    rest = &rest[consumed..];
                    continue;
                }
                plain.push(ch);
            }
            '*' | '_' | '`' => {}
            _ => plain.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    plain
}

/// `[label](url)` at the start of `text`: label, url and bytes consumed.
fn parse_link(text: &str) -> Option<(&str, &str, usize)> {
    let close = text.find("](")?;
    let label = &text[1..close];
    let after = &text[close + 2..];
    let end = after.find(')')?;
    let url = &after[..end];
    if label.contains('\n') || url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    Some((label, url, close + 2 + end + 1))
}
