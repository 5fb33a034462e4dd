//! HTML parser for habr.com search result pages.
//!
//! Extracts article cards from the server-rendered search listing. Selectors
//! are tried in order so minor markup revisions keep working.

use scraper::{ElementRef, Html, Selector};

use crate::text::squash_whitespace;

/// One article card from the search listing, raw (unescaped) text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArticle {
    pub title: String,
    pub url: String,
    pub lead: String,
    pub author: Option<String>,
    pub rating: Option<String>,
}

const CARD_SELECTORS: &[&str] = &["article.tm-articles-list__item", "article"];
const TITLE_SELECTORS: &[&str] = &["a.tm-title__link", "h2 a", "h3 a"];
const LEAD_SELECTORS: &[&str] = &[
    ".article-formatted-body",
    ".tm-article-snippet__lead",
    ".tm-article-body",
];
const AUTHOR_SELECTORS: &[&str] = &["a.tm-user-info__username", ".tm-user-info__user"];
const RATING_SELECTORS: &[&str] = &[".tm-votes-meter__value", ".tm-votes-lever__score-counter"];

/// Parse up to `limit` articles out of a search page.
#[must_use]
pub fn parse_search_results(html: &str, base_url: &str, limit: usize) -> Vec<ParsedArticle> {
    let document = Html::parse_document(html);

    let Some(card_selector) = first_matching_selector(&document, CARD_SELECTORS) else {
        return Vec::new();
    };

    document
        .select(&card_selector)
        .filter_map(|card| parse_card(&card, base_url))
        .take(limit)
        .collect()
}

fn parse_card(card: &ElementRef, base_url: &str) -> Option<ParsedArticle> {
    let link = select_first(card, TITLE_SELECTORS)?;
    let title = clean_text(&link);
    if title.is_empty() {
        return None;
    }
    let href = link.value().attr("href")?;

    Some(ParsedArticle {
        title,
        url: absolutize(href, base_url),
        lead: select_first(card, LEAD_SELECTORS)
            .map(|element| clean_text(&element))
            .unwrap_or_default(),
        author: select_first(card, AUTHOR_SELECTORS)
            .map(|element| clean_text(&element))
            .filter(|author| !author.is_empty()),
        rating: select_first(card, RATING_SELECTORS)
            .map(|element| clean_text(&element))
            .filter(|rating| !rating.is_empty()),
    })
}

fn first_matching_selector(document: &Html, candidates: &[&str]) -> Option<Selector> {
    candidates
        .iter()
        .filter_map(|candidate| Selector::parse(candidate).ok())
        .find(|selector| document.select(selector).next().is_some())
}

fn select_first<'a>(element: &ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    candidates
        .iter()
        .filter_map(|candidate| Selector::parse(candidate).ok())
        .find_map(|selector| element.select(&selector).next())
}

fn clean_text(element: &ElementRef) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

fn absolutize(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
