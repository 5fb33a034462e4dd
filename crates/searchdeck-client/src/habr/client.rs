use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::html_parser::{parse_search_results, ParsedArticle};
use crate::text::{ellipsize, emphasize, escape_markdown};
use crate::types::{ContentResult, ProviderType, ResultMetadata};
use crate::{ContentProvider, ProviderConfig};

const HABR_BASE_URL: &str = "https://habr.com";
/// Lead paragraphs longer than this are cut in the composed content.
const MAX_LEAD_LENGTH: usize = 1500;

#[derive(Debug, Clone)]
pub struct HabrClient {
    http: Client,
    limit: usize,
}

impl HabrClient {
    #[must_use]
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            limit: config.results_per_provider,
        }
    }

    /// Fetch the search page for `query` and scrape its article cards.
    #[instrument(name = "habr_client.search", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<ParsedArticle>> {
        let url = format!(
            "{}/ru/search/?q={}&target_type=posts&order=relevance",
            HABR_BASE_URL,
            urlencoding::encode(query)
        );
        debug!(url = %url, "Searching Habr");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9")
            .send()
            .await
            .context("Failed to fetch Habr search page")?;

        if !response.status().is_success() {
            anyhow::bail!("Habr search failed: {}", response.status());
        }

        let html = response
            .text()
            .await
            .context("Failed to read Habr search page")?;

        Ok(parse_search_results(&html, HABR_BASE_URL, self.limit))
    }
}

/// Fold a scraped article into the unified result record.
///
/// Scraped text is escaped field by field before composition; the title
/// is kept unescaped on the record.
#[must_use]
pub fn article_to_result(article: ParsedArticle) -> ContentResult {
    let mut content = emphasize(&article.title, '*');

    let byline = match (&article.author, &article.rating) {
        (Some(author), Some(rating)) => Some(format!(
            "{} · рейтинг {}",
            escape_markdown(author),
            escape_markdown(rating)
        )),
        (Some(author), None) => Some(escape_markdown(author)),
        (None, Some(rating)) => Some(format!("рейтинг {}", escape_markdown(rating))),
        (None, None) => None,
    };
    if let Some(byline) = byline {
        content.push('\n');
        content.push_str(&byline);
    }
    if !article.lead.is_empty() {
        content.push_str("\n\n");
        content.push_str(&escape_markdown(&ellipsize(&article.lead, MAX_LEAD_LENGTH)));
    }

    ContentResult {
        provider: ProviderType::Habr,
        title: article.title,
        content,
        url: article.url,
        thumbnail: None,
        metadata: ResultMetadata::Article {
            author: article.author,
            rating: article.rating,
        },
    }
}

#[async_trait]
impl ContentProvider for HabrClient {
    fn provider(&self) -> ProviderType {
        ProviderType::Habr
    }

    async fn fetch(&self, subject: &str) -> Result<Vec<ContentResult>> {
        let articles = self.search(subject).await?;
        Ok(articles.into_iter().map(article_to_result).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_scraped_field() {
        let result = article_to_result(ParsedArticle {
            title: "Паттерн *Builder* в [Rust]".to_string(),
            url: "https://habr.com/ru/articles/1/".to_string(),
            lead: "Используем snake_case".to_string(),
            author: Some("dev_ops".to_string()),
            rating: Some("+7".to_string()),
        });

        assert_eq!(result.title, "Паттерн *Builder* в [Rust]");
        assert_eq!(
            result.content,
            "*Паттерн* \\**Builder*\\* *в* \\[*Rust]*\ndev\\_ops · рейтинг +7\n\nИспользуем snake\\_case"
        );
        assert_eq!(result.source(), "Хабр");
    }

    #[test]
    fn minimal_article_has_only_title() {
        let result = article_to_result(ParsedArticle {
            title: "Заголовок".to_string(),
            url: "https://habr.com/ru/articles/2/".to_string(),
            ..ParsedArticle::default()
        });
        assert_eq!(result.content, "*Заголовок*");
        assert!(result.thumbnail.is_none());
    }
}
