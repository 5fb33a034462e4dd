use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::types::{PageSummary, QueryResponse, WikiPage};
use crate::text::{normalize_wiki, paginate};
use crate::types::{ContentResult, ProviderType, ResultMetadata};
use crate::{ContentProvider, ProviderConfig};

#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: Client,
    language: String,
    api_url: String,
    rest_url: String,
    chunk_length: usize,
    max_chunks: usize,
}

impl WikipediaClient {
    #[must_use]
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        let language = config.wikipedia_language.clone();
        Self {
            http,
            api_url: format!("https://{language}.wikipedia.org/w/api.php"),
            rest_url: format!("https://{language}.wikipedia.org/api/rest_v1"),
            language,
            chunk_length: config.chunk_length,
            max_chunks: config.max_chunks,
        }
    }

    /// Resolve `subject` to a page; `None` when the page does not exist.
    #[instrument(name = "wikipedia_client.get_page", skip(self))]
    pub async fn get_page(&self, subject: &str) -> Result<Option<WikiPage>> {
        let url = format!(
            "{}?action=query&format=json&formatversion=2&prop=extracts%7Cinfo\
             &explaintext=1&exsectionformat=wiki&inprop=url&redirects=1&titles={}",
            self.api_url,
            urlencoding::encode(subject)
        );
        debug!(url = %url, "Fetching Wikipedia page");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to query Wikipedia")?;

        if !response.status().is_success() {
            anyhow::bail!("Wikipedia query failed: {}", response.status());
        }

        let body: QueryResponse = response
            .json()
            .await
            .context("Failed to parse Wikipedia query response")?;

        Ok(self.select_page(body))
    }

    /// Best-effort lookup of the page thumbnail.
    #[instrument(name = "wikipedia_client.get_thumbnail", skip(self))]
    pub async fn get_thumbnail(&self, title: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/page/summary/{}",
            self.rest_url,
            urlencoding::encode(&title.replace(' ', "_"))
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch Wikipedia page summary")?;

        if !response.status().is_success() {
            debug!(status = %response.status(), title, "No page summary available");
            return Ok(None);
        }

        let summary: PageSummary = response
            .json()
            .await
            .context("Failed to parse Wikipedia page summary")?;

        Ok(summary.thumbnail.map(|thumbnail| thumbnail.source))
    }

    /// Pick the first page with text out of a query response.
    pub(crate) fn select_page(&self, response: QueryResponse) -> Option<WikiPage> {
        let page = response
            .query?
            .pages
            .into_iter()
            .find(super::types::PageEntry::has_text)?;

        let url = page.fullurl.clone().unwrap_or_else(|| {
            format!(
                "https://{}.wikipedia.org/wiki/{}",
                self.language,
                urlencoding::encode(&page.title.replace(' ', "_"))
            )
        });

        Some(WikiPage {
            title: page.title,
            text: page.extract.unwrap_or_default(),
            url,
        })
    }

    /// Normalize and paginate a page into the unified result record.
    #[must_use]
    pub fn to_result(&self, page: WikiPage, thumbnail: Option<String>) -> ContentResult {
        let content = normalize_wiki(&page.text);
        let chunks = paginate(&content, self.chunk_length, self.max_chunks);

        ContentResult {
            provider: ProviderType::Wikipedia,
            title: page.title,
            content,
            url: page.url,
            thumbnail,
            metadata: ResultMetadata::Encyclopedia { chunks },
        }
    }
}

#[async_trait]
impl ContentProvider for WikipediaClient {
    fn provider(&self) -> ProviderType {
        ProviderType::Wikipedia
    }

    async fn fetch(&self, subject: &str) -> Result<Vec<ContentResult>> {
        let Some(page) = self.get_page(subject).await? else {
            debug!(subject, "Wikipedia has no page for subject");
            return Ok(Vec::new());
        };

        let thumbnail = match self.get_thumbnail(&page.title).await {
            Ok(thumbnail) => thumbnail,
            Err(error) => {
                warn!(title = %page.title, error = %error, "Error getting page image");
                None
            }
        };

        Ok(vec![self.to_result(page, thumbnail)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TRUNCATION_MARKER;

    fn client(config: &ProviderConfig) -> WikipediaClient {
        WikipediaClient::new(Client::new(), config)
    }

    fn parse(json: &str) -> QueryResponse {
        serde_json::from_str(json).expect("valid fixture")
    }

    #[test]
    fn missing_page_yields_none() {
        let response = parse(
            r#"{"batchcomplete":true,"query":{"pages":[{"ns":0,"title":"Нетакойстатьи","missing":true}]}}"#,
        );
        assert!(client(&ProviderConfig::default()).select_page(response).is_none());
    }

    #[test]
    fn response_without_query_yields_none() {
        let response = parse(r#"{"batchcomplete":true}"#);
        assert!(client(&ProviderConfig::default()).select_page(response).is_none());
    }

    #[test]
    fn existing_page_is_selected_with_url() {
        let response = parse(
            r#"{"query":{"pages":[{"pageid":1,"title":"Фотосинтез","extract":"Фотосинтез — процесс.\n\n== История ==\nТекст.","fullurl":"https://ru.wikipedia.org/wiki/%D0%A4"}]}}"#,
        );
        let page = client(&ProviderConfig::default())
            .select_page(response)
            .expect("page present");
        assert_eq!(page.title, "Фотосинтез");
        assert_eq!(page.url, "https://ru.wikipedia.org/wiki/%D0%A4");
        assert!(page.text.contains("== История =="));
    }

    #[test]
    fn url_falls_back_to_language_domain() {
        let config = ProviderConfig {
            wikipedia_language: "en".to_string(),
            ..ProviderConfig::default()
        };
        let response = parse(r#"{"query":{"pages":[{"title":"Rust language","extract":"Text"}]}}"#);
        let page = client(&config).select_page(response).expect("page present");
        assert_eq!(page.url, "https://en.wikipedia.org/wiki/Rust_language");
    }

    #[test]
    fn to_result_normalizes_and_paginates() {
        let config = ProviderConfig {
            chunk_length: 40,
            max_chunks: 2,
            ..ProviderConfig::default()
        };
        let page = WikiPage {
            title: "Интернет".to_string(),
            text: "== История ==\nПервая строка текста.\nВторая строка текста.\nТретья строка текста.\nЧетвертая строка."
                .to_string(),
            url: "https://ru.wikipedia.org/wiki/Internet".to_string(),
        };
        let result = client(&config).to_result(page, Some("https://img/1.png".to_string()));

        assert!(result.content.starts_with("*История*"));
        let ResultMetadata::Encyclopedia { chunks } = &result.metadata else {
            panic!("expected encyclopedia metadata");
        };
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].ends_with(TRUNCATION_MARKER));
        assert_eq!(result.thumbnail.as_deref(), Some("https://img/1.png"));
    }
}
