use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::types::{Repository, RepositorySearchResponse};
use crate::text::{emphasize, escape_markdown, squash_whitespace};
use crate::types::{ContentResult, ProviderType, ResultMetadata};
use crate::{ContentProvider, ProviderConfig};

const GITHUB_SEARCH_API: &str = "https://api.github.com/search/repositories";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    token: Option<String>,
    limit: usize,
}

impl GitHubClient {
    #[must_use]
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            token: config.github_token.clone().filter(|token| !token.is_empty()),
            limit: config.results_per_provider,
        }
    }

    /// Search repositories matching `query`, most starred first.
    #[instrument(name = "github_client.search", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Repository>> {
        let url = format!(
            "{}?q={}&sort=stars&order=desc&per_page={}",
            GITHUB_SEARCH_API,
            urlencoding::encode(query),
            self.limit
        );
        debug!(url = %url, "Searching GitHub");

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to search GitHub")?;
        if !response.status().is_success() {
            anyhow::bail!("GitHub search failed: {}", response.status());
        }

        let body: RepositorySearchResponse = response
            .json()
            .await
            .context("Failed to parse GitHub search response")?;

        Ok(body.items.into_iter().take(self.limit).collect())
    }
}

/// Fold a repository into the unified result record.
#[must_use]
pub fn repository_to_result(repository: Repository) -> ContentResult {
    let title = repository.full_name;
    let description = repository
        .description
        .as_deref()
        .map(squash_whitespace)
        .filter(|description| !description.is_empty())
        .map_or_else(|| "Без описания".to_string(), |d| escape_markdown(&d));
    let language = repository
        .language
        .as_deref()
        .map_or_else(|| "язык не указан".to_string(), escape_markdown);

    let content = format!(
        "{}\n{description}\n\n⭐ {} · {language}",
        emphasize(&title, '*'),
        repository.stargazers_count
    );

    ContentResult {
        provider: ProviderType::GitHub,
        title,
        content,
        url: repository.html_url,
        thumbnail: repository.owner.and_then(|owner| owner.avatar_url),
        metadata: ResultMetadata::Repository {
            stars: repository.stargazers_count,
            language: repository.language,
        },
    }
}

#[async_trait]
impl ContentProvider for GitHubClient {
    fn provider(&self) -> ProviderType {
        ProviderType::GitHub
    }

    async fn fetch(&self, subject: &str) -> Result<Vec<ContentResult>> {
        let repositories = self.search(subject).await?;
        Ok(repositories.into_iter().map(repository_to_result).collect())
    }
}
