pub mod github;
pub mod habr;
pub mod stackoverflow;
pub mod text;
pub mod types;
pub mod wikipedia;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use github::GitHubClient;
use habr::HabrClient;
use stackoverflow::StackOverflowClient;
use types::{ContentResult, ProviderType};
use wikipedia::WikipediaClient;

/// A single external content source.
///
/// Implementations bound their own latency through the HTTP client timeout and
/// report any transport, status or parsing problem as an error.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    fn provider(&self) -> ProviderType;

    async fn fetch(&self, subject: &str) -> Result<Vec<ContentResult>>;
}

/// Failure of one provider while serving a query.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} unavailable for `{subject}`: {source:#}")]
    Unavailable {
        provider: ProviderType,
        subject: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ProviderError {
    #[must_use]
    pub fn provider(&self) -> ProviderType {
        match self {
            Self::Unavailable { provider, .. } => *provider,
        }
    }
}

/// Settings shared by the provider clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub user_agent: String,
    /// Per-request timeout applied by every HTTP client.
    pub timeout_secs: u64,
    /// Upper bound on results kept from each search provider.
    pub results_per_provider: usize,
    pub wikipedia_language: String,
    pub github_token: Option<String>,
    /// Page length used when splitting encyclopedia text, filled from the
    /// paging settings.
    #[serde(skip)]
    pub chunk_length: usize,
    #[serde(skip)]
    pub max_chunks: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            user_agent: "SearchDeckBot/1.0 (multi-source search bot)".to_string(),
            timeout_secs: 10,
            results_per_provider: 3,
            wikipedia_language: "ru".to_string(),
            github_token: None,
            chunk_length: 3000,
            max_chunks: 10,
        }
    }
}

impl ProviderConfig {
    /// Build the shared HTTP client for all providers.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(StdDuration::from_secs(self.timeout_secs))
            .gzip(true)
            .build()
            .context("failed to build reqwest client")
    }
}

/// All provider clients, in presentation priority order.
#[derive(Clone)]
pub struct ProviderClients {
    pub encyclopedia: Arc<dyn ContentProvider>,
    pub code_hosting: Arc<dyn ContentProvider>,
    pub questions: Arc<dyn ContentProvider>,
    pub articles: Arc<dyn ContentProvider>,
}

impl std::fmt::Debug for ProviderClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClients")
            .field("encyclopedia", &self.encyclopedia.provider())
            .field("code_hosting", &self.code_hosting.provider())
            .field("questions", &self.questions.provider())
            .field("articles", &self.articles.provider())
            .finish()
    }
}

impl ProviderClients {
    /// Wire the live Wikipedia, GitHub, Stack Overflow and Habr clients.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let http = config.http_client()?;
        Ok(Self {
            encyclopedia: Arc::new(WikipediaClient::new(http.clone(), config)),
            code_hosting: Arc::new(GitHubClient::new(http.clone(), config)),
            questions: Arc::new(StackOverflowClient::new(http.clone(), config)),
            articles: Arc::new(HabrClient::new(http, config)),
        })
    }

    #[must_use]
    pub fn new(
        encyclopedia: Arc<dyn ContentProvider>,
        code_hosting: Arc<dyn ContentProvider>,
        questions: Arc<dyn ContentProvider>,
        articles: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            encyclopedia,
            code_hosting,
            questions,
            articles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_clients_creation() {
        let clients = ProviderClients::from_config(&ProviderConfig::default())
            .expect("clients build");
        assert_eq!(clients.encyclopedia.provider(), ProviderType::Wikipedia);
        assert_eq!(clients.code_hosting.provider(), ProviderType::GitHub);
        assert_eq!(clients.questions.provider(), ProviderType::StackOverflow);
        assert_eq!(clients.articles.provider(), ProviderType::Habr);
    }

    #[test]
    fn provider_error_names_provider_and_subject() {
        let error = ProviderError::Unavailable {
            provider: ProviderType::GitHub,
            subject: "tokio".to_string(),
            source: anyhow::anyhow!("connection reset"),
        };
        let message = error.to_string();
        assert!(message.contains("GitHub"));
        assert!(message.contains("tokio"));
        assert!(message.contains("connection reset"));
        assert_eq!(error.provider(), ProviderType::GitHub);
    }
}
