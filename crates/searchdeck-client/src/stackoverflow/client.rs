use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::types::{Question, QuestionSearchResponse};
use crate::text::{decode_entities, emphasize, escape_markdown};
use crate::types::{ContentResult, ProviderType, ResultMetadata};
use crate::{ContentProvider, ProviderConfig};

const STACK_EXCHANGE_SEARCH_API: &str = "https://api.stackexchange.com/2.3/search/advanced";

#[derive(Debug, Clone)]
pub struct StackOverflowClient {
    http: Client,
    limit: usize,
}

impl StackOverflowClient {
    #[must_use]
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            limit: config.results_per_provider,
        }
    }

    /// Search Stack Overflow questions by relevance.
    #[instrument(name = "stackoverflow_client.search", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Question>> {
        let url = format!(
            "{}?order=desc&sort=relevance&site=stackoverflow&pagesize={}&q={}",
            STACK_EXCHANGE_SEARCH_API,
            self.limit,
            urlencoding::encode(query)
        );
        debug!(url = %url, "Searching Stack Overflow");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to search Stack Overflow")?;

        if !response.status().is_success() {
            anyhow::bail!("Stack Overflow search failed: {}", response.status());
        }

        let body: QuestionSearchResponse = response
            .json()
            .await
            .context("Failed to parse Stack Overflow search response")?;

        if let Some(message) = body.error_message {
            anyhow::bail!(
                "Stack Exchange API error {}: {message}",
                body.error_id.unwrap_or_default()
            );
        }

        Ok(body.items.into_iter().take(self.limit).collect())
    }
}

/// Fold a question into the unified result record.
#[must_use]
pub fn question_to_result(question: Question) -> ContentResult {
    let title = decode_entities(&question.title);
    let answered = if question.is_answered { " ✅" } else { "" };
    let tags = question
        .tags
        .iter()
        .map(|tag| escape_markdown(tag))
        .collect::<Vec<_>>()
        .join(", ");

    let mut content = format!(
        "{}\nРейтинг: {} · Ответов: {}{answered}",
        emphasize(&title, '*'),
        question.score, question.answer_count
    );
    if !tags.is_empty() {
        content.push_str("\nТеги: ");
        content.push_str(&tags);
    }

    ContentResult {
        provider: ProviderType::StackOverflow,
        title,
        content,
        url: question.link,
        thumbnail: question.owner.and_then(|owner| owner.profile_image),
        metadata: ResultMetadata::Question {
            score: question.score,
            answer_count: question.answer_count,
            answered: question.is_answered,
            tags: question.tags,
        },
    }
}

#[async_trait]
impl ContentProvider for StackOverflowClient {
    fn provider(&self) -> ProviderType {
        ProviderType::StackOverflow
    }

    async fn fetch(&self, subject: &str) -> Result<Vec<ContentResult>> {
        let questions = self.search(subject).await?;
        Ok(questions.into_iter().map(question_to_result).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "items": [
            {
                "tags": ["rust", "async_await"],
                "owner": {"profile_image": "https://i.sstatic.net/a.png"},
                "is_answered": true,
                "answer_count": 4,
                "score": 57,
                "link": "https://stackoverflow.com/questions/1/what-is-async",
                "title": "What&#39;s the difference between &quot;async&quot; and threads?"
            },
            {
                "tags": [],
                "is_answered": false,
                "answer_count": 0,
                "score": -2,
                "link": "https://stackoverflow.com/questions/2/x",
                "title": "Plain"
            }
        ],
        "has_more": true,
        "quota_max": 300,
        "quota_remaining": 299
    }"#;

    fn results() -> Vec<ContentResult> {
        let response: QuestionSearchResponse =
            serde_json::from_str(FIXTURE).expect("valid fixture");
        response.items.into_iter().map(question_to_result).collect()
    }

    #[test]
    fn decodes_title_and_folds_metadata() {
        let results = results();
        let first = &results[0];
        assert_eq!(
            first.title,
            "What's the difference between \"async\" and threads?"
        );
        assert_eq!(
            first.content,
            "*What's the difference between \"async\" and threads?*\n\
             Рейтинг: 57 · Ответов: 4 ✅\nТеги: rust, async\\_await"
        );
        assert_eq!(first.url, "https://stackoverflow.com/questions/1/what-is-async");
    }

    #[test]
    fn omits_tag_line_when_untagged() {
        let results = results();
        let second = &results[1];
        assert_eq!(second.content, "*Plain*\nРейтинг: -2 · Ответов: 0");
        assert!(matches!(
            second.metadata,
            ResultMetadata::Question { answered: false, .. }
        ));
    }

    #[test]
    fn api_error_payload_parses() {
        let response: QuestionSearchResponse = serde_json::from_str(
            r#"{"error_id":502,"error_message":"too many requests from this IP","error_name":"throttle_violation"}"#,
        )
        .expect("valid payload");
        assert!(response.items.is_empty());
        assert_eq!(response.error_id, Some(502));
    }
}
