use serde::{Deserialize, Serialize};

use crate::text::chunk;

/// Provider type enum for identifying content sources.
///
/// Declaration order is the presentation priority used by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderType {
    Wikipedia,
    GitHub,
    StackOverflow,
    Habr,
}

impl ProviderType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wikipedia => "Википедия",
            Self::GitHub => "GitHub",
            Self::StackOverflow => "Stack Overflow",
            Self::Habr => "Хабр",
        }
    }

    /// Stable identifier used in logs and configuration.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Wikipedia => "wikipedia",
            Self::GitHub => "github",
            Self::StackOverflow => "stackoverflow",
            Self::Habr => "habr",
        }
    }

    /// Label for the "open the original" link under a rendered page.
    #[must_use]
    pub fn link_label(&self) -> &'static str {
        match self {
            Self::Wikipedia => "Открыть в Википедии",
            Self::GitHub => "Открыть на GitHub",
            Self::StackOverflow => "Открыть на Stack Overflow",
            Self::Habr => "Открыть на Хабре",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Provider-specific details carried next to the display content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultMetadata {
    /// Normalized encyclopedia text, already split into pages.
    Encyclopedia { chunks: Vec<String> },
    Repository {
        stars: u64,
        language: Option<String>,
    },
    Question {
        score: i64,
        answer_count: u64,
        answered: bool,
        tags: Vec<String>,
    },
    Article {
        author: Option<String>,
        rating: Option<String>,
    },
}

/// Unified result record produced by every provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentResult {
    pub provider: ProviderType,
    /// Plain title; renderers escape it.
    pub title: String,
    pub content: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub metadata: ResultMetadata,
}

impl ContentResult {
    #[must_use]
    pub fn source(&self) -> &'static str {
        self.provider.name()
    }

    /// Convert into pages, reusing the encyclopedia pagination when present and
    /// splitting the display content at `chunk_length` otherwise.
    #[must_use]
    pub fn into_paged(self, chunk_length: usize) -> PagedContent {
        let chunks = match self.metadata {
            ResultMetadata::Encyclopedia { chunks } if !chunks.is_empty() => chunks,
            _ => chunk::split(&self.content, chunk_length),
        };

        PagedContent {
            provider: self.provider,
            title: self.title,
            chunks,
            url: self.url,
            thumbnail: self.thumbnail,
        }
    }
}

/// Title, source and an ordered list of bounded text pages ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedContent {
    pub provider: ProviderType,
    pub title: String,
    pub chunks: Vec<String>,
    pub url: String,
    pub thumbnail: Option<String>,
}

impl PagedContent {
    #[must_use]
    pub fn source(&self) -> &'static str {
        self.provider.name()
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<&str> {
        self.chunks.get(index).map(String::as_str)
    }
}
