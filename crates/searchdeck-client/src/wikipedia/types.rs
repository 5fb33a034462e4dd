use serde::Deserialize;

/// MediaWiki `action=query` response (formatversion=2).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub query: Option<QueryBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    pub extract: Option<String>,
    pub fullurl: Option<String>,
}

impl PageEntry {
    /// The page exists and carries some text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.missing
            && !self.invalid
            && self
                .extract
                .as_deref()
                .is_some_and(|extract| !extract.trim().is_empty())
    }
}

/// REST `page/summary` response, reduced to the thumbnail.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSummary {
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub source: String,
}

/// A resolved encyclopedia page before pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct WikiPage {
    pub title: String,
    pub text: String,
    pub url: String,
}
