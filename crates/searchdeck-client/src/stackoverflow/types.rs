use serde::Deserialize;

/// Stack Exchange `search/advanced` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSearchResponse {
    #[serde(default)]
    pub items: Vec<Question>,
    pub error_id: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// HTML-entity encoded.
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub answer_count: u64,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner: Option<QuestionOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionOwner {
    pub profile_image: Option<String>,
}
