use serde::Deserialize;

/// `GET /search/repositories` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<Repository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    pub language: Option<String>,
    pub owner: Option<RepositoryOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub avatar_url: Option<String>,
}
