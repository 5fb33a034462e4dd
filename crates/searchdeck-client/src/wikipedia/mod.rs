pub mod client;
pub mod types;

pub use client::WikipediaClient;
pub use types::{PageEntry, PageSummary, QueryResponse, WikiPage};
