pub mod client;
pub mod html_parser;

pub use client::HabrClient;
pub use html_parser::{parse_search_results, ParsedArticle};
