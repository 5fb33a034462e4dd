pub mod client;
pub mod types;

pub use client::StackOverflowClient;
pub use types::{Question, QuestionSearchResponse};
