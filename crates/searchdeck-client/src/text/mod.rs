//! Text handling shared by providers and the renderer.

pub mod chunk;
pub mod escape;
pub mod markup;

pub use chunk::{paginate, split, TRUNCATION_MARKER};
pub use escape::{decode_entities, ellipsize, emphasize, escape_markdown, squash_whitespace};
pub use markup::normalize_wiki;
