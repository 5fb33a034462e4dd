//! Button action tokens.
//!
//! Tokens are short ASCII strings carried in button callbacks:
//! `prev_<i>`, `next_<i>`, `read_<id>`, `art_prev_<id>_<i>` and
//! `art_next_<id>_<i>`. Article ids never contain `_`, so every field sits at
//! a fixed delimiter position.

use crate::error::NavigationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Previous encyclopedia page; carries the index shown when pressed.
    Prev(usize),
    Next(usize),
    /// Open a cached article.
    Read(String),
    ArticlePrev { id: String, index: usize },
    ArticleNext { id: String, index: usize },
}

impl Action {
    #[must_use]
    pub fn to_token(&self) -> String {
        match self {
            Self::Prev(index) => format!("prev_{index}"),
            Self::Next(index) => format!("next_{index}"),
            Self::Read(id) => format!("read_{id}"),
            Self::ArticlePrev { id, index } => format!("art_prev_{id}_{index}"),
            Self::ArticleNext { id, index } => format!("art_next_{id}_{index}"),
        }
    }

    /// Parse a callback token. Anything that does not match one of the known
    /// shapes exactly is rejected.
    pub fn parse(token: &str) -> Result<Self, NavigationError> {
        let malformed = || NavigationError::MalformedAction {
            token: token.to_string(),
        };

        if let Some(rest) = token.strip_prefix("art_prev_") {
            let (id, index) = article_parts(rest).ok_or_else(malformed)?;
            return Ok(Self::ArticlePrev { id, index });
        }
        if let Some(rest) = token.strip_prefix("art_next_") {
            let (id, index) = article_parts(rest).ok_or_else(malformed)?;
            return Ok(Self::ArticleNext { id, index });
        }
        if let Some(rest) = token.strip_prefix("prev_") {
            return parse_index(rest).map(Self::Prev).ok_or_else(malformed);
        }
        if let Some(rest) = token.strip_prefix("next_") {
            return parse_index(rest).map(Self::Next).ok_or_else(malformed);
        }
        if let Some(id) = token.strip_prefix("read_") {
            return valid_id(id)
                .then(|| Self::Read(id.to_string()))
                .ok_or_else(malformed);
        }
        Err(malformed())
    }
}

fn article_parts(rest: &str) -> Option<(String, usize)> {
    let (id, index) = rest.split_once('_')?;
    if !valid_id(id) {
        return None;
    }
    Some((id.to_string(), parse_index(index)?))
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|ch| ch.is_ascii_alphanumeric())
}

fn parse_index(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_bit_exact() {
        assert_eq!(Action::Prev(3).to_token(), "prev_3");
        assert_eq!(Action::Next(0).to_token(), "next_0");
        assert_eq!(Action::Read("a1b2c3d4".into()).to_token(), "read_a1b2c3d4");
        assert_eq!(
            Action::ArticlePrev {
                id: "a1b2c3d4".into(),
                index: 2
            }
            .to_token(),
            "art_prev_a1b2c3d4_2"
        );
        assert_eq!(
            Action::ArticleNext {
                id: "a1b2c3d4".into(),
                index: 0
            }
            .to_token(),
            "art_next_a1b2c3d4_0"
        );
    }

    #[test]
    fn parses_every_shape() {
        assert_eq!(Action::parse("prev_4"), Ok(Action::Prev(4)));
        assert_eq!(Action::parse("next_0"), Ok(Action::Next(0)));
        assert_eq!(
            Action::parse("read_0f3a9c1e"),
            Ok(Action::Read("0f3a9c1e".into()))
        );
        assert_eq!(
            Action::parse("art_next_0f3a9c1e_12"),
            Ok(Action::ArticleNext {
                id: "0f3a9c1e".into(),
                index: 12
            })
        );
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        for token in [
            "",
            "prev_",
            "next_x",
            "next_-1",
            "next_+1",
            "read_",
            "read_a_b",
            "art_prev_abc",
            "art_prev__1",
            "art_next_abc_",
            "art_next_abc_1_2",
            "jump_3",
        ] {
            assert_eq!(
                Action::parse(token),
                Err(NavigationError::MalformedAction {
                    token: token.to_string()
                }),
                "token {token:?} should be rejected"
            );
        }
    }
}
