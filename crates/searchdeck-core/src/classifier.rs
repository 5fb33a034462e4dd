//! Lightweight intent detection over raw user queries.
//!
//! Every intent is a list of trigger phrases followed by a subject. Triggers
//! are matched on the lower-cased query at a word boundary, longer phrases
//! before the shorter ones they start with.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Definition,
    HowTo,
    Why,
    Compare,
    History,
    Examples,
    General,
}

impl IntentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::HowTo => "how_to",
            Self::Why => "why",
            Self::Compare => "compare",
            Self::History => "history",
            Self::Examples => "examples",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interpretation of a query: what is asked and about what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryIntent {
    pub kind: IntentKind,
    /// Trigger phrase that matched, empty for [`IntentKind::General`].
    pub keyword: String,
    pub subject: String,
}

const TRIGGERS: &[(IntentKind, &[&str])] = &[
    (
        IntentKind::Definition,
        &[
            "что такое",
            "кто такой",
            "кто такая",
            "кто такие",
            "что значит",
            "что означает",
            "определение",
            "what is",
            "who is",
            "define",
        ],
    ),
    (
        IntentKind::HowTo,
        &[
            "как сделать",
            "как работает",
            "каким образом",
            "как",
            "how to",
            "how does",
            "how do",
        ],
    ),
    (IntentKind::Why, &["почему", "зачем", "отчего", "why"]),
    (
        IntentKind::Compare,
        &[
            "чем отличается",
            "разница между",
            "отличие",
            "сравнение",
            "сравни",
            "difference between",
            "compare",
        ],
    ),
    (
        IntentKind::History,
        &["история создания", "история", "происхождение", "history of"],
    ),
    (
        IntentKind::Examples,
        &["примеры", "пример", "examples of", "example of"],
    ),
];

static PATTERNS: Lazy<Vec<(IntentKind, Regex)>> = Lazy::new(|| {
    TRIGGERS
        .iter()
        .map(|(kind, triggers)| {
            let alternatives = triggers
                .iter()
                .map(|trigger| regex::escape(trigger).replace(' ', r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b({alternatives})\s+(.+)$");
            (*kind, Regex::new(&pattern).expect("intent pattern"))
        })
        .collect()
});

/// Classify `query` into one or more intents.
///
/// Never fails and never returns an empty list; the first intent carries the
/// canonical subject.
#[must_use]
pub fn classify(query: &str) -> Vec<QueryIntent> {
    let trimmed = query.trim();
    let lowered = trimmed.to_lowercase();

    let mut intents: Vec<QueryIntent> = PATTERNS
        .iter()
        .filter_map(|(kind, pattern)| {
            let captures = pattern.captures(&lowered)?;
            let subject = clean_subject(captures.get(2)?.as_str());
            if subject.is_empty() {
                return None;
            }
            Some(QueryIntent {
                kind: *kind,
                keyword: squash(captures.get(1)?.as_str()),
                subject,
            })
        })
        .collect();

    if intents.is_empty() {
        intents.push(QueryIntent {
            kind: IntentKind::General,
            keyword: String::new(),
            subject: trimmed.to_string(),
        });
    }
    intents
}

fn clean_subject(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['?', '!', '.'])
        .trim()
        .to_string()
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
