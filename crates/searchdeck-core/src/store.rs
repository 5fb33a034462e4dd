use std::hash::Hash;

use dashmap::{mapref::entry::Entry, DashMap};
use searchdeck_client::text::split;
use searchdeck_client::types::{ContentResult, PagedContent, ProviderType};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::NavigationError;
use crate::transport::UserId;

/// Chunk length applied when a cached article is opened, unless configured.
pub const DEFAULT_ARTICLE_CHUNK_LENGTH: usize = 3000;
const ARTICLE_ID_LENGTH: usize = 8;

/// Keyed storage behind the session and article tables.
///
/// The default implementation never evicts; a bounded table can be swapped in
/// without touching the store logic.
pub trait Table<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or overwrite.
    fn insert(&self, key: K, value: V);

    /// Insert only when `key` is vacant. Returns whether the value was stored.
    fn insert_new(&self, key: K, value: V) -> bool;

    /// Mutate the entry under `key` in place, atomically for that key.
    fn update<R, F>(&self, key: &K, apply: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct MemoryTable<K: Eq + Hash, V> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for MemoryTable<K, V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, V> Table<K, V> for MemoryTable<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    fn insert_new(&self, key: K, value: V) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn update<R, F>(&self, key: &K, apply: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        self.entries
            .get_mut(key)
            .map(|mut entry| apply(entry.value_mut()))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Encyclopedia page being read by one user.
#[derive(Debug, Clone)]
pub struct WikiSession {
    pub content: PagedContent,
    pub index: usize,
    pub created_at: OffsetDateTime,
}

/// A secondary result kept so it can be opened and paged later.
#[derive(Debug, Clone)]
pub struct ArticleEntry {
    pub title: String,
    pub provider: ProviderType,
    pub content: String,
    pub url: String,
    pub created_at: OffsetDateTime,
}

/// One page of stored content, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub content: PagedContent,
    pub index: usize,
    /// Set when the page belongs to a cached article rather than a session.
    pub article_id: Option<String>,
}

impl PageView {
    #[must_use]
    pub fn body(&self) -> &str {
        self.content.chunk(self.index).unwrap_or_default()
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.content.chunk_count()
    }
}

/// Process-wide pagination state: per-user sessions and cached articles.
pub struct ContentStore<S = MemoryTable<UserId, WikiSession>, A = MemoryTable<String, ArticleEntry>>
{
    sessions: S,
    articles: A,
    article_chunk_length: usize,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(MemoryTable::default(), MemoryTable::default())
    }
}

impl<S, A> std::fmt::Debug for ContentStore<S, A>
where
    S: Table<UserId, WikiSession>,
    A: Table<String, ArticleEntry>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("sessions", &self.sessions.len())
            .field("articles", &self.articles.len())
            .field("article_chunk_length", &self.article_chunk_length)
            .finish()
    }
}

impl<S, A> ContentStore<S, A>
where
    S: Table<UserId, WikiSession>,
    A: Table<String, ArticleEntry>,
{
    pub fn new(sessions: S, articles: A) -> Self {
        Self {
            sessions,
            articles,
            article_chunk_length: DEFAULT_ARTICLE_CHUNK_LENGTH,
        }
    }

    /// Split cached articles into pages of at most `chunk_length` characters.
    #[must_use]
    pub fn with_article_chunk_length(mut self, chunk_length: usize) -> Self {
        self.article_chunk_length = chunk_length.max(1);
        self
    }

    /// Start reading `content` from its first page, replacing any session the
    /// user already had.
    pub fn start_session(&self, user: UserId, content: PagedContent) -> PageView {
        debug!(
            target: "searchdeck_core",
            user_id = %user,
            title = %content.title,
            chunks = content.chunk_count(),
            "Session started"
        );
        self.sessions.insert(
            user,
            WikiSession {
                content: content.clone(),
                index: 0,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        PageView {
            content,
            index: 0,
            article_id: None,
        }
    }

    /// Move the user's session by `delta` pages.
    ///
    /// Targets outside the page range are rejected and leave the session
    /// untouched.
    pub fn navigate_session(&self, user: UserId, delta: isize) -> Result<PageView, NavigationError> {
        self.sessions
            .update(&user, |session| {
                let chunk_count = session.content.chunk_count();
                let target = session
                    .index
                    .checked_add_signed(delta)
                    .filter(|target| *target < chunk_count)
                    .ok_or(NavigationError::OutOfRange {
                        index: session.index,
                        delta,
                        chunk_count,
                    })?;
                session.index = target;
                debug!(
                    target: "searchdeck_core",
                    user_id = %user,
                    index = target,
                    age_secs = (OffsetDateTime::now_utc() - session.created_at).whole_seconds(),
                    "Session page turned"
                );
                Ok(PageView {
                    content: session.content.clone(),
                    index: target,
                    article_id: None,
                })
            })
            .unwrap_or(Err(NavigationError::NoActiveSession { user }))
    }

    #[must_use]
    pub fn session(&self, user: UserId) -> Option<WikiSession> {
        self.sessions.get(&user)
    }

    /// Cache a secondary result and return its freshly generated id.
    pub fn cache_article(&self, result: &ContentResult) -> String {
        let entry = ArticleEntry {
            title: result.title.clone(),
            provider: result.provider,
            content: result.content.clone(),
            url: result.url.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        loop {
            let id = new_article_id();
            if self.articles.insert_new(id.clone(), entry.clone()) {
                return id;
            }
        }
    }

    /// Page `index` of a cached article. Indexes past the end show the last
    /// page.
    pub fn read_article(&self, id: &str, index: usize) -> Result<PageView, NavigationError> {
        let entry = self
            .articles
            .get(&id.to_string())
            .ok_or_else(|| NavigationError::ArticleNotFound { id: id.to_string() })?;

        let chunks = split(&entry.content, self.article_chunk_length);
        let index = index.min(chunks.len().saturating_sub(1));
        debug!(
            target: "searchdeck_core",
            article_id = id,
            index,
            age_secs = (OffsetDateTime::now_utc() - entry.created_at).whole_seconds(),
            "Article page read"
        );
        Ok(PageView {
            content: PagedContent {
                provider: entry.provider,
                title: entry.title,
                chunks,
                url: entry.url,
                thumbnail: None,
            },
            index,
            article_id: Some(id.to_string()),
        })
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }
}

fn new_article_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ARTICLE_ID_LENGTH)
        .collect()
}
