use searchdeck_client::ProviderClients;
use time::OffsetDateTime;

use crate::aggregator::Aggregator;
use crate::config::Settings;
use crate::render::Renderer;
use crate::store::ContentStore;

/// Shared handle passed to every event handler.
#[derive(Debug)]
pub struct AppContext {
    pub aggregator: Aggregator,
    pub store: ContentStore,
    pub renderer: Renderer,
    pub settings: Settings,
    pub started_at: OffsetDateTime,
}

impl AppContext {
    #[must_use]
    pub fn new(settings: Settings, clients: ProviderClients) -> Self {
        let aggregator = Aggregator::new(
            clients,
            settings.paging.chunk_length,
            settings.providers.results_per_provider,
        );
        Self {
            aggregator,
            store: ContentStore::default()
                .with_article_chunk_length(settings.paging.chunk_length),
            renderer: Renderer::new(settings.paging.message_limit),
            settings,
            started_at: OffsetDateTime::now_utc(),
        }
    }
}
