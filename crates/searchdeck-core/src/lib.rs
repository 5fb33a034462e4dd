use std::sync::Arc;

use anyhow::Result;
use searchdeck_client::ProviderClients;
use tracing::info;

pub mod actions;
pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod messages;
pub mod render;
pub mod state;
pub mod store;
pub mod transport;

pub use aggregator::{Aggregate, Aggregator, ProviderResults, SearchOutcome};
pub use classifier::{classify, IntentKind, QueryIntent};
pub use crate::config::{PagingConfig, Settings};
pub use engine::ChatEngine;
pub use error::{ConfigError, DeliveryError, NavigationError, ProviderError};
pub use state::AppContext;

/// Build the shared context with live provider clients.
pub fn bootstrap(settings: Settings) -> Result<Arc<AppContext>> {
    let clients = ProviderClients::from_config(&settings.provider_config())?;

    info!(
        target: "searchdeck_core",
        providers = ?clients,
        language = %settings.providers.wikipedia_language,
        chunk_length = settings.paging.chunk_length,
        max_chunks = settings.paging.max_chunks,
        "Core initialized"
    );

    Ok(Arc::new(AppContext::new(settings, clients)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_wires_default_settings() {
        let context = bootstrap(Settings::default()).expect("bootstrap succeeds");
        assert_eq!(context.settings.paging.max_chunks, 10);
        assert_eq!(context.store.session_count(), 0);
    }
}
