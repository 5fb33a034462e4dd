//! Layered settings: built-in defaults, an optional TOML file, then
//! `SEARCHDECK__SECTION__KEY` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use searchdeck_client::ProviderConfig;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::render::MESSAGE_LIMIT;

pub const DEFAULT_CONFIG_FILE: &str = "searchdeck.toml";
pub const ENV_PREFIX: &str = "SEARCHDECK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Characters per encyclopedia page.
    pub chunk_length: usize,
    /// Pages kept before the text is truncated.
    pub max_chunks: usize,
    /// Hard ceiling for one rendered message.
    pub message_limit: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            chunk_length: 3000,
            max_chunks: 10,
            message_limit: MESSAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub providers: ProviderConfig,
    pub paging: PagingConfig,
}

impl Settings {
    /// Load settings, reading `path` when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        debug!(target: "searchdeck_core", path = %path.display(), "Loading configuration");

        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Provider settings with the paging values folded in.
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            chunk_length: self.paging.chunk_length,
            max_chunks: self.paging.max_chunks,
            ..self.providers.clone()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.chunk_length == 0 {
            return Err(ConfigError::Invalid(
                "paging.chunk_length must be positive".to_string(),
            ));
        }
        if self.paging.max_chunks == 0 {
            return Err(ConfigError::Invalid(
                "paging.max_chunks must be positive".to_string(),
            ));
        }
        if self.paging.message_limit <= crate::render::OVERFLOW_MARGIN {
            return Err(ConfigError::Invalid(format!(
                "paging.message_limit must exceed {}",
                crate::render::OVERFLOW_MARGIN
            )));
        }
        if self.providers.results_per_provider == 0 {
            return Err(ConfigError::Invalid(
                "providers.results_per_provider must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
