use anyhow::{Context, Result};
use searchdeck_core::Settings;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(feature = "telegram")]
pub mod telegram;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Launch inputs resolved from the environment.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub settings: Settings,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl BotConfig {
    /// Pair `settings` with the bot token from `TELEGRAM_BOT_TOKEN`.
    pub fn from_env(settings: Settings) -> Result<Self> {
        let token = resolve_token(std::env::var(TOKEN_ENV).ok())
            .with_context(|| format!("{TOKEN_ENV} must be set to a bot token"))?;
        Ok(Self { token, settings })
    }
}

fn resolve_token(raw: Option<String>) -> Option<String> {
    raw.map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Run the chat bot until `shutdown` is cancelled.
pub async fn run_bot(config: BotConfig, shutdown: CancellationToken) -> Result<()> {
    let context = searchdeck_core::bootstrap(config.settings.clone())?;
    info!(
        target: "searchdeck_bot",
        started_at = %context.started_at,
        "Starting chat bot"
    );

    #[cfg(feature = "telegram")]
    {
        telegram::run(config.token, context, shutdown).await
    }

    #[cfg(not(feature = "telegram"))]
    {
        let _ = (context, shutdown);
        anyhow::bail!("searchdeck-bot was built without the `telegram` feature")
    }
}

/// Cancel `shutdown` on Ctrl-C.
pub fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "searchdeck_bot", "Interrupt received; shutting down");
            shutdown.cancel();
        }
    });
}
