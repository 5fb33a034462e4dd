use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use console::ConsoleTransport;
use indicatif::ProgressBar;
use progress::spinner;
use searchdeck_bot::{cancel_on_ctrl_c, run_bot, BotConfig};
use searchdeck_core::transport::{ButtonPress, ChatId, IncomingMessage, UserId};
use searchdeck_core::{bootstrap, classify, ChatEngine, Settings};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const CONSOLE_USER: UserId = UserId(1);
const CONSOLE_CHAT: ChatId = ChatId(1);

#[derive(Debug, Parser, Clone)]
#[command(
    name = "searchdeck",
    version,
    about = "Search Wikipedia, GitHub, Stack Overflow and Habr at once, from a chat bot or the shell."
)]
struct Cli {
    /// Configuration file (TOML). Missing files are ignored.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set (e.g. `debug`).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running tasks.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Run the Telegram bot (token from TELEGRAM_BOT_TOKEN).
    Serve,
    /// Run one query through the full pipeline and print every message.
    Search {
        query: String,
        /// Page through the whole encyclopedia article.
        #[arg(long)]
        pages: bool,
    },
    /// Print the intents detected in a query as JSON.
    Classify { query: String },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    match &cli.command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "searchdeck", &mut std::io::stdout());
            Ok(())
        }
        Command::Classify { query } => {
            let intents = classify(query);
            println!("{}", serde_json::to_string_pretty(&intents)?);
            Ok(())
        }
        Command::Search { query, pages } => {
            let settings = load_settings(&cli)?;
            handle_search(&cli, settings, query, *pages).await
        }
        Command::Serve => {
            let settings = load_settings(&cli)?;
            let config = BotConfig::from_env(settings)?;
            let shutdown = CancellationToken::new();
            cancel_on_ctrl_c(shutdown.clone());
            info!(target: "searchdeck_cli", "Serving chat bot");
            run_bot(config, shutdown).await
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(cli.config.as_deref()).context("failed to load settings")
}

async fn handle_search(cli: &Cli, settings: Settings, query: &str, pages: bool) -> Result<()> {
    let page_budget = settings.paging.max_chunks;
    let engine = ChatEngine::new(bootstrap(settings)?);
    let transport = ConsoleTransport::default();

    let spinner = spinner(cli.progress_enabled(), format!("Searching `{query}`..."));
    let delivered = engine
        .handle_message(
            &transport,
            IncomingMessage {
                user: CONSOLE_USER,
                chat: CONSOLE_CHAT,
                text: query.to_string(),
            },
        )
        .await;
    finish_spinner(spinner);
    transport.flush(cli.quiet);
    delivered?;

    if !pages {
        return Ok(());
    }

    // Each press moves one page, so the article is exhausted within the budget.
    for _ in 0..page_budget {
        let Some((message, token)) = transport.find_control("next_") else {
            break;
        };
        engine
            .handle_button(
                &transport,
                ButtonPress {
                    user: CONSOLE_USER,
                    chat: CONSOLE_CHAT,
                    message,
                    callback_id: "console".to_string(),
                    token,
                },
            )
            .await?;
        transport.flush(cli.quiet);
    }
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|error| anyhow!("invalid log level `{level}`: {error}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,searchdeck=info")),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(progress) = spinner {
        progress.finish_and_clear();
    }
}

mod console {
    use std::collections::HashMap;
    use std::fmt::Write;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use searchdeck_core::render::plain_text;
    use searchdeck_core::transport::{
        ChatId, Control, MessageId, Notice, OutgoingMessage, Transport,
    };
    use searchdeck_core::DeliveryError;

    /// Prints messages instead of sending them and remembers their buttons so
    /// the CLI can press them.
    #[derive(Default)]
    pub struct ConsoleTransport {
        next_id: AtomicI32,
        controls: Mutex<HashMap<i32, Vec<Control>>>,
        pending: Mutex<Vec<String>>,
    }

    impl ConsoleTransport {
        /// Write buffered output to stdout; notices are dropped when `quiet`.
        pub fn flush(&self, quiet: bool) {
            let blocks = match self.pending.lock() {
                Ok(mut pending) => std::mem::take(&mut *pending),
                Err(_) => return,
            };
            for block in blocks {
                if quiet && block.starts_with('!') {
                    continue;
                }
                println!("{block}");
            }
        }

        /// First message with a button whose token starts with `prefix`.
        pub fn find_control(&self, prefix: &str) -> Option<(MessageId, String)> {
            let controls = self.controls.lock().ok()?;
            let mut ids: Vec<_> = controls.keys().copied().collect();
            ids.sort_unstable();
            ids.into_iter().find_map(|id| {
                controls[&id]
                    .iter()
                    .find(|control| control.token.starts_with(prefix))
                    .map(|control| (MessageId(id), control.token.clone()))
            })
        }

        fn show(&self, heading: &str, message: &OutgoingMessage) {
            let mut block = format!("── {heading} ──\n");
            if let Some(photo) = &message.photo {
                let _ = writeln!(block, "[image] {photo}");
            }
            block.push_str(&plain_text(&message.text));
            if !message.controls.is_empty() {
                let buttons = message
                    .controls
                    .iter()
                    .map(|control| format!("[{} → {}]", control.label, control.token))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(block, "\n{buttons}");
            }
            block.push('\n');
            self.push(block);
        }

        fn push(&self, block: String) {
            if let Ok(mut pending) = self.pending.lock() {
                pending.push(block);
            }
        }

        fn remember(&self, id: i32, controls: &[Control]) {
            if let Ok(mut map) = self.controls.lock() {
                map.insert(id, controls.to_vec());
            }
        }
    }

    #[async_trait]
    impl Transport for ConsoleTransport {
        async fn send(
            &self,
            _chat: ChatId,
            message: &OutgoingMessage,
        ) -> Result<MessageId, DeliveryError> {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            self.show(&format!("message #{id}"), message);
            self.remember(id, &message.controls);
            Ok(MessageId(id))
        }

        async fn edit(
            &self,
            _chat: ChatId,
            message_id: MessageId,
            message: &OutgoingMessage,
        ) -> Result<(), DeliveryError> {
            self.show(&format!("message #{message_id} (edited)"), message);
            self.remember(message_id.0, &message.controls);
            Ok(())
        }

        async fn delete(&self, _chat: ChatId, message_id: MessageId) -> Result<(), DeliveryError> {
            if let Ok(mut map) = self.controls.lock() {
                map.remove(&message_id.0);
            }
            Ok(())
        }

        async fn acknowledge(
            &self,
            _callback_id: &str,
            notice: Option<Notice>,
        ) -> Result<(), DeliveryError> {
            if let Some(notice) = notice {
                self.push(format!("! {}", notice.text));
            }
            Ok(())
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use searchdeck_core::transport::{Control, OutgoingMessage, Transport};

    use super::*;

    #[test]
    fn parses_search_with_pages() {
        let cli = Cli::try_parse_from(["searchdeck", "--quiet", "search", "история интернета", "--pages"])
            .expect("valid arguments");
        assert!(cli.quiet);
        assert!(!cli.progress_enabled());
        match cli.command {
            Command::Search { query, pages } => {
                assert_eq!(query, "история интернета");
                assert!(pages);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn console_transport_tracks_buttons_across_edits() {
        let transport = ConsoleTransport::default();
        let page = OutgoingMessage::markdown("*Интернет*").with_controls(vec![Control {
            label: "Следующая".to_string(),
            token: "next_0".to_string(),
        }]);
        let id = transport.send(CONSOLE_CHAT, &page).await.expect("sent");
        assert_eq!(
            transport.find_control("next_"),
            Some((id, "next_0".to_string()))
        );

        let last = OutgoingMessage::markdown("*Интернет*").with_controls(vec![Control {
            label: "Предыдущая".to_string(),
            token: "prev_1".to_string(),
        }]);
        transport.edit(CONSOLE_CHAT, id, &last).await.expect("edited");
        assert_eq!(transport.find_control("next_"), None);
    }
}
