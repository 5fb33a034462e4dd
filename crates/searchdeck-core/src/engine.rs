//! Chat event handling: queries in, paginated pages out.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::aggregator::{Aggregate, SearchOutcome};
use crate::classifier::classify;
use crate::error::{DeliveryError, NavigationError};
use crate::messages;
use crate::render::RenderedPage;
use crate::state::AppContext;
use crate::store::PageView;
use crate::transport::{
    edit_with_fallback, send_with_fallback, ButtonPress, ChatId, IncomingMessage, MessageId,
    Notice, OutgoingMessage, Transport, UserId,
};

#[derive(Clone)]
pub struct ChatEngine {
    context: Arc<AppContext>,
}

impl ChatEngine {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn context(&self) -> Arc<AppContext> {
        self.context.clone()
    }

    /// Answer a message that carries no text (sticker, photo, voice).
    pub async fn handle_unsupported(
        &self,
        transport: &dyn Transport,
        user: UserId,
        chat: ChatId,
    ) -> Result<(), DeliveryError> {
        debug!(target: "searchdeck_core", user_id = %user, "Non-text message");
        transport
            .send(chat, &OutgoingMessage::plain(messages::TEXT_ONLY))
            .await?;
        Ok(())
    }

    /// Handle a text message: a command or a search query.
    pub async fn handle_message(
        &self,
        transport: &dyn Transport,
        message: IncomingMessage,
    ) -> Result<(), DeliveryError> {
        let text = message.text.trim();

        if let Some(command) = text.strip_prefix('/') {
            let reply = match command_name(command) {
                "start" => messages::GREETING,
                "help" => messages::HELP,
                _ => messages::UNKNOWN_COMMAND,
            };
            transport
                .send(message.chat, &OutgoingMessage::plain(reply))
                .await?;
            return Ok(());
        }

        if text.chars().count() < messages::MIN_QUERY_LENGTH {
            transport
                .send(message.chat, &OutgoingMessage::plain(messages::QUERY_TOO_SHORT))
                .await?;
            return Ok(());
        }

        let intents = classify(text);
        let subject = intents
            .first()
            .map_or_else(|| text.to_string(), |intent| intent.subject.clone());
        info!(
            target: "searchdeck_core",
            user_id = %message.user,
            intent = %intents.first().map(|intent| intent.kind.as_str()).unwrap_or("general"),
            subject = %subject,
            "Query received"
        );

        let status = match transport
            .send(message.chat, &OutgoingMessage::plain(messages::SEARCHING))
            .await
        {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(target: "searchdeck_core", user_id = %message.user, error = %error, "Status message failed");
                None
            }
        };

        let outcome = self.context.aggregator.search(&subject).await;

        if let Some(status) = status {
            if let Err(error) = transport.delete(message.chat, status).await {
                warn!(target: "searchdeck_core", user_id = %message.user, error = %error, "Status message not deleted");
            }
        }

        match outcome {
            SearchOutcome::NoResults { failures } => {
                info!(
                    target: "searchdeck_core",
                    user_id = %message.user,
                    subject = %subject,
                    failures = failures.len(),
                    "No results"
                );
                transport
                    .send(message.chat, &OutgoingMessage::plain(messages::NO_RESULTS))
                    .await?;
                Ok(())
            }
            SearchOutcome::Found(aggregate) => self.deliver(transport, &message, aggregate).await,
        }
    }

    async fn deliver(
        &self,
        transport: &dyn Transport,
        message: &IncomingMessage,
        aggregate: Aggregate,
    ) -> Result<(), DeliveryError> {
        let renderer = &self.context.renderer;

        if let Some(paged) = aggregate.encyclopedia {
            let view = self.context.store.start_session(message.user, paged);
            let page = renderer.first_page(&view);
            send_page(transport, message.chat, &page).await?;
        }

        for group in aggregate.secondary {
            let entries: Vec<(String, _)> = group
                .results
                .into_iter()
                .map(|result| (self.context.store.cache_article(&result), result))
                .collect();
            let page = renderer.overview(group.provider, &aggregate.subject, &entries);
            send_page(transport, message.chat, &page).await?;
        }

        debug!(
            target: "searchdeck_core",
            user_id = %message.user,
            sessions = self.context.store.session_count(),
            articles = self.context.store.article_count(),
            "Results delivered"
        );
        Ok(())
    }

    /// Handle a button press. Navigation problems are answered with a notice
    /// and are not errors; only a failed delivery is.
    pub async fn handle_button(
        &self,
        transport: &dyn Transport,
        press: ButtonPress,
    ) -> Result<(), DeliveryError> {
        debug!(
            target: "searchdeck_core",
            user_id = %press.user,
            token = %press.token,
            "Button pressed"
        );

        let result = match Action::parse(&press.token) {
            Ok(Action::Prev(_)) => self.turn_session(transport, &press, -1).await,
            Ok(Action::Next(_)) => self.turn_session(transport, &press, 1).await,
            Ok(Action::Read(id)) => self.open_article(transport, &press, &id).await,
            Ok(Action::ArticlePrev { id, index }) => {
                self.turn_article(transport, &press, &id, index.saturating_sub(1))
                    .await
            }
            Ok(Action::ArticleNext { id, index }) => {
                self.turn_article(transport, &press, &id, index.saturating_add(1))
                    .await
            }
            Err(error) => Err(Outcome::Navigation(error)),
        };

        match result {
            Ok(()) => {
                acknowledge(transport, &press, None).await;
                Ok(())
            }
            Err(Outcome::Navigation(error)) => {
                warn!(
                    target: "searchdeck_core",
                    user_id = %press.user,
                    error = %error,
                    "Navigation rejected"
                );
                acknowledge(transport, &press, Some(navigation_notice(&error))).await;
                Ok(())
            }
            Err(Outcome::Delivery(error, notice)) => {
                warn!(
                    target: "searchdeck_core",
                    user_id = %press.user,
                    error = %error,
                    "Page delivery failed"
                );
                acknowledge(transport, &press, Some(Notice::alert(notice))).await;
                Err(error)
            }
        }
    }

    async fn turn_session(
        &self,
        transport: &dyn Transport,
        press: &ButtonPress,
        delta: isize,
    ) -> Result<(), Outcome> {
        let view = self
            .context
            .store
            .navigate_session(press.user, delta)
            .map_err(Outcome::Navigation)?;
        self.edit_page(transport, press, &view).await
    }

    async fn turn_article(
        &self,
        transport: &dyn Transport,
        press: &ButtonPress,
        id: &str,
        index: usize,
    ) -> Result<(), Outcome> {
        let view = self
            .context
            .store
            .read_article(id, index)
            .map_err(Outcome::Navigation)?;
        self.edit_page(transport, press, &view).await
    }

    async fn open_article(
        &self,
        transport: &dyn Transport,
        press: &ButtonPress,
        id: &str,
    ) -> Result<(), Outcome> {
        let view = self
            .context
            .store
            .read_article(id, 0)
            .map_err(Outcome::Navigation)?;
        let page = self.context.renderer.page(&view);
        send_page(transport, press.chat, &page)
            .await
            .map_err(|error| Outcome::Delivery(error, messages::SEND_FAILED))?;
        Ok(())
    }

    async fn edit_page(
        &self,
        transport: &dyn Transport,
        press: &ButtonPress,
        view: &PageView,
    ) -> Result<(), Outcome> {
        let page = self.context.renderer.page(view);
        edit_with_fallback(
            transport,
            press.chat,
            press.message,
            &page.message,
            &page.fallback,
        )
        .await
        .map_err(|error| Outcome::Delivery(error, messages::EDIT_FAILED))
    }
}

/// Why a button press did not complete.
enum Outcome {
    Navigation(NavigationError),
    Delivery(DeliveryError, &'static str),
}

async fn send_page(
    transport: &dyn Transport,
    chat: ChatId,
    page: &RenderedPage,
) -> Result<MessageId, DeliveryError> {
    send_with_fallback(transport, chat, &page.message, &page.fallback).await
}

async fn acknowledge(transport: &dyn Transport, press: &ButtonPress, notice: Option<Notice>) {
    if let Err(error) = transport.acknowledge(&press.callback_id, notice).await {
        warn!(
            target: "searchdeck_core",
            user_id = %press.user,
            error = %error,
            "Button acknowledgement failed"
        );
    }
}

fn navigation_notice(error: &NavigationError) -> Notice {
    match error {
        NavigationError::NoActiveSession { .. } => Notice::alert(messages::SESSION_EXPIRED),
        NavigationError::OutOfRange { .. } => Notice::toast(messages::NAVIGATION_LIMIT),
        NavigationError::ArticleNotFound { .. } => Notice::alert(messages::ARTICLE_EXPIRED),
        NavigationError::MalformedAction { .. } => Notice::toast(messages::MALFORMED_ACTION),
    }
}

/// `start` from `start@SomeBot extra words`.
fn command_name(command: &str) -> &str {
    let word = command.split_whitespace().next().unwrap_or_default();
    word.split('@').next().unwrap_or_default()
}
