//! Telegram channel: turns updates into engine calls and implements the
//! engine's transport with the Bot API.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use searchdeck_core::transport::{
    ButtonPress, ChatId, Control, IncomingMessage, MessageId, Notice, OutgoingMessage,
    TextFormat, Transport, UserId,
};
use searchdeck_core::{AppContext, ChatEngine, DeliveryError};
use teloxide::payloads::{
    EditMessageTextSetters, SendMessageSetters, SendPhotoSetters,
};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bot API reply when asked to edit the text of a photo message.
const NO_TEXT_TO_EDIT: &str = "no text in the message to edit";

pub async fn run(token: String, context: Arc<AppContext>, shutdown: CancellationToken) -> Result<()> {
    let bot = Bot::new(token);
    let engine = ChatEngine::new(context);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .build();

    info!(target: "searchdeck_bot", "Telegram channel starting");

    tokio::select! {
        biased;

        () = shutdown.cancelled() => {
            info!(target: "searchdeck_bot", "Shutdown signal received; closing Telegram channel");
        }
        () = dispatcher.dispatch() => {
            warn!(target: "searchdeck_bot", "Telegram dispatcher exited");
        }
    }

    Ok(())
}

async fn on_message(bot: Bot, msg: Message, engine: ChatEngine) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let transport = TelegramTransport::new(bot);
    let (user_id, chat) = (UserId(user.id.0), ChatId(msg.chat.id.0));

    let delivered = match msg.text() {
        Some(text) => {
            let incoming = IncomingMessage {
                user: user_id,
                chat,
                text: text.to_string(),
            };
            engine.handle_message(&transport, incoming).await
        }
        None => engine.handle_unsupported(&transport, user_id, chat).await,
    };
    if let Err(error) = delivered {
        warn!(
            target: "searchdeck_bot",
            user_id = user.id.0,
            error = %error,
            "Reply could not be delivered"
        );
    }
    Ok(())
}

async fn on_callback(bot: Bot, query: CallbackQuery, engine: ChatEngine) -> ResponseResult<()> {
    let Some(message) = query.regular_message() else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    let press = ButtonPress {
        user: UserId(query.from.id.0),
        chat: ChatId(message.chat.id.0),
        message: MessageId(message.id.0),
        callback_id: query.id.clone(),
        token: query.data.clone().unwrap_or_default(),
    };
    let transport = TelegramTransport::new(bot);
    if let Err(error) = engine.handle_button(&transport, press).await {
        warn!(
            target: "searchdeck_bot",
            user_id = query.from.id.0,
            error = %error,
            "Page update could not be delivered"
        );
    }
    Ok(())
}

/// Transport backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &str,
        message: &OutgoingMessage,
    ) -> Result<MessageId, DeliveryError> {
        let url = photo.parse::<reqwest::Url>().map_err(DeliveryError::new)?;
        let mut request = self
            .bot
            .send_photo(chat_id(chat), InputFile::url(url))
            .caption(message.text.clone());
        if let Some(mode) = parse_mode(message.format) {
            request = request.parse_mode(mode);
        }
        if let Some(markup) = keyboard(&message.controls) {
            request = request.reply_markup(markup);
        }
        let sent = request.await.map_err(DeliveryError::new)?;
        Ok(MessageId(sent.id.0))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(
        &self,
        chat: ChatId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, DeliveryError> {
        if let Some(photo) = &message.photo {
            return self.send_photo(chat, photo, message).await;
        }

        let mut request = self.bot.send_message(chat_id(chat), message.text.clone());
        if let Some(mode) = parse_mode(message.format) {
            request = request.parse_mode(mode);
        }
        if let Some(markup) = keyboard(&message.controls) {
            request = request.reply_markup(markup);
        }
        let sent = request.await.map_err(DeliveryError::new)?;
        Ok(MessageId(sent.id.0))
    }

    async fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.edit_message_text(
            chat_id(chat),
            teloxide::types::MessageId(message_id.0),
            message.text.clone(),
        );
        if let Some(mode) = parse_mode(message.format) {
            request = request.parse_mode(mode);
        }
        request = request.reply_markup(keyboard(&message.controls).unwrap_or_default());

        match request.await {
            Ok(_) => Ok(()),
            // Photo pages have a caption instead of text; replace them outright.
            Err(error) if error.to_string().contains(NO_TEXT_TO_EDIT) => {
                debug!(
                    target: "searchdeck_bot",
                    chat_id = %chat,
                    message_id = %message_id,
                    "Replacing photo message with a text page"
                );
                self.send(chat, message).await?;
                self.delete(chat, message_id).await
            }
            Err(error) => Err(DeliveryError::new(error)),
        }
    }

    async fn delete(&self, chat: ChatId, message_id: MessageId) -> Result<(), DeliveryError> {
        self.bot
            .delete_message(chat_id(chat), teloxide::types::MessageId(message_id.0))
            .await
            .map(|_| ())
            .map_err(DeliveryError::new)
    }

    async fn acknowledge(
        &self,
        callback_id: &str,
        notice: Option<Notice>,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(notice) = notice {
            request = request.text(notice.text).show_alert(notice.alert);
        }
        request.await.map(|_| ()).map_err(DeliveryError::new)
    }
}

fn chat_id(chat: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat.0)
}

fn parse_mode(format: TextFormat) -> Option<ParseMode> {
    match format {
        #[allow(deprecated)]
        TextFormat::Markdown => Some(ParseMode::Markdown),
        TextFormat::Plain => None,
    }
}

/// One row of inline buttons, or nothing when there are no controls.
fn keyboard(controls: &[Control]) -> Option<InlineKeyboardMarkup> {
    if controls.is_empty() {
        return None;
    }
    let row = controls
        .iter()
        .map(|control| InlineKeyboardButton::callback(control.label.clone(), control.token.clone()))
        .collect::<Vec<_>>();
    Some(InlineKeyboardMarkup::new(vec![row]))
}
