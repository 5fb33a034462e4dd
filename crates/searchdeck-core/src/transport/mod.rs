//! Chat transport seam.
//!
//! The engine talks to users only through [`Transport`]; the Telegram channel
//! and the console renderer are both implementations of it.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChatId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(pub i32);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user: UserId,
    pub chat: ChatId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub user: UserId,
    pub chat: ChatId,
    pub message: MessageId,
    pub callback_id: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextFormat {
    Markdown,
    Plain,
}

/// An inline button: visible label plus the action token it sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Image URL; the text becomes its caption.
    pub photo: Option<String>,
    /// A single row of buttons.
    pub controls: Vec<Control>,
    pub format: TextFormat,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo: None,
            controls: Vec::new(),
            format: TextFormat::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            format: TextFormat::Markdown,
            ..Self::plain(text)
        }
    }

    #[must_use]
    pub fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.controls = controls;
        self
    }

    #[must_use]
    pub fn with_photo(mut self, photo: Option<String>) -> Self {
        self.photo = photo;
        self
    }
}

/// Short reply to a button press, shown as a toast or as a modal alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub text: String,
    pub alert: bool,
}

impl Notice {
    pub fn toast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: false,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, chat: ChatId, message: &OutgoingMessage)
        -> Result<MessageId, DeliveryError>;

    async fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError>;

    async fn delete(&self, chat: ChatId, message_id: MessageId) -> Result<(), DeliveryError>;

    async fn acknowledge(
        &self,
        callback_id: &str,
        notice: Option<Notice>,
    ) -> Result<(), DeliveryError>;
}

/// The same page without markup or image, used for the single retry.
#[must_use]
pub fn plain_fallback(message: &OutgoingMessage, plain_text: String) -> OutgoingMessage {
    OutgoingMessage {
        text: plain_text,
        photo: None,
        controls: message.controls.clone(),
        format: TextFormat::Plain,
    }
}

/// Send `message`, retrying once with `fallback` if the first attempt fails.
pub async fn send_with_fallback(
    transport: &dyn Transport,
    chat: ChatId,
    message: &OutgoingMessage,
    fallback: &OutgoingMessage,
) -> Result<MessageId, DeliveryError> {
    match transport.send(chat, message).await {
        Ok(id) => Ok(id),
        Err(error) => {
            warn!(
                target: "searchdeck_core",
                chat_id = %chat,
                error = %error,
                "Send failed; retrying as plain text"
            );
            transport.send(chat, fallback).await
        }
    }
}

/// Edit `message_id` in place, retrying once with `fallback`.
pub async fn edit_with_fallback(
    transport: &dyn Transport,
    chat: ChatId,
    message_id: MessageId,
    message: &OutgoingMessage,
    fallback: &OutgoingMessage,
) -> Result<(), DeliveryError> {
    match transport.edit(chat, message_id, message).await {
        Ok(()) => Ok(()),
        Err(error) => {
            warn!(
                target: "searchdeck_core",
                chat_id = %chat,
                message_id = %message_id,
                error = %error,
                "Edit failed; retrying as plain text"
            );
            transport.edit(chat, message_id, fallback).await
        }
    }
}
