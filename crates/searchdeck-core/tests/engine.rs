use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use searchdeck_client::types::{ContentResult, ProviderType, ResultMetadata};
use searchdeck_client::{ContentProvider, ProviderClients};
use searchdeck_core::messages;
use searchdeck_core::transport::{
    ButtonPress, ChatId, IncomingMessage, MessageId, Notice, OutgoingMessage, TextFormat,
    Transport, UserId,
};
use searchdeck_core::{AppContext, ChatEngine, DeliveryError, Settings};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Sent(MessageId, OutgoingMessage),
    Edited(MessageId, OutgoingMessage),
    Deleted(MessageId),
    Acknowledged(Option<Notice>),
}

/// Records every call; optionally rejects Markdown messages.
#[derive(Default)]
struct RecordingTransport {
    events: Mutex<Vec<Event>>,
    reject_markdown: bool,
    reject_all_edits: bool,
}

impl RecordingTransport {
    fn rejecting_markdown() -> Self {
        Self {
            reject_markdown: true,
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock").clone()
    }

    fn sent(&self) -> Vec<OutgoingMessage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Sent(_, message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn last_notice(&self) -> Option<Notice> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::Acknowledged(notice) => Some(notice),
            _ => None,
        })?
    }

    fn record(&self, event: Event) -> usize {
        let mut events = self.events.lock().expect("events lock");
        events.push(event);
        events.len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        _chat: ChatId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, DeliveryError> {
        if self.reject_markdown && message.format == TextFormat::Markdown {
            return Err(DeliveryError::new("can't parse entities"));
        }
        let id = MessageId(i32::try_from(self.events().len() + 1).unwrap_or(i32::MAX));
        self.record(Event::Sent(id, message.clone()));
        Ok(id)
    }

    async fn edit(
        &self,
        _chat: ChatId,
        message_id: MessageId,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        if self.reject_all_edits
            || (self.reject_markdown && message.format == TextFormat::Markdown)
        {
            return Err(DeliveryError::new("message can't be edited"));
        }
        self.record(Event::Edited(message_id, message.clone()));
        Ok(())
    }

    async fn delete(&self, _chat: ChatId, message_id: MessageId) -> Result<(), DeliveryError> {
        self.record(Event::Deleted(message_id));
        Ok(())
    }

    async fn acknowledge(
        &self,
        _callback_id: &str,
        notice: Option<Notice>,
    ) -> Result<(), DeliveryError> {
        self.record(Event::Acknowledged(notice));
        Ok(())
    }
}

struct StubProvider {
    provider: ProviderType,
    results: Vec<ContentResult>,
    fail: bool,
}

#[async_trait]
impl ContentProvider for StubProvider {
    fn provider(&self) -> ProviderType {
        self.provider
    }

    async fn fetch(&self, _subject: &str) -> Result<Vec<ContentResult>> {
        if self.fail {
            anyhow::bail!("{} timed out", self.provider.slug());
        }
        Ok(self.results.clone())
    }
}

fn provider(provider: ProviderType, results: Vec<ContentResult>) -> Arc<dyn ContentProvider> {
    Arc::new(StubProvider {
        provider,
        results,
        fail: false,
    })
}

fn failing(provider: ProviderType) -> Arc<dyn ContentProvider> {
    Arc::new(StubProvider {
        provider,
        results: Vec::new(),
        fail: true,
    })
}

fn wiki_result(chunks: &[&str]) -> ContentResult {
    ContentResult {
        provider: ProviderType::Wikipedia,
        title: "Интернет".to_string(),
        content: chunks.join("\n\n"),
        url: "https://ru.wikipedia.org/wiki/Интернет".to_string(),
        thumbnail: None,
        metadata: ResultMetadata::Encyclopedia {
            chunks: chunks.iter().map(ToString::to_string).collect(),
        },
    }
}

fn habr_result(title: &str) -> ContentResult {
    ContentResult {
        provider: ProviderType::Habr,
        title: title.to_string(),
        content: format!("*{title}*\n{}", "текст ".repeat(700)),
        url: "https://habr.com/ru/articles/1/".to_string(),
        thumbnail: None,
        metadata: ResultMetadata::Article {
            author: Some("alice".to_string()),
            rating: Some("+5".to_string()),
        },
    }
}

fn engine(clients: ProviderClients) -> ChatEngine {
    ChatEngine::new(Arc::new(AppContext::new(Settings::default(), clients)))
}

fn standard_engine() -> ChatEngine {
    engine(ProviderClients::new(
        provider(
            ProviderType::Wikipedia,
            vec![wiki_result(&["Первая страница", "Вторая страница", "Третья"])],
        ),
        failing(ProviderType::GitHub),
        failing(ProviderType::StackOverflow),
        provider(ProviderType::Habr, vec![habr_result("Как устроен интернет")]),
    ))
}

fn query(text: &str) -> IncomingMessage {
    IncomingMessage {
        user: UserId(42),
        chat: ChatId(42),
        text: text.to_string(),
    }
}

fn press(token: &str) -> ButtonPress {
    ButtonPress {
        user: UserId(42),
        chat: ChatId(42),
        message: MessageId(3),
        callback_id: "cb".to_string(),
        token: token.to_string(),
    }
}

fn tokens(message: &OutgoingMessage) -> Vec<String> {
    message
        .controls
        .iter()
        .map(|control| control.token.clone())
        .collect()
}

#[tokio::test]
async fn history_query_delivers_first_page_with_next_only() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine
        .handle_message(&transport, query("история интернета"))
        .await
        .expect("delivered");

    let events = transport.events();
    assert!(matches!(&events[0], Event::Sent(_, status) if status.text == messages::SEARCHING));
    assert!(matches!(events[1], Event::Deleted(MessageId(1))));

    let sent = transport.sent();
    let first_page = &sent[1];
    assert_eq!(first_page.format, TextFormat::Markdown);
    assert!(first_page.text.starts_with("*Интернет*\n\nПервая страница"));
    assert!(first_page.text.contains("Страница 1 из 3"));
    assert_eq!(tokens(first_page), vec!["next_0"]);

    let overview = &sent[2];
    assert!(overview.text.starts_with("*Хабр*: интернета"));
    assert!(overview
        .text
        .contains("1. *Как устроен интернет*\n[Открыть на Хабре](https://habr.com/ru/articles/1/)"));
    assert_eq!(overview.controls.len(), 1);
    assert!(overview.controls[0].token.starts_with("read_"));
}

#[tokio::test]
async fn paging_through_session_and_past_the_end() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();
    engine
        .handle_message(&transport, query("история интернета"))
        .await
        .expect("delivered");

    engine.handle_button(&transport, press("next_0")).await.expect("page 2");
    engine.handle_button(&transport, press("next_1")).await.expect("page 3");

    let edits: Vec<_> = transport
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Edited(_, message) => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(edits.len(), 2);
    assert!(edits[1].text.contains("Третья"));
    assert_eq!(tokens(&edits[1]), vec!["prev_2"]);

    engine.handle_button(&transport, press("next_2")).await.expect("notice only");
    assert_eq!(
        transport.last_notice(),
        Some(Notice::toast(messages::NAVIGATION_LIMIT))
    );
}

#[tokio::test]
async fn button_without_session_reports_expiry() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine.handle_button(&transport, press("prev_1")).await.expect("notice only");
    assert_eq!(
        transport.last_notice(),
        Some(Notice::alert(messages::SESSION_EXPIRED))
    );
}

#[tokio::test]
async fn malformed_token_fails_closed() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine
        .handle_button(&transport, press("art_next_zz"))
        .await
        .expect("notice only");
    assert_eq!(
        transport.last_notice(),
        Some(Notice::toast(messages::MALFORMED_ACTION))
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn cached_article_opens_and_clamps() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();
    engine
        .handle_message(&transport, query("история интернета"))
        .await
        .expect("delivered");

    let read_token = transport.sent()[2].controls[0].token.clone();
    let id = read_token.trim_start_matches("read_").to_string();

    engine.handle_button(&transport, press(&read_token)).await.expect("opened");
    let article = transport.sent().last().cloned().expect("article page");
    assert!(article.text.starts_with("*Как устроен интернет*\n_Хабр_\n\n"));
    assert_eq!(tokens(&article), vec![format!("art_next_{id}_0")]);

    engine
        .handle_button(&transport, press(&format!("art_next_{id}_40")))
        .await
        .expect("clamped");
    let Some(Event::Edited(_, last)) = transport
        .events()
        .into_iter()
        .rev()
        .find(|event| matches!(event, Event::Edited(..)))
    else {
        panic!("expected an edit");
    };
    assert!(last.text.contains("Страница 2 из 2"));
    assert_eq!(tokens(&last), vec![format!("art_prev_{id}_1")]);
}

#[tokio::test]
async fn unknown_article_reports_notice() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine
        .handle_button(&transport, press("read_deadbeef"))
        .await
        .expect("notice only");
    assert_eq!(
        transport.last_notice(),
        Some(Notice::alert(messages::ARTICLE_EXPIRED))
    );
}

#[tokio::test]
async fn markdown_rejection_falls_back_to_plain_text() {
    let engine = standard_engine();
    let transport = RecordingTransport::rejecting_markdown();

    engine
        .handle_message(&transport, query("история интернета"))
        .await
        .expect("plain retry delivered");

    let sent = transport.sent();
    let page = &sent[1];
    assert_eq!(page.format, TextFormat::Plain);
    assert!(page.photo.is_none());
    assert!(page.text.starts_with("Интернет\n\nПервая страница"));
    assert!(page
        .text
        .ends_with("Открыть в Википедии: https://ru.wikipedia.org/wiki/Интернет"));
    assert_eq!(tokens(page), vec!["next_0"]);
}

#[tokio::test]
async fn failed_edit_is_reported_and_returned() {
    let engine = standard_engine();
    let transport = RecordingTransport {
        reject_all_edits: true,
        ..RecordingTransport::default()
    };
    engine
        .handle_message(&transport, query("история интернета"))
        .await
        .expect("delivered");

    let error = engine
        .handle_button(&transport, press("next_0"))
        .await
        .expect_err("edit failure surfaces");
    assert!(error.reason.contains("can't be edited"));
    assert_eq!(
        transport.last_notice(),
        Some(Notice::alert(messages::EDIT_FAILED))
    );
}

#[tokio::test]
async fn nothing_found_replies_with_hint() {
    let engine = engine(ProviderClients::new(
        provider(ProviderType::Wikipedia, Vec::new()),
        failing(ProviderType::GitHub),
        provider(ProviderType::StackOverflow, Vec::new()),
        failing(ProviderType::Habr),
    ));
    let transport = RecordingTransport::default();

    engine
        .handle_message(&transport, query("qwzxv"))
        .await
        .expect("delivered");

    let sent = transport.sent();
    assert_eq!(sent.last().map(|m| m.text.as_str()), Some(messages::NO_RESULTS));
}

#[tokio::test]
async fn short_queries_and_commands() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine.handle_message(&transport, query(" я ")).await.expect("sent");
    engine.handle_message(&transport, query("/start")).await.expect("sent");
    engine.handle_message(&transport, query("/help@SearchDeckBot")).await.expect("sent");
    engine.handle_message(&transport, query("/weather")).await.expect("sent");

    let texts: Vec<_> = transport.sent().into_iter().map(|m| m.text).collect();
    assert_eq!(
        texts,
        vec![
            messages::QUERY_TOO_SHORT,
            messages::GREETING,
            messages::HELP,
            messages::UNKNOWN_COMMAND,
        ]
    );
}

#[tokio::test]
async fn non_text_message_gets_text_only_hint() {
    let engine = standard_engine();
    let transport = RecordingTransport::default();

    engine
        .handle_unsupported(&transport, UserId(42), ChatId(42))
        .await
        .expect("sent");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, messages::TEXT_ONLY);
    assert_eq!(sent[0].format, TextFormat::Plain);
    assert!(sent[0].controls.is_empty());
    assert_eq!(engine.context().store.session_count(), 0);
}
