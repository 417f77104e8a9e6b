//! Shared integration test helpers.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` keeps files that use only some helpers quiet.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use leilao_chat::config::ChatConfig;
use leilao_chat::delivery::DeliveryEvent;
use leilao_chat::errors::AppError;
use leilao_chat::models::{AttachmentRef, Conversation, Message, SendOutcome};
use leilao_chat::service::ChatService;
use leilao_chat::store::InMemoryBackend;
use leilao_chat::transport::ChatTransport;
use tokio::sync::broadcast;

pub const ERROR_TEXT: &str = "⚠️ Erro ao enviar mensagem. Tente novamente.";

/// One recorded call to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub conversation_id: String,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
}

/// Transport that answers from a queue of scripted outcomes, then fails.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<SendOutcome, AppError>>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl ScriptedTransport {
    pub fn replying(texts: &[&str]) -> Self {
        let transport = Self::default();
        for text in texts {
            transport.push(Ok(SendOutcome { user_message: None, assistant_text: text.to_string() }));
        }
        transport
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.push(Err(AppError::transport("connection reset")));
        transport
    }

    pub fn push(&self, reply: Result<SendOutcome, AppError>) {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send_user_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[AttachmentRef],
    ) -> Result<SendOutcome, AppError> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(SentMessage {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            attachments: attachments.to_vec(),
        });
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(AppError::transport("no scripted reply left")))
    }
}

pub fn test_config() -> ChatConfig {
    ChatConfig {
        reveal_tick: Duration::from_millis(8),
        commit_delay: Duration::from_millis(150),
        ..ChatConfig::default()
    }
}

pub fn service(transport: ScriptedTransport) -> ChatService<ScriptedTransport, InMemoryBackend> {
    ChatService::new(transport, InMemoryBackend::default(), test_config())
}

/// Service whose backend already holds `seed`.
pub fn seeded_service(
    transport: ScriptedTransport,
    seed: Vec<Conversation>,
) -> ChatService<ScriptedTransport, InMemoryBackend> {
    ChatService::new(transport, InMemoryBackend::new(seed), test_config())
}

/// Everything broadcast so far, without waiting.
pub fn drain(events: &mut broadcast::Receiver<DeliveryEvent>) -> Vec<DeliveryEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn committed(events: &[DeliveryEvent]) -> Vec<Message> {
    events
        .iter()
        .filter_map(|event| match event {
            DeliveryEvent::Committed(message) => Some(message.clone()),
            DeliveryEvent::PhaseChanged(_) => None,
        })
        .collect()
}
