use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{AttachmentRef, Message, SendOutcome};

/// Sends one user message and waits for the complete assistant reply.
/// Timeouts and retries are the implementation's business.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_user_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[AttachmentRef],
    ) -> Result<SendOutcome, AppError>;
}

/// Offline transport used by the demo binary. Answers every message with a
/// short formatted reply, after an optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct EchoTransport {
    latency: Duration,
}

impl EchoTransport {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn reply_for(content: &str, attachments: &[AttachmentRef]) -> String {
        let mut reply = format!("## Resposta\n\nVocê perguntou: **{}**", content.trim());
        if !attachments.is_empty() {
            reply.push_str("\n\nArquivos recebidos:");
            for attachment in attachments {
                reply.push_str(&format!("\n- `{}` ({} bytes)", attachment.name, attachment.size));
            }
        }
        reply.push_str("\n\nExemplo de lance: R$ 1.500,00 com desconto de 10%, nota 4/5.");
        reply.push_str("\n\n$$\\text{lance} = \\frac{3}{4} \\times R$ 2.000$$");
        reply
    }
}

#[async_trait]
impl ChatTransport for EchoTransport {
    async fn send_user_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[AttachmentRef],
    ) -> Result<SendOutcome, AppError> {
        if content.trim().is_empty() {
            error!("Echo transport refused an empty message for conversation {conversation_id}");
            return Err(AppError::transport("empty message"));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(conversation_id, attachments = attachments.len(), "echo reply ready");

        // The server assigns its own id to the stored user message.
        let user_message = Message::user(content.to_string(), attachments);
        Ok(SendOutcome {
            user_message: Some(user_message),
            assistant_text: Self::reply_for(content, attachments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_reply_mentions_the_question_and_files() {
        let transport = EchoTransport::default();
        let attachment = AttachmentRef {
            file_id: "f1".to_string(),
            name: "edital.pdf".to_string(),
            size: 10,
            mime_type: "application/pdf".to_string(),
        };
        let outcome = transport
            .send_user_message("c1", "Qual o lance mínimo?", &[attachment])
            .await
            .expect("echo");
        assert!(outcome.assistant_text.contains("**Qual o lance mínimo?**"));
        assert!(outcome.assistant_text.contains("`edital.pdf`"));
        let user_message = outcome.user_message.expect("server copy");
        assert_eq!(user_message.content, "Qual o lance mínimo?");
        assert!(user_message.files.is_some());
    }

    #[tokio::test]
    async fn empty_message_is_a_transport_failure() {
        let err = EchoTransport::default().send_user_message("c1", " ", &[]).await.unwrap_err();
        assert!(err.is_transport());
    }
}
