//! Conversation persistence collaborator.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::Conversation;

/// Where conversations live outside the process. The delivery path only
/// calls [`persist_conversation`](Self::persist_conversation), at commit
/// and error boundaries.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, AppError>;

    async fn fetch_conversation(&self, id: &str) -> Result<Conversation, AppError>;

    async fn create_conversation(&self, title: &str) -> Result<Conversation, AppError>;

    async fn persist_conversation(&self, conversation: &Conversation) -> Result<(), AppError>;

    async fn rename_conversation(&self, id: &str, title: &str) -> Result<(), AppError>;

    async fn delete_conversation(&self, id: &str) -> Result<(), AppError>;

    async fn clear_conversations(&self) -> Result<(), AppError>;
}

/// Backend that keeps everything in memory, newest first.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    conversations: Mutex<Vec<Conversation>>,
}

impl InMemoryBackend {
    pub fn new(seed: Vec<Conversation>) -> Self {
        Self { conversations: Mutex::new(seed) }
    }

    /// Copy of what has been persisted so far.
    pub fn stored(&self) -> Vec<Conversation> {
        self.conversations.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Vec<Conversation>) -> R) -> R {
        let mut guard = self.conversations.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn not_found(id: &str) -> AppError {
        error!("Conversation {id} not found in backend");
        AppError::ConversationNotFound { id: id.to_string() }
    }
}

#[async_trait]
impl ConversationBackend for InMemoryBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        Ok(self.stored())
    }

    async fn fetch_conversation(&self, id: &str) -> Result<Conversation, AppError> {
        self.with(|all| all.iter().find(|c| c.id == id).cloned())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, AppError> {
        let conversation = Conversation::new(uuid::Uuid::new_v4().to_string(), title.to_string());
        debug!(id = %conversation.id, "Created conversation");
        self.with(|all| all.insert(0, conversation.clone()));
        Ok(conversation)
    }

    async fn persist_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        self.with(|all| match all.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation.clone(),
            None => all.insert(0, conversation.clone()),
        });
        Ok(())
    }

    async fn rename_conversation(&self, id: &str, title: &str) -> Result<(), AppError> {
        self.with(|all| {
            all.iter_mut().find(|c| c.id == id).map(|c| c.title = title.to_string())
        })
        .ok_or_else(|| Self::not_found(id))
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), AppError> {
        let removed = self.with(|all| {
            let before = all.len();
            all.retain(|c| c.id != id);
            before != all.len()
        });
        if removed {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }

    async fn clear_conversations(&self) -> Result<(), AppError> {
        self.with(|all| all.clear());
        Ok(())
    }
}
