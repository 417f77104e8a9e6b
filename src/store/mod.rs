//! In-process conversation store.
//!
//! The store holds an immutable [`StoreSnapshot`] behind an `Arc`. Every
//! mutation builds the next snapshot and swaps it in whole, so a snapshot
//! handed out earlier is never observed half-updated.

pub mod backend;

use std::sync::Arc;

use tracing::debug;

use crate::errors::AppError;
use crate::models::{Conversation, Message};

pub use backend::{ConversationBackend, InMemoryBackend};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub conversations: Vec<Conversation>,
    /// `None` means a new, not yet created conversation.
    pub active_id: Option<String>,
}

impl StoreSnapshot {
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    snapshot: Arc<StoreSnapshot>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.snapshot.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.snapshot.get(id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.snapshot.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.snapshot.active()
    }

    fn update(&mut self, edit: impl FnOnce(&mut StoreSnapshot)) {
        let mut next = (*self.snapshot).clone();
        edit(&mut next);
        self.snapshot = Arc::new(next);
    }

    /// Replaces the whole list and leaves no conversation active.
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        debug!(count = conversations.len(), "Loaded conversation list");
        self.snapshot = Arc::new(StoreSnapshot { conversations, active_id: None });
    }

    /// Replaces the entry with the same id, or inserts it at the front.
    pub fn upsert(&mut self, conversation: Conversation) {
        self.update(|s| match s.conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation,
            None => s.conversations.insert(0, conversation),
        });
    }

    pub fn set_active(&mut self, id: Option<String>) {
        self.update(|s| s.active_id = id);
    }

    /// Appends `message` and returns the updated conversation.
    pub fn append_message(
        &mut self,
        conversation_id: &str,
        message: Message,
    ) -> Result<Conversation, AppError> {
        let current = self.get(conversation_id).ok_or_else(|| AppError::ConversationNotFound {
            id: conversation_id.to_string(),
        })?;
        let updated = current.with_message(message);
        self.upsert(updated.clone());
        Ok(updated)
    }

    /// Swaps a locally created message for the server's copy.
    pub fn replace_message(
        &mut self,
        conversation_id: &str,
        local_id: &str,
        server: Message,
    ) -> Result<(), AppError> {
        let current = self.get(conversation_id).ok_or_else(|| AppError::ConversationNotFound {
            id: conversation_id.to_string(),
        })?;
        let position = current.messages.iter().position(|m| m.id == local_id).ok_or_else(|| {
            AppError::MessageNotFound {
                conversation_id: conversation_id.to_string(),
                message_id: local_id.to_string(),
            }
        })?;
        let mut updated = current.clone();
        updated.messages[position] = server;
        self.upsert(updated);
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), AppError> {
        let mut updated = self
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::ConversationNotFound { id: id.to_string() })?;
        updated.title = title.to_string();
        self.upsert(updated);
        Ok(())
    }

    /// Removes a conversation. If it was active, the first remaining one
    /// becomes active.
    pub fn remove(&mut self, id: &str) -> Option<Conversation> {
        let removed = self.get(id).cloned()?;
        self.update(|s| {
            s.conversations.retain(|c| c.id != id);
            if s.active_id.as_deref() == Some(id) {
                s.active_id = s.conversations.first().map(|c| c.id.clone());
            }
        });
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.snapshot = Arc::new(StoreSnapshot::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn store_with(ids: &[&str]) -> ConversationStore {
        let mut store = ConversationStore::new();
        store.replace_all(
            ids.iter().map(|id| Conversation::new(id.to_string(), format!("conv {id}"))).collect(),
        );
        store
    }

    #[test]
    fn append_replaces_the_snapshot() {
        let mut store = store_with(&["a"]);
        let before = store.snapshot();
        store
            .append_message("a", Message::new(MessageRole::User, "oi".to_string()))
            .expect("append");
        assert!(before.get("a").expect("a").messages.is_empty());
        assert_eq!(store.get("a").expect("a").messages.len(), 1);
    }

    #[test]
    fn append_to_unknown_conversation_fails() {
        let mut store = store_with(&[]);
        let err = store
            .append_message("x", Message::new(MessageRole::User, "oi".to_string()))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn replace_message_reconciles_id() {
        let mut store = store_with(&["a"]);
        let local = Message::new(MessageRole::User, "oi".to_string());
        let local_id = local.id.clone();
        store.append_message("a", local.clone()).expect("append");

        let mut server = local;
        server.id = "srv-1".to_string();
        store.replace_message("a", &local_id, server).expect("replace");

        let messages = &store.get("a").expect("a").messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "srv-1");
        let again = messages[0].clone();
        assert!(store.replace_message("a", &local_id, again).is_err());
    }

    #[test]
    fn removing_active_selects_next() {
        let mut store = store_with(&["a", "b"]);
        store.set_active(Some("a".to_string()));
        store.remove("a").expect("removed");
        assert_eq!(store.active_id(), Some("b"));
        store.remove("b").expect("removed");
        assert_eq!(store.active_id(), None);
        assert!(store.remove("b").is_none());
    }

    #[test]
    fn upsert_inserts_new_conversations_first() {
        let mut store = store_with(&["a"]);
        store.upsert(Conversation::new("b".to_string(), "nova".to_string()));
        assert_eq!(store.conversations()[0].id, "b");
        store.rename("a", "renomeada").expect("rename");
        assert_eq!(store.get("a").expect("a").title, "renomeada");
        store.clear();
        assert!(store.conversations().is_empty());
    }
}
