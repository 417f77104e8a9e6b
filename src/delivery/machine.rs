use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
    Revealing,
    Committed,
    Errored,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingResponse => "awaitingResponse",
            Phase::Revealing => "revealing",
            Phase::Committed => "committed",
            Phase::Errored => "errored",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One more character became visible.
    Advanced,
    /// The last character became visible.
    Complete,
    /// Nothing changed: not revealing, or already fully revealed.
    Ignored,
}

/// Lifecycle of one assistant reply, from the moment the user message is
/// sent until it is committed or fails. Dropped once it reaches a terminal
/// phase.
#[derive(Debug, Clone)]
pub struct DeliveryState {
    phase: Phase,
    owner_conversation_id: String,
    full_text: String,
    /// Byte length of the visible prefix, always on a char boundary.
    revealed_len: usize,
    user_timestamp: DateTime<Utc>,
}

impl DeliveryState {
    /// Starts a delivery for a user message that has just been sent.
    pub fn awaiting(owner_conversation_id: String, user_timestamp: DateTime<Utc>) -> Self {
        debug!(conversation_id = %owner_conversation_id, "delivery: idle -> awaitingResponse");
        Self {
            phase: Phase::AwaitingResponse,
            owner_conversation_id,
            full_text: String::new(),
            revealed_len: 0,
            user_timestamp,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn owner(&self) -> &str {
        &self.owner_conversation_id
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn revealed(&self) -> &str {
        &self.full_text[..self.revealed_len]
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed_len == self.full_text.len()
    }

    /// The server may stamp the user message later than we did locally.
    pub fn reconcile_user_timestamp(&mut self, server_timestamp: DateTime<Utc>) {
        self.user_timestamp = self.user_timestamp.max(server_timestamp);
    }

    /// Stores the full reply and starts revealing it. Returns how many
    /// characters the reveal will take, or `None` if not awaiting a reply.
    pub fn receive(&mut self, full_text: String) -> Option<usize> {
        if self.phase != Phase::AwaitingResponse {
            warn!(phase = %self.phase, "delivery: reply received outside awaitingResponse");
            return None;
        }
        let total = full_text.chars().count();
        debug!(
            conversation_id = %self.owner_conversation_id,
            chars = total,
            "delivery: awaitingResponse -> revealing"
        );
        self.full_text = full_text;
        self.revealed_len = 0;
        self.phase = Phase::Revealing;
        Some(total)
    }

    /// Moves straight to `Errored` and builds the synthetic assistant
    /// message to commit in place of the reply.
    pub fn fail(&mut self, error_text: String) -> Option<Message> {
        if self.phase != Phase::AwaitingResponse {
            warn!(phase = %self.phase, "delivery: failure reported outside awaitingResponse");
            return None;
        }
        debug!(conversation_id = %self.owner_conversation_id, "delivery: awaitingResponse -> errored");
        self.phase = Phase::Errored;
        Some(Message::assistant_after(error_text, self.user_timestamp))
    }

    /// Reveals the next character.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Revealing {
            return TickOutcome::Ignored;
        }
        match self.full_text[self.revealed_len..].chars().next() {
            None => TickOutcome::Ignored,
            Some(ch) => {
                self.revealed_len += ch.len_utf8();
                if self.is_fully_revealed() {
                    TickOutcome::Complete
                } else {
                    TickOutcome::Advanced
                }
            }
        }
    }

    /// Commits the reply. Succeeds once, and only after the whole text is
    /// visible; every later call returns `None`.
    pub fn commit(&mut self) -> Option<Message> {
        if self.phase != Phase::Revealing || !self.is_fully_revealed() {
            return None;
        }
        debug!(conversation_id = %self.owner_conversation_id, "delivery: revealing -> committed");
        self.phase = Phase::Committed;
        Some(Message::assistant_after(self.full_text.clone(), self.user_timestamp))
    }
}
