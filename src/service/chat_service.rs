use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::config::ChatConfig;
use crate::delivery::{
    DeliveryEvent, DeliveryState, DeliveryView, Phase, RevealHandle, RevealScheduler,
    RevealSignal, TickOutcome,
};
use crate::errors::AppError;
use crate::models::{title_from_message, AttachmentRef, Conversation, Message, SendOutcome};
use crate::store::{ConversationBackend, ConversationStore};
use crate::transport::ChatTransport;

const EVENT_BUFFER: usize = 64;

struct ActiveDelivery {
    state: DeliveryState,
    reveal: Option<RevealHandle>,
}

/// Owns the conversation store and the reply currently in flight. Every
/// mutation happens through `&mut self` on the host task; the reveal
/// scheduler only feeds signals back through [`next_signal`](Self::next_signal).
pub struct ChatService<T, B> {
    store: ConversationStore,
    transport: T,
    backend: B,
    config: ChatConfig,
    delivery: Option<ActiveDelivery>,
    view_tx: watch::Sender<DeliveryView>,
    events_tx: broadcast::Sender<DeliveryEvent>,
}

impl<T: ChatTransport, B: ConversationBackend> ChatService<T, B> {
    pub fn new(transport: T, backend: B, config: ChatConfig) -> Self {
        let (view_tx, _) = watch::channel(DeliveryView::default());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store: ConversationStore::new(),
            transport,
            backend,
            config,
            delivery: None,
            view_tx,
            events_tx,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn subscribe(&self) -> watch::Receiver<DeliveryView> {
        self.view_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.events_tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.delivery.as_ref().map_or(Phase::Idle, |active| active.state.phase())
    }

    pub fn is_revealing(&self) -> bool {
        self.delivery.as_ref().is_some_and(|active| active.reveal.is_some())
    }

    pub fn view(&self) -> DeliveryView {
        self.view_tx.borrow().clone()
    }

    // ── Conversation management ──────────────────────────────────────────────

    /// Loads the conversation list. No conversation is active afterwards.
    pub async fn bootstrap(&mut self) -> Result<(), AppError> {
        let conversations = self.backend.list_conversations().await?;
        self.cancel_reveal();
        info!(count = conversations.len(), "Conversation list loaded");
        self.store.replace_all(conversations);
        Ok(())
    }

    /// Starts a fresh chat. The conversation itself is created by the first
    /// submitted message.
    pub fn create_conversation(&mut self) {
        self.cancel_reveal();
        self.store.set_active(None);
        info!("Started a new conversation");
    }

    pub async fn select_conversation(&mut self, id: &str) -> Result<(), AppError> {
        if self.store.active_id() == Some(id) {
            return Ok(());
        }
        let conversation = self.backend.fetch_conversation(id).await?;
        self.cancel_reveal();
        self.store.upsert(conversation);
        self.store.set_active(Some(id.to_string()));
        info!(conversation_id = id, "Switched conversation");
        Ok(())
    }

    pub async fn rename_conversation(&mut self, id: &str, title: &str) -> Result<(), AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::EmptyField { field_name: "title".to_string() });
        }
        self.backend.rename_conversation(id, title).await?;
        self.store.rename(id, title)?;
        info!(conversation_id = id, "Renamed conversation");
        Ok(())
    }

    pub async fn delete_conversation(&mut self, id: &str) -> Result<(), AppError> {
        self.backend.delete_conversation(id).await?;
        if self.delivery.as_ref().is_some_and(|active| active.state.owner() == id) {
            self.cancel_reveal();
        }
        self.store.remove(id);
        info!(conversation_id = id, "Deleted conversation");
        Ok(())
    }

    pub async fn clear_conversations(&mut self) -> Result<(), AppError> {
        self.backend.clear_conversations().await?;
        self.cancel_reveal();
        self.store.clear();
        info!("Cleared all conversations");
        Ok(())
    }

    // ── Delivery ─────────────────────────────────────────────────────────────

    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        let max = self.config.max_message_length;
        let actual = content.chars().count();
        if actual > max {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: max,
                actual_length: actual,
            });
        }
        Ok(content)
    }

    /// Sends a user message and starts delivering the reply.
    ///
    /// The user message is in the store before the transport is called and
    /// stays there whatever happens next. Returns `Revealing` when a reveal
    /// started, `Errored` when the transport failed (the error message is
    /// already committed) and `Idle` when the reply was empty.
    pub async fn submit(
        &mut self,
        content: &str,
        attachments: &[AttachmentRef],
    ) -> Result<Phase, AppError> {
        let content = self.validate(content)?;
        if let Some(active) = &self.delivery {
            return Err(AppError::ReplyInFlight {
                conversation_id: active.state.owner().to_string(),
            });
        }

        let conversation_id = match self.store.active_id() {
            Some(id) => id.to_string(),
            None => {
                let conversation =
                    self.backend.create_conversation(&title_from_message(content)).await?;
                info!(conversation_id = %conversation.id, title = %conversation.title, "Created conversation");
                let id = conversation.id.clone();
                self.store.upsert(conversation);
                self.store.set_active(Some(id.clone()));
                id
            }
        };

        let user_message = Message::user(content.to_string(), attachments);
        let local_id = user_message.id.clone();
        let user_timestamp = user_message.timestamp;
        self.store.append_message(&conversation_id, user_message)?;

        self.delivery = Some(ActiveDelivery {
            state: DeliveryState::awaiting(conversation_id.clone(), user_timestamp),
            reveal: None,
        });
        self.transition();

        match self.transport.send_user_message(&conversation_id, content, attachments).await {
            Ok(outcome) => Ok(self.begin_reveal(&conversation_id, &local_id, outcome)),
            Err(e) => {
                warn!("Reply for conversation {conversation_id} failed: {e}");
                Ok(self.fail_delivery(&conversation_id).await)
            }
        }
    }

    fn begin_reveal(&mut self, conversation_id: &str, local_id: &str, outcome: SendOutcome) -> Phase {
        if let Some(server) = outcome.user_message {
            let server_timestamp = server.timestamp;
            if server.id != local_id {
                match self.store.replace_message(conversation_id, local_id, server) {
                    Ok(()) => debug!(conversation_id, local_id, "User message reconciled"),
                    Err(e) => warn!("Could not reconcile user message: {e}"),
                }
            }
            if let Some(active) = self.delivery.as_mut() {
                active.state.reconcile_user_timestamp(server_timestamp);
            }
        }

        let Some(active) = self.delivery.as_mut() else {
            return Phase::Idle;
        };
        match active.state.receive(outcome.assistant_text) {
            Some(0) | None => {
                warn!(conversation_id, "Empty reply, nothing to commit");
                self.delivery = None;
                self.transition();
                Phase::Idle
            }
            Some(total_chars) => {
                active.reveal = Some(RevealScheduler::start(
                    total_chars,
                    self.config.reveal_tick,
                    self.config.commit_delay,
                ));
                self.transition();
                Phase::Revealing
            }
        }
    }

    async fn fail_delivery(&mut self, conversation_id: &str) -> Phase {
        let error_text = self.config.error_message.clone();
        let Some(message) = self.delivery.as_mut().and_then(|active| active.state.fail(error_text))
        else {
            return self.phase();
        };
        self.transition();
        self.delivery = None;
        self.record_assistant_message(conversation_id, message).await;
        self.transition();
        Phase::Errored
    }

    /// Waits for the next reveal signal. Returns `None` at once when no
    /// reveal is running.
    pub async fn next_signal(&mut self) -> Option<RevealSignal> {
        match self.delivery.as_mut().and_then(|active| active.reveal.as_mut()) {
            Some(handle) => handle.recv().await,
            None => None,
        }
    }

    /// Applies one scheduler signal and returns the resulting phase.
    /// `Committed` is returned for the signal that committed the reply.
    pub async fn apply_signal(&mut self, signal: RevealSignal) -> Phase {
        let Some(active) = self.delivery.as_mut() else {
            return Phase::Idle;
        };
        match signal {
            RevealSignal::Tick => {
                if active.state.tick() != TickOutcome::Ignored {
                    self.publish_view();
                }
                self.phase()
            }
            RevealSignal::Settled => {
                let Some(message) = active.state.commit() else {
                    debug!("Settled before the reply was fully visible, ignoring");
                    return self.phase();
                };
                let owner = active.state.owner().to_string();
                self.transition();
                self.delivery = None;
                self.record_assistant_message(&owner, message).await;
                self.transition();
                Phase::Committed
            }
        }
    }

    /// Runs the current reveal to completion. Returns the committed message,
    /// or `None` if there was nothing to reveal or the reveal was cancelled.
    pub async fn drive_reveal(&mut self) -> Option<Message> {
        let mut events = self.events();
        while let Some(signal) = self.next_signal().await {
            if self.apply_signal(signal).await == Phase::Committed {
                while let Ok(event) = events.try_recv() {
                    if let DeliveryEvent::Committed(message) = event {
                        return Some(message);
                    }
                }
            }
        }
        if self.delivery.is_some() {
            self.cancel_reveal();
        }
        None
    }

    /// Stops the reveal in flight. Nothing is committed; the user message
    /// stays in the store.
    pub fn cancel_reveal(&mut self) {
        let Some(active) = self.delivery.take() else {
            return;
        };
        if let Some(handle) = &active.reveal {
            handle.cancel();
        }
        info!(
            conversation_id = active.state.owner(),
            phase = %active.state.phase(),
            "Reply delivery cancelled"
        );
        self.transition();
    }

    async fn record_assistant_message(&mut self, conversation_id: &str, message: Message) {
        let conversation = match self.store.append_message(conversation_id, message.clone()) {
            Ok(conversation) => conversation,
            Err(e) => {
                warn!("Dropping assistant message: {e}");
                return;
            }
        };
        info!(conversation_id, message_id = %message.id, "Assistant message committed");
        let _ = self.events_tx.send(DeliveryEvent::Committed(message));
        self.persist(&conversation).await;
    }

    async fn persist(&self, conversation: &Conversation) {
        if let Err(e) = self.backend.persist_conversation(conversation).await {
            error!("Failed to persist conversation {}: {e}", conversation.id);
        }
    }

    fn publish_view(&self) {
        let view = self.delivery.as_ref().map(|active| DeliveryView::from(&active.state));
        self.view_tx.send_replace(view.unwrap_or_default());
    }

    fn transition(&self) {
        self.publish_view();
        let _ = self.events_tx.send(DeliveryEvent::PhaseChanged(self.phase()));
    }
}
