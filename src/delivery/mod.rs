//! Progressive delivery of assistant replies.

pub mod machine;
pub mod scheduler;

pub use machine::{DeliveryState, Phase, TickOutcome};
pub use scheduler::{RevealHandle, RevealScheduler, RevealSignal};

use crate::models::Message;

/// What the host should currently show for the reply in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryView {
    pub phase: Phase,
    pub conversation_id: Option<String>,
    pub revealed: String,
}

impl From<&DeliveryState> for DeliveryView {
    fn from(state: &DeliveryState) -> Self {
        Self {
            phase: state.phase(),
            conversation_id: Some(state.owner().to_string()),
            revealed: state.revealed().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryEvent {
    PhaseChanged(Phase),
    /// An assistant message (reply or synthetic error) entered history.
    Committed(Message),
}
