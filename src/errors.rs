use thiserror::Error;

/// Top-level error for the chat core.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── Delivery errors ──────────────────────────────────────────────────────
    #[error("A reply for conversation '{conversation_id}' is still being delivered")]
    ReplyInFlight { conversation_id: String },

    #[error("Transport failed: {message}")]
    TransportFailed { message: String },

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Conversation '{id}' not found")]
    ConversationNotFound { id: String },

    #[error("Message '{message_id}' not found in conversation '{conversation_id}'")]
    MessageNotFound { conversation_id: String, message_id: String },

    #[error("Conversation backend failed: {message}")]
    BackendFailed { message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn transport(message: impl Into<String>) -> Self {
        AppError::TransportFailed { message: message.into() }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        AppError::BackendFailed { message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ConversationNotFound { .. } | AppError::MessageNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. } | AppError::FieldTooLong { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::TransportFailed { .. })
    }
}

/// Failure reported by a [`crate::math::MathBackend`]. Never escapes the
/// [`crate::math::MathDelegate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathRenderError {
    #[error("unbalanced braces in '{source_text}'")]
    UnbalancedBraces { source_text: String },

    #[error("\\frac expects two brace groups in '{source_text}'")]
    MissingFractionArgument { source_text: String },

    #[error("empty formula")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        let empty = AppError::EmptyField { field_name: "message".to_string() };
        assert!(empty.is_validation());
        assert!(!empty.is_not_found());

        let missing = AppError::ConversationNotFound { id: "c1".to_string() };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "Conversation 'c1' not found");

        assert!(AppError::transport("timeout").is_transport());
    }
}
