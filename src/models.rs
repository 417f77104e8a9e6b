use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Titles longer than this are truncated with an ellipsis.
const TITLE_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self { id, title, messages: Vec::new(), created_at: now, updated_at: now }
    }

    /// Returns a copy with `message` appended and `updated_at` bumped.
    pub fn with_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.updated_at = Utc::now().max(message.timestamp);
        next.messages.push(message);
        next
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Derives a conversation title from the first user message.
pub fn title_from_message(message: &str) -> String {
    let t = message.trim();
    if t.chars().count() > TITLE_MAX_CHARS {
        format!("{}…", t.chars().take(TITLE_MAX_CHARS).collect::<String>())
    } else {
        t.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Metadata kept on a user message for each attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// A file already uploaded by the upload collaborator, referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl From<&AttachmentRef> for FileMeta {
    fn from(a: &AttachmentRef) -> Self {
        Self { name: a.name.clone(), size: a.size, mime_type: a.mime_type.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileMeta>>,
}

impl Message {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            files: None,
        }
    }

    /// A user-authored message carrying the metadata of its attachments.
    pub fn user(content: String, attachments: &[AttachmentRef]) -> Self {
        let mut message = Self::new(MessageRole::User, content);
        if !attachments.is_empty() {
            message.files = Some(attachments.iter().map(FileMeta::from).collect());
        }
        message
    }

    /// An assistant message stamped strictly after `previous`.
    pub fn assistant_after(content: String, previous: DateTime<Utc>) -> Self {
        let mut message = Self::new(MessageRole::Assistant, content);
        if message.timestamp <= previous {
            message.timestamp = previous + Duration::milliseconds(1);
        }
        message
    }
}

/// What the transport hands back for one submitted user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOutcome {
    /// The server's copy of the user message, used to reconcile the local id.
    pub user_message: Option<Message>,
    pub assistant_text: String,
}
