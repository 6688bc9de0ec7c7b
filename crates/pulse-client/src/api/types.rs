//! Wire types for the PulseSG backend
//!
//! Field names follow the backend exactly, including the `threadMetaData`
//! spelling on the task-creation body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One role-tagged message in the flattened history sent on task creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMessage {
    pub role: String,
    pub content: String,
}

impl RoleMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Thread metadata hint echoed between client and backend so each task
/// stays stateless on the server side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub quality: u32,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTaskRequest {
    pub messages: Vec<RoleMessage>,
    #[serde(rename = "threadMetaData", skip_serializing_if = "Option::is_none")]
    pub thread_metadata: Option<ThreadMetadata>,
}

/// Correlation identifier returned by task creation; the session controller
/// owns it for the lifetime of one stream.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Body of `POST /chat/save`, the post-stream persistence handoff.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest {
    pub message: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Response of `POST /chat/save`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub conversation_id: String,
}

/// Body of the legacy `POST /chat/stream` sentinel endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SentinelChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// One stored message inside a conversation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A full conversation as returned by `GET /conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<MessageRecord>,
}

/// One row of `GET /conversations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}
