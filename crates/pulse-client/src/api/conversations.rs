//! Conversation history endpoints

use std::sync::Arc;

use crate::api::types::{ConversationRecord, ConversationSummary};
use crate::error::ClientError;
use crate::network::Transport;

/// Typed access to the conversation history endpoints.
#[derive(Clone)]
pub struct ConversationsApi {
    transport: Arc<Transport>,
}

impl ConversationsApi {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// List the caller's conversations, most recent first.
    pub async fn list(&self) -> Result<Vec<ConversationSummary>, ClientError> {
        self.transport.get_json("/conversations").await
    }

    /// Fetch one conversation with its full message history.
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationRecord, ClientError> {
        let path = format!("/conversations/{conversation_id}");
        self.transport.get_json(&path).await
    }
}
