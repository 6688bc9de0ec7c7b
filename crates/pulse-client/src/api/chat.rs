//! Chat task endpoints
//!
//! The two-phase streaming exchange: `POST /api/chat` creates a backend
//! task, `GET /api/chat/stream/{task_id}` subscribes to its event stream,
//! and `POST /chat/save` persists the finished turn.

use reqwest::Response;
use std::sync::Arc;
use tracing::debug;

use crate::api::types::{ChatTaskRequest, SaveRequest, SaveResponse, SentinelChatRequest, TaskHandle};
use crate::error::ClientError;
use crate::network::{expect_success, Transport};

pub const CHAT_TASK_PATH: &str = "/api/chat";
pub const CHAT_SAVE_PATH: &str = "/chat/save";
pub const SENTINEL_STREAM_PATH: &str = "/chat/stream";

/// Typed access to the chat endpoints.
#[derive(Clone)]
pub struct ChatApi {
    transport: Arc<Transport>,
}

impl ChatApi {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Create a backend task for one exchange. Non-success statuses are
    /// fatal to the session before any stream is opened.
    pub async fn create_task(&self, request: &ChatTaskRequest) -> Result<TaskHandle, ClientError> {
        let response = self.transport.post(CHAT_TASK_PATH, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::TaskCreation {
                status: status.as_u16(),
            });
        }

        let handle: TaskHandle = response.json().await?;
        debug!(task_id = %handle.task_id, "task created");
        Ok(handle)
    }

    /// Open the event subscription for a previously created task.
    pub async fn open_stream(&self, handle: &TaskHandle) -> Result<Response, ClientError> {
        let path = format!("/api/chat/stream/{}", handle.task_id);
        let response = self.transport.get_stream(&path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StreamOpen {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Persist a completed exchange and obtain the durable conversation id.
    pub async fn save(&self, request: &SaveRequest) -> Result<SaveResponse, ClientError> {
        let response = self.transport.post(CHAT_SAVE_PATH, request).await?;
        let response = expect_success(response, CHAT_SAVE_PATH)?;
        Ok(response.json().await?)
    }

    /// Open the legacy single-shot sentinel stream.
    pub async fn open_sentinel_stream(
        &self,
        request: &SentinelChatRequest,
    ) -> Result<Response, ClientError> {
        let response = self
            .transport
            .post_stream(SENTINEL_STREAM_PATH, request)
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StreamOpen {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
