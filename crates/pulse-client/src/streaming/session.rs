//! Streaming session controller
//!
//! One `ChatSession` drives one exchange with the backend: create the
//! task, subscribe to its event stream, accumulate the reply, then hand
//! the finished turn to the persistence endpoint. A session is consumed by
//! running it; a finished session can never be restarted.

use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    ChatApi, ChatTaskRequest, RoleMessage, SaveRequest, SentinelChatRequest, ThreadMetadata,
};
use crate::conversation::ConversationTurn;
use crate::error::ClientError;
use crate::network::{with_cancel, with_idle_limit};
use crate::streaming::sentinel::{SentinelDecoder, SentinelEvent};
use crate::streaming::sse::{FrameDecoder, StreamEvent};

/// Lifecycle of a streaming session. Transitions are monotonic: a session
/// reaches exactly one of the terminal states and stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Creating,
    Streaming,
    Saving,
    Complete,
    Failed,
    Aborted,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Aborted)
    }
}

/// Observer callbacks for session progress.
#[derive(Default)]
pub struct SessionCallbacks {
    /// Incremental assistant text: `(delta, accumulated)`. Invoked once
    /// per content record, strictly in arrival order.
    pub on_content: Option<Box<dyn Fn(&str, &str) + Send + Sync>>,
    /// Thread metadata captured from the stream's side channel.
    pub on_metadata: Option<Box<dyn Fn(&Value) + Send + Sync>>,
    /// Every status transition, including the terminal one.
    pub on_status: Option<Box<dyn Fn(SessionStatus) + Send + Sync>>,
}

/// Outcome of a completed session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// The finished exchange: the outgoing message and the full reply.
    pub turn: ConversationTurn,
    /// Durable conversation id: refreshed by the save call when it
    /// succeeded, otherwise whatever was known before the session.
    pub conversation_id: Option<String>,
    /// Metadata captured from the stream, if the backend sent any.
    pub metadata: Option<Value>,
    /// True when the byte stream ended without an explicit terminal
    /// record. The reply may have been truncated by the backend; callers
    /// who care can inspect this instead of trusting the text blindly.
    pub completed_without_done: bool,
}

/// Per-session knobs.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Bound on the gap between stream reads. `None` waits indefinitely.
    pub idle_limit: Option<Duration>,
    /// Conversation this exchange belongs to, when continuing one.
    pub conversation_id: Option<String>,
}

/// Controller for one streaming exchange.
pub struct ChatSession {
    api: ChatApi,
    options: SessionOptions,
    cancel: CancellationToken,
    callbacks: SessionCallbacks,
    status: SessionStatus,
    buffer: String,
    metadata: Option<Value>,
    conversation_id: Option<String>,
}

impl ChatSession {
    pub fn new(api: ChatApi, options: SessionOptions, callbacks: SessionCallbacks) -> Self {
        let conversation_id = options.conversation_id.clone();
        Self {
            api,
            options,
            cancel: CancellationToken::new(),
            callbacks,
            status: SessionStatus::Idle,
            buffer: String::new(),
            metadata: None,
            conversation_id,
        }
    }

    /// Token that abandons this session when cancelled. Clone it before
    /// calling [`run`](Self::run); cancellation ends the session in the
    /// `Aborted` state, distinct from a backend or transport failure.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Drive the task + SSE protocol to completion.
    ///
    /// `history` is the settled turn history for this conversation slot;
    /// turns with an empty reply are skipped when flattening. At most one
    /// session should run against a slot at a time; that guard belongs to
    /// the caller, as it did in the original client.
    pub async fn run(
        mut self,
        message: &str,
        history: &[ConversationTurn],
        metadata_hint: Option<ThreadMetadata>,
    ) -> Result<SessionResult, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        self.set_status(SessionStatus::Creating);
        let request = ChatTaskRequest {
            messages: flatten_history(history, message),
            thread_metadata: metadata_hint,
        };
        let handle = match with_cancel(self.api.create_task(&request), &self.cancel).await {
            Err(_) => return self.abort(),
            Ok(Err(err)) => return self.fail(err),
            Ok(Ok(handle)) => handle,
        };

        self.set_status(SessionStatus::Streaming);
        let response = match with_cancel(self.api.open_stream(&handle), &self.cancel).await {
            Err(_) => return self.abort(),
            Ok(Err(err)) => return self.fail(err),
            Ok(Ok(response)) => response,
        };

        let mut stream = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut explicit_done = false;

        'read: loop {
            let read = with_idle_limit(stream.next(), self.options.idle_limit);
            let chunk = match with_cancel(read, &self.cancel).await {
                Err(_) => return self.abort(),
                Ok(Err(timeout)) => {
                    return self.fail(ClientError::IdleTimeout {
                        elapsed: timeout.limit,
                    })
                }
                Ok(Ok(None)) => break 'read,
                Ok(Ok(Some(Err(err)))) => return self.fail(ClientError::Transport(err)),
                Ok(Ok(Some(Ok(bytes)))) => bytes,
            };

            for event in decoder.push(&chunk) {
                if self.apply_event(event) {
                    explicit_done = true;
                    break 'read;
                }
            }
        }

        if !explicit_done {
            for event in decoder.finish() {
                if self.apply_event(event) {
                    explicit_done = true;
                }
            }
            if !explicit_done {
                debug!("stream exhausted without terminal record, completing leniently");
            }
        }

        self.finalize(message, explicit_done).await
    }

    /// Drive the legacy sentinel protocol to completion. Single-phase:
    /// there is no task to create, the POST response body is the stream.
    pub async fn run_sentinel(mut self, message: &str) -> Result<SessionResult, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        self.set_status(SessionStatus::Streaming);
        let request = SentinelChatRequest {
            message: message.to_string(),
            conversation_id: self.conversation_id.clone(),
        };
        let response =
            match with_cancel(self.api.open_sentinel_stream(&request), &self.cancel).await {
                Err(_) => return self.abort(),
                Ok(Err(err)) => return self.fail(err),
                Ok(Ok(response)) => response,
            };

        let mut stream = response.bytes_stream();
        let mut decoder = SentinelDecoder::new();
        let mut ended = false;

        'read: loop {
            let read = with_idle_limit(stream.next(), self.options.idle_limit);
            let chunk = match with_cancel(read, &self.cancel).await {
                Err(_) => return self.abort(),
                Ok(Err(timeout)) => {
                    return self.fail(ClientError::IdleTimeout {
                        elapsed: timeout.limit,
                    })
                }
                Ok(Ok(None)) => break 'read,
                Ok(Ok(Some(Err(err)))) => return self.fail(ClientError::Transport(err)),
                Ok(Ok(Some(Ok(bytes)))) => bytes,
            };

            for event in decoder.push(&chunk) {
                match event {
                    SentinelEvent::Content(delta) => self.push_content(&delta),
                    SentinelEvent::End => {
                        ended = true;
                        break 'read;
                    }
                    SentinelEvent::Error(reason) => {
                        return self.fail(ClientError::Backend { message: reason })
                    }
                }
            }
        }

        if !ended {
            for event in decoder.finish() {
                if let SentinelEvent::Content(delta) = event {
                    self.push_content(&delta);
                }
            }
        }

        self.finalize(message, ended).await
    }

    /// Apply one stream event; returns true on the terminal record.
    fn apply_event(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Content(delta) => {
                self.push_content(&delta);
                false
            }
            StreamEvent::Metadata(payload) => {
                if let Some(cb) = &self.callbacks.on_metadata {
                    cb(&payload);
                }
                self.metadata = Some(payload);
                false
            }
            StreamEvent::Done => true,
        }
    }

    fn push_content(&mut self, delta: &str) {
        self.buffer.push_str(delta);
        if let Some(cb) = &self.callbacks.on_content {
            cb(delta, &self.buffer);
        }
    }

    /// Persist the finished exchange and assemble the result. A failed
    /// save is logged and swallowed: the reply text must never be lost to
    /// a persistence hiccup, so the previously known conversation id is
    /// carried forward instead.
    async fn finalize(
        mut self,
        message: &str,
        explicit_done: bool,
    ) -> Result<SessionResult, ClientError> {
        self.set_status(SessionStatus::Saving);
        let request = SaveRequest {
            message: message.to_string(),
            response: self.buffer.clone(),
            conversation_id: self.conversation_id.clone(),
        };
        match self.api.save(&request).await {
            Ok(saved) => self.conversation_id = Some(saved.conversation_id),
            Err(err) => {
                warn!(error = %err, "failed to persist completed turn, keeping previous conversation id");
            }
        }

        self.set_status(SessionStatus::Complete);
        Ok(SessionResult {
            turn: ConversationTurn {
                user: message.to_string(),
                assistant: std::mem::take(&mut self.buffer),
            },
            conversation_id: self.conversation_id.take(),
            metadata: self.metadata.take(),
            completed_without_done: !explicit_done,
        })
    }

    fn fail(mut self, err: ClientError) -> Result<SessionResult, ClientError> {
        self.set_status(SessionStatus::Failed);
        Err(err)
    }

    fn abort(mut self) -> Result<SessionResult, ClientError> {
        debug!("session cancelled by caller");
        self.set_status(SessionStatus::Aborted);
        Err(ClientError::Aborted)
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        if let Some(cb) = &self.callbacks.on_status {
            cb(status);
        }
    }
}

/// Flatten settled turns plus the outgoing message into the role-tagged
/// list the task endpoint expects.
fn flatten_history(history: &[ConversationTurn], outgoing: &str) -> Vec<RoleMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    for turn in history {
        messages.push(RoleMessage::user(turn.user.clone()));
        if turn.answered() {
            messages.push(RoleMessage::assistant(turn.assistant.clone()));
        }
    }
    messages.push(RoleMessage::user(outgoing));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn test_session(callbacks: SessionCallbacks) -> ChatSession {
        let config = crate::config::ClientConfig::default();
        let transport = crate::network::Transport::new(&config, Arc::new(crate::credentials::Anonymous))
            .expect("localhost config is valid");
        ChatSession::new(ChatApi::new(Arc::new(transport)), SessionOptions::default(), callbacks)
    }

    #[test]
    fn test_flatten_history_skips_unanswered_turns() {
        let history = vec![
            ConversationTurn {
                user: "q1".to_string(),
                assistant: "a1".to_string(),
            },
            ConversationTurn {
                user: "q2".to_string(),
                assistant: String::new(),
            },
        ];
        let messages = flatten_history(&history, "q3");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "user"]);
        assert_eq!(messages.last().unwrap().content, "q3");
    }

    #[test]
    fn test_apply_event_accumulates_in_order() {
        let mut session = test_session(SessionCallbacks::default());
        assert!(!session.apply_event(StreamEvent::Content("A".to_string())));
        assert!(!session.apply_event(StreamEvent::Content("B".to_string())));
        assert!(session.apply_event(StreamEvent::Done));
        assert_eq!(session.buffer, "AB");
    }

    #[test]
    fn test_metadata_does_not_touch_buffer() {
        let mut session = test_session(SessionCallbacks::default());
        session.apply_event(StreamEvent::Content("text".to_string()));
        session.apply_event(StreamEvent::Metadata(json!({"complaint_topic": "noise"})));
        assert_eq!(session.buffer, "text");
        assert_eq!(
            session.metadata,
            Some(json!({"complaint_topic": "noise"}))
        );
    }

    #[test]
    fn test_status_callback_sees_transitions() {
        let seen: Arc<parking_lot::Mutex<Vec<SessionStatus>>> = Arc::default();
        let sink = seen.clone();
        let mut session = test_session(SessionCallbacks {
            on_status: Some(Box::new(move |status| sink.lock().push(status))),
            ..SessionCallbacks::default()
        });
        session.set_status(SessionStatus::Creating);
        session.set_status(SessionStatus::Streaming);
        assert_eq!(
            *seen.lock(),
            vec![SessionStatus::Creating, SessionStatus::Streaming]
        );
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = test_session(SessionCallbacks::default());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(!session.status().is_terminal());
        assert!(SessionStatus::Aborted.is_terminal());
    }
}
