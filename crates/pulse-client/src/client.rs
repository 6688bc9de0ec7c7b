//! Client facade
//!
//! Owns the transport and hands out sessions. One [`PulseClient`] serves
//! any number of conversation slots; it is the caller's job to keep at
//! most one session in flight per slot (the original UI disables input
//! while a reply is streaming).

use std::sync::Arc;

use crate::api::{
    ChatApi, ConversationRecord, ConversationSummary, ConversationsApi, ThreadMetadata,
};
use crate::config::ClientConfig;
use crate::conversation::ConversationStore;
use crate::credentials::CredentialsProvider;
use crate::error::ClientError;
use crate::network::Transport;
use crate::streaming::{ChatSession, SessionCallbacks, SessionOptions, SessionResult};

/// Client for the PulseSG backend.
pub struct PulseClient {
    config: ClientConfig,
    chat: ChatApi,
    conversations: ConversationsApi,
}

impl PulseClient {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(Transport::new(&config, credentials)?);
        Ok(Self {
            config,
            chat: ChatApi::new(transport.clone()),
            conversations: ConversationsApi::new(transport),
        })
    }

    /// Build a session for one exchange without running it, for callers
    /// that want the cancellation token or custom orchestration.
    pub fn session(&self, options: SessionOptions, callbacks: SessionCallbacks) -> ChatSession {
        let options = SessionOptions {
            idle_limit: options.idle_limit.or(self.config.idle_timeout()),
            ..options
        };
        ChatSession::new(self.chat.clone(), options, callbacks)
    }

    /// Send one message against a conversation slot and stream the reply
    /// into `store`.
    ///
    /// The store sees the optimistic turn immediately, each delta as it
    /// arrives, and either the settled turn or the failure at the end.
    /// Callers must not start a second send against the same store while
    /// one is in flight.
    pub async fn send_message(
        &self,
        store: &ConversationStore,
        message: &str,
        metadata_hint: Option<ThreadMetadata>,
        callbacks: SessionCallbacks,
    ) -> Result<SessionResult, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let history = store.settled_turns();
        store.begin_turn(message);

        let options = SessionOptions {
            idle_limit: self.config.idle_timeout(),
            conversation_id: store.conversation_id(),
        };
        let session = self.session(options, bridge_callbacks(store.clone(), callbacks));

        let outcome = if self.config.legacy_sentinel {
            session.run_sentinel(message).await
        } else {
            session.run(message, &history, metadata_hint).await
        };

        match &outcome {
            Ok(result) => {
                store.complete_turn(&result.turn.assistant, result.conversation_id.as_deref());
            }
            Err(err) => store.fail_turn(&err.to_string()),
        }
        outcome
    }

    /// List the caller's conversations.
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, ClientError> {
        self.conversations.list().await
    }

    /// Fetch a stored conversation and load it into `store`.
    pub async fn load_conversation(
        &self,
        store: &ConversationStore,
        conversation_id: &str,
    ) -> Result<ConversationRecord, ClientError> {
        let record = self.conversations.get(conversation_id).await?;
        store.load_record(&record);
        Ok(record)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Wrap caller callbacks so the store tracks the live buffer alongside
/// whatever the caller wants to observe.
fn bridge_callbacks(store: ConversationStore, callbacks: SessionCallbacks) -> SessionCallbacks {
    let user_on_content = callbacks.on_content;
    SessionCallbacks {
        on_content: Some(Box::new(move |delta, full| {
            store.push_delta(delta);
            if let Some(cb) = &user_on_content {
                cb(delta, full);
            }
        })),
        on_metadata: callbacks.on_metadata,
        on_status: callbacks.on_status,
    }
}
