//! Conversation turns and UI-facing state
//!
//! A turn pairs one user message with its (possibly pending) assistant
//! reply. Settled history and the in-progress streaming text are kept
//! separate so a consumer can render the live message distinctly.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ConversationRecord, MessageRecord};

/// One user message paired with its assistant reply. The assistant text is
/// empty while the reply is streaming or was never answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn answered(&self) -> bool {
        !self.assistant.is_empty()
    }
}

/// Rebuild turn history from stored backend records.
///
/// The backend persists one record per role in chronological order, so
/// turns are reconstructed by pairing each `user` record with the
/// `assistant` record that follows it. A trailing record without its
/// counterpart, or a pair whose roles do not line up, is dropped.
pub fn pair_turns(messages: &[MessageRecord]) -> Vec<ConversationTurn> {
    let mut turns = Vec::with_capacity(messages.len() / 2);
    for pair in messages.chunks_exact(2) {
        if pair[0].role == "user" && pair[1].role == "assistant" {
            turns.push(ConversationTurn {
                user: pair[0].content.clone(),
                assistant: pair[1].content.clone(),
            });
        }
    }
    turns
}

/// Observable snapshot of a conversation slot.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Settled turn history, append-only while a session is active.
    pub turns: Vec<ConversationTurn>,
    /// Text of the in-progress assistant reply, distinct from `turns`.
    pub live: String,
    /// Human-readable failure from the most recent session, if any.
    pub error: Option<String>,
    /// Durable identifier once the backend has assigned one.
    pub conversation_id: Option<String>,
    /// True while a streaming session is running against this slot.
    pub streaming: bool,
}

/// Shared conversation store bridging session callbacks to UI state.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store contents with a stored conversation.
    pub fn load_record(&self, record: &ConversationRecord) {
        let mut state = self.inner.lock();
        state.turns = pair_turns(&record.messages);
        state.conversation_id = Some(record.id.clone());
        state.live.clear();
        state.error = None;
        state.streaming = false;
    }

    /// Optimistically append the outgoing turn with an empty reply.
    pub fn begin_turn(&self, user: impl Into<String>) {
        let mut state = self.inner.lock();
        state.turns.push(ConversationTurn {
            user: user.into(),
            assistant: String::new(),
        });
        state.live.clear();
        state.error = None;
        state.streaming = true;
    }

    /// Append streamed text to the live buffer.
    pub fn push_delta(&self, delta: &str) {
        self.inner.lock().live.push_str(delta);
    }

    /// Settle the optimistic turn with the final reply.
    pub fn complete_turn(&self, assistant: &str, conversation_id: Option<&str>) {
        let mut state = self.inner.lock();
        if let Some(turn) = state.turns.last_mut() {
            turn.assistant = assistant.to_string();
        }
        if let Some(id) = conversation_id {
            state.conversation_id = Some(id.to_string());
        }
        state.live.clear();
        state.streaming = false;
    }

    /// Record a failure. The optimistic turn keeps its empty reply so the
    /// history renders as "not answered" rather than erroring wholesale.
    pub fn fail_turn(&self, reason: &str) {
        let mut state = self.inner.lock();
        state.error = Some(reason.to_string());
        state.live.clear();
        state.streaming = false;
    }

    /// Reset the slot for a fresh conversation.
    pub fn clear(&self) {
        *self.inner.lock() = ConversationState::default();
    }

    pub fn snapshot(&self) -> ConversationState {
        self.inner.lock().clone()
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.inner.lock().turns.clone()
    }

    /// Settled turns only, i.e. history without the optimistic tail.
    pub fn settled_turns(&self) -> Vec<ConversationTurn> {
        self.inner
            .lock()
            .turns
            .iter()
            .filter(|turn| turn.answered())
            .cloned()
            .collect()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.inner.lock().conversation_id.clone()
    }

    pub fn live_text(&self) -> String {
        self.inner.lock().live.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.lock().streaming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(role: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: format!("m-{content}"),
            conversation_id: "c-1".to_string(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pair_turns_alternating() {
        let turns = pair_turns(&[
            record("user", "q1"),
            record("assistant", "a1"),
            record("user", "q2"),
            record("assistant", "a2"),
        ]);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user, "q1");
        assert_eq!(turns[1].assistant, "a2");
    }

    #[test]
    fn test_pair_turns_drops_trailing_unpaired() {
        let turns = pair_turns(&[
            record("user", "q1"),
            record("assistant", "a1"),
            record("user", "dangling"),
        ]);
        assert_eq!(turns.len(), 1);
    }

    #[test]
    fn test_pair_turns_skips_misaligned_pair() {
        let turns = pair_turns(&[record("assistant", "a0"), record("user", "q1")]);
        assert!(turns.is_empty());
    }

    #[test]
    fn test_store_optimistic_lifecycle() {
        let store = ConversationStore::new();
        store.begin_turn("hello");
        assert!(store.is_streaming());
        assert_eq!(store.turns().len(), 1);
        assert!(!store.turns()[0].answered());

        store.push_delta("wor");
        store.push_delta("ld");
        assert_eq!(store.live_text(), "world");

        store.complete_turn("world", Some("conv-9"));
        let state = store.snapshot();
        assert_eq!(state.turns[0].assistant, "world");
        assert!(state.live.is_empty());
        assert!(!state.streaming);
        assert_eq!(state.conversation_id.as_deref(), Some("conv-9"));
    }

    #[test]
    fn test_store_failure_leaves_turn_unanswered() {
        let store = ConversationStore::new();
        store.begin_turn("hello");
        store.push_delta("partial");
        store.fail_turn("stream open failed with status 502");

        let state = store.snapshot();
        assert_eq!(state.turns.len(), 1);
        assert!(!state.turns[0].answered());
        assert!(state.live.is_empty());
        assert!(state.error.is_some());
    }

    #[test]
    fn test_settled_turns_excludes_optimistic_tail() {
        let store = ConversationStore::new();
        store.begin_turn("q1");
        store.complete_turn("a1", None);
        store.begin_turn("q2");
        assert_eq!(store.settled_turns().len(), 1);
    }
}
