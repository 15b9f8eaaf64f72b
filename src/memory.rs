//! Per-session conversation memory.
//!
//! Conversation history is scoped by session key, never shared process-wide:
//! concurrent requests under different sessions cannot interleave into each
//! other's transcripts. Sessions are bounded per-conversation by the
//! exchange limit in `Conversation`.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::llm::Conversation;

/// Map of session key to conversation transcript.
#[derive(Debug, Default)]
pub struct SessionMemory {
    sessions: Mutex<HashMap<String, Conversation>>,
}

impl SessionMemory {
    /// Creates an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the transcript for a session.
    ///
    /// Unknown sessions yield an empty conversation.
    pub fn transcript(&self, session_key: &str) -> Conversation {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(session_key).cloned().unwrap_or_default()
    }

    /// Records one question/answer exchange for a session.
    pub fn record_exchange(&self, session_key: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let conversation = sessions
            .entry(session_key.to_string())
            .or_insert_with(Conversation::new);
        conversation.add_user(question);
        conversation.add_assistant(answer);
    }

    /// Clears one session's transcript.
    pub fn clear_session(&self, session_key: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_key);
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}
