use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Most recent messages kept per conversation once a reply has been recorded.
pub const MAX_HISTORY_MESSAGES: usize = 10;

/// Speaker ids used by speech synthesis: 0 for the model, 1 for the user.
const SPEAKER_MAP: [(Role, u8); 2] = [(Role::Assistant, 0), (Role::User, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn, serialized exactly as the completion API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.messages.push(Message::user(message));
    }

    pub fn add_assistant_message(&mut self, message: &str) {
        self.messages.push(Message::assistant(message));
    }

    pub fn get_messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop the oldest messages until at most `limit` remain.
    pub fn truncate_to_recent(&mut self, limit: usize) {
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(..excess);
        }
    }

    pub fn speaker_id(&self, role: Role) -> u8 {
        SPEAKER_MAP
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, id)| *id)
            .unwrap_or_default()
    }
}

/// In-memory histories keyed by conversation id.
///
/// Entries are created on first use and live until they are removed
/// explicitly; the store never evicts on its own.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<String, ConversationState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the history for `context_id`, creating an empty one if needed.
    pub fn ensure(&mut self, context_id: &str) -> &mut ConversationState {
        self.conversations
            .entry(context_id.to_string())
            .or_insert_with(ConversationState::new)
    }

    pub fn get(&self, context_id: &str) -> Option<&ConversationState> {
        self.conversations.get(context_id)
    }

    pub fn remove(&mut self, context_id: &str) -> Option<ConversationState> {
        self.conversations.remove(context_id)
    }

    pub fn context_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.conversations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
