use std::fmt;

use tracing::{debug, error};

use super::conversation_state::{ConversationState, ConversationStore, Role, MAX_HISTORY_MESSAGES};
use crate::cerebras_client::{CompletionRequest, CompletionService};

/// Outcome of one request/reply cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Success(String),
    Failure { reason: String },
}

impl Reply {
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }

    /// Text shown to the user. Failures are spelled out inline.
    pub fn render(&self) -> String {
        match self {
            Reply::Success(text) => text.clone(),
            Reply::Failure { reason } => format!("Error: Failed to get AI response - {}", reason),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Keeps a history per conversation and forwards it to the completion service.
pub struct ChatResponder<C> {
    client: C,
    store: ConversationStore,
    model: String,
    temperature: f32,
}

impl<C: CompletionService> ChatResponder<C> {
    pub fn new(client: C, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            store: ConversationStore::new(),
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Record `text` as a user turn in `context_id`, ask the model for the
    /// next turn and record that too.
    ///
    /// On failure the user turn stays in the history and no assistant turn is
    /// added.
    pub async fn request_reply(&mut self, text: &str, context_id: &str) -> Reply {
        let history = self.store.ensure(context_id);
        history.add_user_message(text);

        let request = CompletionRequest {
            model: &self.model,
            messages: history.get_messages(),
            temperature: self.temperature,
        };
        let outcome = self.client.complete(&request).await;

        match outcome {
            Ok(response) => {
                history.add_assistant_message(&response);
                history.truncate_to_recent(MAX_HISTORY_MESSAGES);
                debug!(
                    context_id,
                    speaker = history.speaker_id(Role::Assistant),
                    messages = history.len(),
                    "Recorded assistant reply"
                );
                Reply::Success(response)
            }
            Err(e) => {
                error!("Error getting Cerebras response: {}", e);
                Reply::Failure {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn clear_context(&mut self, context_id: &str) {
        if self.store.remove(context_id).is_some() {
            debug!(context_id, "Cleared conversation");
        }
    }

    pub fn history(&self, context_id: &str) -> Option<&ConversationState> {
        self.store.get(context_id)
    }

    pub fn context_ids(&self) -> Vec<&str> {
        self.store.context_ids()
    }
}
