use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::cli::chat::conversation_state::Message;
use crate::config::Config;

/// Everything that can go wrong while asking the model for a reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Body of an OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
}

/// Something that can turn a conversation into the next assistant message.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, CompletionError>;
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct CerebrasClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl CerebrasClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config.completions_url(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionService for CerebrasClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, CompletionError> {
        debug!(
            model = request.model,
            messages = request.messages.len(),
            temperature = request.temperature,
            "Sending request to Cerebras API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("API request failed with response: {}", body);
            return Err(CompletionError::Api { status, body });
        }

        debug!("Received response from Cerebras API: {}", body);

        extract_reply(&body)
    }
}

/// Pull the first choice's text out of a completion response body.
fn extract_reply(body: &str) -> Result<String, CompletionError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| CompletionError::MalformedResponse("first choice has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn request_serializes_to_chat_completion_body() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let request = CompletionRequest {
            model: "llama-4-scout-17b-16e-instruct",
            messages: &messages,
            temperature: 0.5,
        };

        let body: Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama-4-scout-17b-16e-instruct",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn extract_reply_takes_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "first"}},
                {"index": 1, "message": {"role": "assistant", "content": "second"}}
            ],
            "usage": {"total_tokens": 12}
        }"#;
        assert_eq!(extract_reply(body).unwrap(), "first");
    }

    #[test]
    fn extract_reply_rejects_empty_choices() {
        let err = extract_reply(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn extract_reply_rejects_null_content() {
        let err = extract_reply(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[test]
    fn extract_reply_rejects_non_json() {
        let err = extract_reply("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }
}
