//! Model client trait and the Ollama implementation
//!
//! The controller only depends on the [`ModelClient`] capability; any
//! provider that can turn a transcript into the next assistant message
//! satisfies it. The shipped implementation talks to Ollama's `/api/chat`
//! endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::transcript::Transcript;

/// Error type for model completion calls
#[derive(Debug)]
pub enum ModelError {
    Request(reqwest::Error),
    Parse(serde_json::Error),
    EmptyResponse,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Request(e) => write!(f, "Request error: {}", e),
            ModelError::Parse(e) => write!(f, "Parse error: {}", e),
            ModelError::EmptyResponse => write!(f, "Empty response from model"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        ModelError::Request(e)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Parse(e)
    }
}

/// Capability consumed by the agent loop: one completion per cycle.
///
/// Implementations must not retry on the controller's behalf; a failure
/// aborts the whole invocation chain.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifier used for logging and metric labels.
    fn model_name(&self) -> &str;

    /// Produce the next assistant message for the transcript.
    async fn complete(&self, transcript: &Transcript) -> Result<String, ModelError>;
}

/// Chat message as serialized onto the wire.
#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: String,
}

/// Response from /api/chat
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireResponseMessage,
    #[serde(default)]
    eval_count: u32,
    #[serde(default)]
    eval_duration: u64,
}

/// Client for Ollama's /api/chat endpoint
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new chat client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Ollama server (e.g., "http://localhost:11434")
    /// * `model` - The model name (e.g., "llama3.2")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, transcript: &Transcript) -> Result<String, ModelError> {
        let endpoint = format!("{}/api/chat", self.base_url);

        let messages: Vec<WireMessage<'_>> = transcript
            .turns()
            .iter()
            .map(|turn| WireMessage {
                role: turn.role.as_str(),
                content: &turn.text,
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": 0.0
            }
        });

        let response = self.client.post(&endpoint).json(&body).send().await?;
        let text = response.text().await?;

        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)?;
        debug!(
            model = %self.model,
            eval_count = chat_response.eval_count,
            eval_duration = chat_response.eval_duration,
            "Chat completion finished"
        );

        Ok(chat_response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_message_serialization() {
        let transcript = Transcript::seed("be terse", "do the thing");
        let messages: Vec<WireMessage<'_>> = transcript
            .turns()
            .iter()
            .map(|turn| WireMessage {
                role: turn.role.as_str(),
                content: &turn.text,
            })
            .collect();

        let json = serde_json::to_string(&messages).unwrap();
        assert!(json.contains("\"role\":\"system\""));
        assert!(json.contains("\"content\":\"be terse\""));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_chat_response_parsing_with_defaults() {
        let raw = r#"{"message": {"content": "hello"}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content, "hello");
        assert_eq!(parsed.eval_count, 0);
        assert_eq!(parsed.eval_duration, 0);
    }

    #[test]
    fn test_model_name() {
        let client = OllamaClient::new("http://localhost:11434", "llama3.2");
        assert_eq!(client.model_name(), "llama3.2");
    }
}
