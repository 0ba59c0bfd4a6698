//! Minimal chat-completions client
//!
//! Endpoint: POST {base_url}/chat/completions

use crate::config::OpenAiConfig;
use crate::errors::ToolError;
use crate::net::fetch::Fetcher;
use serde::{Deserialize, Serialize};

/// Chat-completions client for one model
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Run a system + user exchange and return the first choice's content.
    ///
    /// `Ok(None)` means the model answered without content.
    pub async fn complete(
        &self,
        fetcher: &Fetcher<'_>,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<Option<String>, ToolError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ToolError::unexpected(format!("failed to encode chat request: {}", e)))?;

        tracing::debug!(model = %self.model, "calling chat completions");
        let bytes = fetcher.post_json(&self.endpoint(), api_key, &body).await?;

        let response: ChatResponse = serde_json::from_slice(&bytes).map_err(|e| {
            ToolError::decode_failed("Chat completion response was not valid JSON").caused_by(e)
        })?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}
