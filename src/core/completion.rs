//! Ollama Cloud chat completions over the OpenAI-compatible endpoint.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::config::Config;
use crate::core::error::{GatewayError, Service};
use crate::core::http;

// Large models can take a while to answer; allow up to two minutes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the chat completions API.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Token counts reported by the completion API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// A finished completion: the generated text plus token accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

fn into_completion(response: ChatCompletionResponse) -> Result<Completion, GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::UnexpectedResponse {
            service: Service::Completion,
            detail: "response contained no choices".to_string(),
        })?;
    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        usage: response.usage,
    })
}

impl CompletionClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        CompletionClient {
            http,
            base_url: config.ollama_base_url.clone(),
            api_key: config.credentials.ollama_api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// The model completions are requested from.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a completion for an OpenAI-style message list.
    pub async fn complete(&self, messages: &[Value]) -> Result<Completion, GatewayError> {
        log::debug!("requesting completion from {} ({} messages)", self.model, messages.len());
        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
            }));
        let response: ChatCompletionResponse =
            http::send_json(Service::Completion, request).await?;
        into_completion(response)
    }
}
