use crate::config::ProviderConfig;
use crate::providers::open_ai::{chat_completion_content, chat_messages};
use crate::providers::{http_client, CompletionRequest, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(OllamaProvider {
            client: http_client(timeout)?,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, model: String) -> Self {
        OllamaProvider {
            client: Client::new(),
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let mut body = json!({
            "model": self.model,
            "messages": chat_messages(request),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });
        // Local models only get a plain JSON mode; the schema itself is in the prompt
        if request.schema.is_some() {
            body["response_format"] = json!({"type": "json_object"});
        }

        // Ollama uses OpenAI-compatible API
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await?;

        let response_body: Value = response.json().await?;
        debug!("Ollama response: {:?}", response_body);

        chat_completion_content("ollama", &response_body)
    }
}
