use crate::config::ProviderConfig;
use crate::prompts::format_instructions;
use crate::providers::{http_client, CompletionRequest, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or("GOOGLE_API_KEY not found in config or environment")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());

        Ok(GoogleProvider {
            client: http_client(timeout)?,
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let mut generation_config = json!({
            "temperature": self.temperature,
            "maxOutputTokens": self.max_tokens
        });
        let mut system = request.system.to_string();
        if let Some(schema) = request.schema {
            generation_config["responseMimeType"] = json!("application/json");
            system.push_str("\n\n");
            system.push_str(&format_instructions(&schema.schema));
        }

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "systemInstruction": {
                    "parts": [{"text": system}]
                },
                "contents": [{
                    "role": "user",
                    "parts": [{"text": request.prompt}]
                }],
                "generationConfig": generation_config
            }))
            .send()
            .await?;

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        let content = response_body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or("Failed to extract content from Google Gemini response")?
            .to_string();

        Ok(content)
    }
}
