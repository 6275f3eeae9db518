use crate::config::ProviderConfig;
use crate::providers::open_ai::{chat_completion_content, chat_messages, response_format};
use crate::providers::{http_client, CompletionRequest, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct AzureOpenAIProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    deployment_name: String,
    api_version: String,
    temperature: f32,
    max_tokens: u32,
}

impl AzureOpenAIProvider {
    /// Create a new Azure OpenAI provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("AZURE_OPENAI_API_KEY").ok())
            .ok_or("AZURE_OPENAI_API_KEY not found in config or environment")?;

        let endpoint = config
            .endpoint
            .clone()
            .ok_or("Azure OpenAI endpoint is required")?;

        let deployment_name = config
            .deployment_name
            .clone()
            .ok_or("Azure OpenAI deployment_name is required")?;

        let api_version = config
            .api_version
            .clone()
            .unwrap_or_else(|| "2024-08-01-preview".to_string());

        Ok(AzureOpenAIProvider {
            client: http_client(timeout)?,
            api_key,
            endpoint,
            deployment_name,
            api_version,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn completions_url(&self) -> String {
        // https://{endpoint}/openai/deployments/{deployment-name}/chat/completions?api-version={api-version}
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment_name,
            self.api_version
        )
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAIProvider {
    fn provider_name(&self) -> &str {
        "azure_openai"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&json!({
                "messages": chat_messages(request),
                "response_format": response_format(request),
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await?;

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        chat_completion_content("azure_openai", &response_body)
    }
}
