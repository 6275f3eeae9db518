mod anthropic;
mod azure_openai;
mod factory;
mod fallback;
mod google;
mod ollama;
mod open_ai;
mod rate_limit;
mod structured;

pub use anthropic::AnthropicProvider;
pub use azure_openai::AzureOpenAIProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use open_ai::OpenAIProvider;
pub use rate_limit::RateLimitedProvider;
pub use structured::{complete_json, strip_code_fences};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::error::Error;
use std::time::Duration;

/// Boxed error type returned by provider calls; `Send` so calls can run on spawned tasks
pub type ProviderError = Box<dyn Error + Send + Sync>;

/// HTTP client whose every request, body included, is bounded by `timeout`
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Named JSON schema the model's answer must conform to
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// A single chat completion: one system and one user message
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub schema: Option<&'a ResponseSchema>,
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send the request and return the raw text of the model's answer
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError>;
}
