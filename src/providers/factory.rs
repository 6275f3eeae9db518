use crate::config::{AppConfig, ProviderConfig};
use crate::providers::{
    AnthropicProvider, AzureOpenAIProvider, FallbackProvider, GoogleProvider, LlmProvider,
    OllamaProvider, OpenAIProvider, ProviderError, RateLimitedProvider,
};
use std::sync::Arc;
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    ///
    /// `timeout` bounds each HTTP call the provider makes.
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, ProviderError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )
            .into());
        }

        match provider_name {
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config, timeout)?)),
            "azure_openai" => Ok(Box::new(AzureOpenAIProvider::new(config, timeout)?)),
            "google" => Ok(Box::new(GoogleProvider::new(config, timeout)?)),
            "ollama" => Ok(Box::new(OllamaProvider::new(config, timeout)?)),
            _ => Err(format!("Unknown provider: {}", provider_name).into()),
        }
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>, ProviderError> {
        let provider_name = &config.default_provider;
        let provider_config = config.providers.get(provider_name).ok_or_else(|| {
            format!(
                "Default provider '{}' not found in configuration",
                provider_name
            )
        })?;

        Self::create(
            provider_name,
            provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    /// The provider the pipeline talks to: fallback chain, then the optional rate limiter
    pub fn from_config(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let provider: Box<dyn LlmProvider> = Box::new(FallbackProvider::new(config)?);

        if config.rate_limit.enabled {
            Ok(Arc::new(RateLimitedProvider::new(provider, &config.rate_limit)?))
        } else {
            Ok(Arc::from(provider))
        }
    }
}
