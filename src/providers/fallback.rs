use crate::config::AppConfig;
use crate::providers::{CompletionRequest, LlmProvider, ProviderError, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

pub struct FallbackProvider {
    providers: Vec<Box<dyn LlmProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Create a new fallback provider from configuration
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        if !config.fallback.enabled {
            // If fallback is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(FallbackProvider {
                providers: vec![default_provider],
                retry_attempts: 1,
                retry_delay_ms: 0,
            });
        }

        let mut providers = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            if let Some(provider_config) = config.providers.get(provider_name) {
                if provider_config.enabled {
                    match ProviderFactory::create(
                        provider_name,
                        provider_config,
                        Duration::from_secs(config.timeout),
                    ) {
                        Ok(provider) => {
                            info!("Added '{}' to fallback chain", provider_name);
                            providers.push(provider);
                        }
                        Err(e) => {
                            warn!("Failed to initialize provider '{}': {}", provider_name, e);
                        }
                    }
                }
            } else {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    provider_name
                );
            }
        }

        Self::from_providers(
            providers,
            config.fallback.retry_attempts,
            config.fallback.retry_delay_ms,
        )
    }

    /// Chain already constructed providers
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, ProviderError> {
        if providers.is_empty() {
            return Err("No providers available in fallback configuration".into());
        }

        Ok(FallbackProvider {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        })
    }

    /// Try a provider, backing off a little longer after each failed attempt
    async fn try_provider_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: &CompletionRequest<'_>,
    ) -> Result<String, ProviderError> {
        let mut attempt = 1;

        loop {
            debug!(
                "Calling {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            match provider.complete(request).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    if attempt >= self.retry_attempts {
                        return Err(e);
                    }
                }
            }

            let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
            debug!("Waiting {:?} before retry", delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let mut all_errors: Vec<String> = Vec::new();

        for provider in &self.providers {
            match self.try_provider_with_retry(provider.as_ref(), request).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                }
            }
        }

        // A single provider reports its own error unchanged
        if let [only] = all_errors.as_slice() {
            return Err(only.clone().into());
        }
        Err(format!("All providers failed:\n{}", all_errors.join("\n")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FallbackConfig, ProviderConfig};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails a fixed number of times before answering
    struct FlakyProvider {
        name: &'static str,
        failures_left: AtomicU32,
        calls: Arc<AtomicU32>,
    }

    impl FlakyProvider {
        fn new(name: &'static str, failures: u32, calls: Arc<AtomicU32>) -> Box<dyn LlmProvider> {
            Box::new(FlakyProvider {
                name,
                failures_left: AtomicU32::new(failures),
                calls,
            })
        }
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(format!("{} unavailable", self.name).into());
            }
            Ok(format!("answer from {}", self.name))
        }
    }

    fn request() -> CompletionRequest<'static> {
        CompletionRequest {
            system: "system",
            prompt: "prompt",
            schema: None,
        }
    }

    fn test_provider_config(key: &str) -> ProviderConfig {
        let mut config = ProviderConfig::with_model("gpt-4o");
        config.api_key = Some(key.to_string());
        config
    }

    fn create_test_config_with_fallback() -> AppConfig {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), test_provider_config("test-key"));

        AppConfig {
            providers,
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["openai".to_string()],
                retry_attempts: 3,
                retry_delay_ms: 100,
            },
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fallback_provider_creation() {
        let config = create_test_config_with_fallback();
        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.provider_name(), "fallback");
        assert_eq!(fallback.providers.len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled() {
        let mut config = create_test_config_with_fallback();
        config.fallback.enabled = false;

        let fallback = FallbackProvider::new(&config).unwrap();
        // With fallback disabled, only one provider should be in the list
        assert_eq!(fallback.providers.len(), 1);
        assert_eq!(fallback.retry_attempts, 1);
    }

    #[tokio::test]
    async fn test_fallback_no_providers() {
        let config = AppConfig {
            providers: HashMap::new(),
            ..create_test_config_with_fallback()
        };

        let result = FallbackProvider::new(&config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("No providers available"));
        }
    }

    #[tokio::test]
    async fn test_fallback_multiple_providers() {
        let mut config = create_test_config_with_fallback();
        config
            .providers
            .insert("anthropic".to_string(), test_provider_config("test-key-2"));
        config.fallback.order = vec!["openai".to_string(), "anthropic".to_string()];

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let fallback = FallbackProvider::from_providers(
            vec![FlakyProvider::new("first", 2, calls.clone())],
            3,
            100,
        )
        .unwrap();

        let answer = fallback.complete(&request()).await.unwrap();
        assert_eq!(answer, "answer from first");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_moves_to_next_provider() {
        let first_calls = Arc::new(AtomicU32::new(0));
        let second_calls = Arc::new(AtomicU32::new(0));
        let fallback = FallbackProvider::from_providers(
            vec![
                FlakyProvider::new("first", 10, first_calls.clone()),
                FlakyProvider::new("second", 0, second_calls.clone()),
            ],
            2,
            50,
        )
        .unwrap();

        let answer = fallback.complete(&request()).await.unwrap();
        assert_eq!(answer, "answer from second");
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_providers_fail() {
        let calls = Arc::new(AtomicU32::new(0));
        let fallback = FallbackProvider::from_providers(
            vec![
                FlakyProvider::new("first", 10, calls.clone()),
                FlakyProvider::new("second", 10, calls.clone()),
            ],
            1,
            0,
        )
        .unwrap();

        let err = fallback.complete(&request()).await.unwrap_err().to_string();
        assert!(err.contains("All providers failed"));
        assert!(err.contains("first unavailable"));
        assert!(err.contains("second unavailable"));
    }
}
