use crate::config::RateLimitConfig;
use crate::providers::{CompletionRequest, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// How often a waiting caller re-checks the bucket
const CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Token bucket shared by every call going through the wrapped provider
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests_per_second: f64, max_burst: u32) -> Self {
        let capacity = f64::from(max_burst.max(1));
        Self {
            tokens: capacity,
            capacity,
            refill_per_second: requests_per_second,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    /// Take a token, or report how long until one is available
    fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let seconds = (1.0 - self.tokens) / self.refill_per_second;
            Err(Duration::try_from_secs_f64(seconds).unwrap_or(CHECK_INTERVAL))
        }
    }
}

/// Throttles model requests to a sustained rate with a bounded burst
pub struct RateLimitedProvider {
    inner: Box<dyn LlmProvider>,
    bucket: Mutex<TokenBucket>,
}

impl RateLimitedProvider {
    /// Fails unless `requests_per_second` is a positive finite rate
    pub fn new(
        inner: Box<dyn LlmProvider>,
        config: &RateLimitConfig,
    ) -> Result<Self, ProviderError> {
        let rate = config.requests_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(format!(
                "rate_limit.requests_per_second must be a positive number, got {}",
                rate
            )
            .into());
        }

        Ok(Self {
            inner,
            bucket: Mutex::new(TokenBucket::new(rate, config.max_burst)),
        })
    }

    async fn wait_for_token(&self) {
        loop {
            let wait = match self.bucket.lock().await.try_acquire() {
                Ok(()) => return,
                Err(wait) => wait,
            };
            debug!("Rate limit reached, waiting {:?}", wait);
            sleep(wait.min(CHECK_INTERVAL)).await;
        }
    }
}

#[async_trait]
impl LlmProvider for RateLimitedProvider {
    fn provider_name(&self) -> &str {
        "rate_limited"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        self.wait_for_token().await;
        self.inner.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            Ok(request.prompt.to_string())
        }
    }

    fn limited(requests_per_second: f64, max_burst: u32) -> RateLimitedProvider {
        RateLimitedProvider::new(
            Box::new(EchoProvider),
            &RateLimitConfig {
                enabled: true,
                requests_per_second,
                max_burst,
            },
        )
        .unwrap()
    }

    fn request() -> CompletionRequest<'static> {
        CompletionRequest {
            system: "system",
            prompt: "hello",
            schema: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_passes_without_waiting() {
        let provider = limited(2.0, 3);
        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(provider.complete(&request()).await.unwrap(), "hello");
        }
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_beyond_burst_are_spaced() {
        let provider = limited(2.0, 1);
        let start = Instant::now();
        for _ in 0..3 {
            provider.complete(&request()).await.unwrap();
        }
        // two refills at 2 requests/s
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn test_rejects_unusable_rates() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = RateLimitedProvider::new(
                Box::new(EchoProvider),
                &RateLimitConfig {
                    enabled: true,
                    requests_per_second: rate,
                    max_burst: 1,
                },
            );
            let err = result.err().unwrap().to_string();
            assert!(err.contains("requests_per_second"));
        }
    }

    #[test]
    fn test_bucket_reports_wait_time() {
        let mut bucket = TokenBucket::new(2.0, 1);
        assert!(bucket.try_acquire().is_ok());
        let wait = bucket.try_acquire().unwrap_err();
        assert!(wait <= Duration::from_millis(500));
        assert!(wait > Duration::from_millis(400));
    }
}
