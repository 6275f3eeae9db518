use config::{Config, ConfigError, Environment, File};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Default provider to use when not specified
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Client-side throttling of model requests
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// How recipe pages are downloaded
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Unit consolidation settings
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    /// Text-to-speech settings
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Language used for ingredient names on the shopping list
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Upper bound on simultaneous fetch/model calls
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

/// Configuration for a specific AI provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4o", "claude-3-5-sonnet-20241022")
    #[serde(default = "default_model")]
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    // Optional provider-specific fields
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
    /// Specific endpoint path (for Azure or custom deployments)
    pub endpoint: Option<String>,
    /// Deployment name (Azure OpenAI specific)
    pub deployment_name: Option<String>,
    /// API version (Azure OpenAI specific)
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// An enabled provider entry with default sampling settings
    pub fn with_model(model: impl Into<String>) -> Self {
        ProviderConfig {
            enabled: true,
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
            endpoint: None,
            deployment_name: None,
            api_version: None,
        }
    }
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of retry attempts per provider before fallback
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds (grows linearly per attempt)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Token bucket applied in front of the model provider
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Sustained request rate
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Maximum burst size
    #[serde(default = "default_max_burst")]
    pub max_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_requests_per_second(),
            max_burst: default_max_burst(),
        }
    }
}

/// Page download settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FetcherConfig {
    /// Base URL of a headless rendering service; `PAGE_SCRIBER_URL` is used when unset
    pub renderer_url: Option<String>,
    /// Overrides the default browser-like user agent
    pub user_agent: Option<String>,
}

/// Settings for collapsing ingredient groups into one shopping quantity
#[derive(Debug, Deserialize, Clone)]
pub struct ConsolidationConfig {
    /// Totals below this many grams or millilitres are checked for package sizing
    #[serde(default = "default_small_amount_threshold")]
    pub small_amount_threshold: f64,
    /// Kitchen measures converted to millilitres without asking the model
    #[serde(default = "default_kitchen_measures")]
    pub kitchen_measures: HashMap<String, f64>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            small_amount_threshold: default_small_amount_threshold(),
            kitchen_measures: default_kitchen_measures(),
        }
    }
}

/// Hosted text-to-speech settings
#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_model")]
    pub model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Where the audio file is written
    #[serde(default = "default_audio_path")]
    pub output_path: String,
    /// Falls back to the openai provider key, then `OPENAI_API_KEY`
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: default_speech_model(),
            voice: default_voice(),
            output_path: default_audio_path(),
            api_key: None,
            base_url: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: default_providers(),
            fallback: FallbackConfig::default(),
            rate_limit: RateLimitConfig::default(),
            fetcher: FetcherConfig::default(),
            consolidation: ConsolidationConfig::default(),
            speech: SpeechConfig::default(),
            language: default_language(),
            timeout: default_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "openai".to_string()
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();
    providers.insert("openai".to_string(), ProviderConfig::with_model(default_model()));
    providers
}

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_requests_per_second() -> f64 {
    2.0
}

fn default_max_burst() -> u32 {
    10
}

fn default_small_amount_threshold() -> f64 {
    50.0
}

fn default_kitchen_measures() -> HashMap<String, f64> {
    [
        ("szklanka", 250.0),
        ("szklanki", 250.0),
        ("szklanek", 250.0),
        ("cup", 240.0),
        ("cups", 240.0),
        ("łyżka", 15.0),
        ("łyżki", 15.0),
        ("łyżek", 15.0),
        ("tbsp", 15.0),
        ("tablespoon", 15.0),
        ("tablespoons", 15.0),
        ("łyżeczka", 5.0),
        ("łyżeczki", 5.0),
        ("łyżeczek", 5.0),
        ("tsp", 5.0),
        ("teaspoon", 5.0),
        ("teaspoons", 5.0),
    ]
    .into_iter()
    .map(|(unit, ml)| (unit.to_string(), ml))
    .collect()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_audio_path() -> String {
    "shopping_list.mp3".to_string()
}

fn default_language() -> String {
    "Polish".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    4
}

impl AppConfig {
    /// Load configuration from `.env`, file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with GROCER__ prefix
    /// 2. grocer.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: GROCER__PROVIDERS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }

    /// Same as [`AppConfig::load`] but reads the given file instead of `grocer.toml`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_config(Some(path))
    }
}

/// Load configuration from file and environment variables
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    // API keys usually live in .env next to the binary
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("grocer").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        // Use double underscore for nested: GROCER__PROVIDERS__OPENAI__API_KEY
        .add_source(
            Environment::with_prefix("GROCER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
