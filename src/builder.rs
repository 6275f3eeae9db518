use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::config::{AppConfig, ProviderConfig};
use crate::error::GrocerError;
use crate::model::ShoppingList;
use crate::pipelines::ShoppingListPipeline;
use crate::speech::SpeechSynthesizer;

/// LLM provider selectable from the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
    Google,
    AzureOpenAI,
    Ollama,
}

impl LlmProvider {
    /// Provider name used by the factory and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Google => "google",
            LlmProvider::AzureOpenAI => "azure_openai",
            LlmProvider::Ollama => "ollama",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI | LlmProvider::AzureOpenAI => "gpt-4o",
            LlmProvider::Anthropic => "claude-3-5-sonnet-20241022",
            LlmProvider::Google => "gemini-1.5-pro",
            LlmProvider::Ollama => "llama3.2",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = GrocerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            "google" | "gemini" => Ok(LlmProvider::Google),
            "azure_openai" | "azure" => Ok(LlmProvider::AzureOpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(GrocerError::BuilderError(format!(
                "Unknown provider '{}', expected one of: openai, anthropic, google, azure_openai, ollama",
                other
            ))),
        }
    }
}

/// Outcome of a builder run
#[derive(Debug, Clone)]
pub struct ShoppingListResult {
    pub list: ShoppingList,
    /// Set when audio was requested and written
    pub audio_path: Option<PathBuf>,
}

/// Builder for configuring and running a shopping list
#[derive(Debug, Default)]
pub struct ShoppingListBuilder {
    inputs: Vec<String>,
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    model: Option<String>,
    language: Option<String>,
    timeout: Option<Duration>,
    config: Option<AppConfig>,
    audio: Option<PathBuf>,
}

impl ShoppingListBuilder {
    /// Add a recipe page to download
    ///
    /// # Example
    /// ```
    /// use grocer::GroceryList;
    ///
    /// let builder = GroceryList::builder()
    ///     .url("https://example.com/recipe");
    /// ```
    pub fn url(self, url: impl Into<String>) -> Self {
        self.input(url)
    }

    /// Add a recipe or an ingredient list given as text
    ///
    /// # Example
    /// ```
    /// use grocer::GroceryList;
    ///
    /// let builder = GroceryList::builder()
    ///     .text("Marchew 1kg\nCebula 2 szt.");
    /// ```
    pub fn text(self, text: impl Into<String>) -> Self {
        self.input(text)
    }

    /// Add an input; a lone http(s) URL is downloaded, anything else is read as text
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Set the LLM provider
    ///
    /// # Example
    /// ```
    /// use grocer::{GroceryList, LlmProvider};
    ///
    /// let builder = GroceryList::builder()
    ///     .text("2 jajka")
    ///     .provider(LlmProvider::Anthropic);
    /// ```
    pub fn provider(mut self, provider: LlmProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the API key for the selected provider instead of relying on the environment
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Language of the ingredient names on the list
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set a timeout for HTTP requests
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Use this configuration instead of loading `grocer.toml` and the environment
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Also read the list aloud into an mp3 file at `path`
    pub fn audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio = Some(path.into());
        self
    }

    /// The configuration the run will use, overrides applied
    fn resolve_config(&mut self) -> Result<AppConfig, GrocerError> {
        let mut config = match self.config.take() {
            Some(config) => config,
            None => AppConfig::load()?,
        };

        let provider_name = match self.provider {
            Some(provider) => {
                config.default_provider = provider.as_str().to_string();
                config
                    .providers
                    .entry(provider.as_str().to_string())
                    .or_insert_with(|| ProviderConfig::with_model(provider.default_model()));
                provider.as_str().to_string()
            }
            None => config.default_provider.clone(),
        };

        if self.api_key.is_some() || self.model.is_some() {
            let provider_config = config.providers.get_mut(&provider_name).ok_or_else(|| {
                GrocerError::BuilderError(format!(
                    "Provider '{}' not found in configuration",
                    provider_name
                ))
            })?;
            if let Some(key) = self.api_key.take() {
                provider_config.api_key = Some(key);
            }
            if let Some(model) = self.model.take() {
                provider_config.model = model;
            }
        }

        if let Some(language) = self.language.take() {
            config.language = language;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout.as_secs().max(1);
        }

        Ok(config)
    }

    /// Build the shopping list, and the audio file when requested
    ///
    /// # Errors
    /// Returns `GrocerError` if:
    /// - No input was added
    /// - Every input is blank
    /// - The provider cannot be created
    /// - The audio could not be synthesized or written
    ///
    /// Inputs that cannot be fetched or read are not errors; they are listed
    /// in [`ShoppingList::skipped`].
    ///
    /// # Example
    /// ```no_run
    /// # use grocer::GroceryList;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let result = GroceryList::builder()
    ///     .url("https://example.com/recipe")
    ///     .text("Marchew 1kg")
    ///     .audio("shopping_list.mp3")
    ///     .build()
    ///     .await?;
    /// println!("{}", result.list.to_text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(mut self) -> Result<ShoppingListResult, GrocerError> {
        if self.inputs.is_empty() {
            return Err(GrocerError::BuilderError(
                "No input specified. Use .url(), .text() or .inputs()".to_string(),
            ));
        }

        let config = self.resolve_config()?;
        let pipeline = ShoppingListPipeline::new(&config)?;
        let list = pipeline.run(&self.inputs).await?;

        let audio_path = match self.audio {
            Some(path) if list.is_empty() => {
                warn!("Shopping list is empty, not writing {}", path.display());
                None
            }
            Some(path) => {
                SpeechSynthesizer::new(&config)?
                    .save(&list.to_text(), &path)
                    .await?;
                Some(path)
            }
            None => None,
        };

        Ok(ShoppingListResult { list, audio_path })
    }
}

/// Main entry point for the builder API
pub struct GroceryList;

impl GroceryList {
    /// Creates a new builder for a shopping list
    ///
    /// # Example
    /// ```
    /// use grocer::GroceryList;
    ///
    /// let builder = GroceryList::builder();
    /// ```
    pub fn builder() -> ShoppingListBuilder {
        ShoppingListBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_override() {
        let mut builder = GroceryList::builder()
            .text("2 jajka")
            .provider(LlmProvider::Ollama)
            .model("qwen2.5")
            .timeout(Duration::from_millis(200))
            .config(AppConfig::default());

        let config = builder.resolve_config().unwrap();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.providers["ollama"].model, "qwen2.5");
        assert_eq!(config.providers["openai"].model, "gpt-4o");
        assert_eq!(config.timeout, 1);
    }

    #[test]
    fn test_api_key_goes_to_default_provider() {
        let mut builder = GroceryList::builder()
            .api_key("sk-test")
            .language("English")
            .config(AppConfig::default());

        let config = builder.resolve_config().unwrap();
        assert_eq!(config.providers["openai"].api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.language, "English");
    }

    #[test]
    fn test_unknown_default_provider() {
        let config = AppConfig {
            default_provider: "missing".to_string(),
            ..AppConfig::default()
        };
        let mut builder = GroceryList::builder().model("x").config(config);

        assert!(matches!(
            builder.resolve_config(),
            Err(GrocerError::BuilderError(_))
        ));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("Azure-OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::AzureOpenAI);
        assert_eq!("gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Google);
        assert!("mistral".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_inputs_accumulate() {
        let builder = GroceryList::builder()
            .url("https://example.com/a")
            .text("Cebula 2 szt.")
            .inputs(vec!["Marchew 1kg", "Mleko 1 l"]);

        assert_eq!(builder.inputs.len(), 4);
    }

    #[tokio::test]
    async fn test_no_input_error() {
        let result = GroceryList::builder().build().await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("No input specified"));
    }
}
