use thiserror::Error;

/// Errors that can occur while building a shopping list
#[derive(Error, Debug)]
pub enum GrocerError {
    /// Failed to fetch a recipe page
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} responded with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The page was fetched but held nothing usable
    #[error("No content fetched from {0}")]
    NoContent(String),

    /// The LLM provider call failed
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The model answered with something that does not match the requested shape
    #[error("Malformed model output for {context}: {source}")]
    MalformedOutput {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Every input was blank
    #[error("No valid recipe item could be processed")]
    NoInputs,

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Text-to-speech request failed
    #[error("Speech synthesis failed: {0}")]
    SpeechError(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl GrocerError {
    pub(crate) fn provider(err: impl std::fmt::Display) -> Self {
        GrocerError::ProviderError(err.to_string())
    }
}
