pub mod fetchers;
pub mod html;

use crate::config::FetcherConfig;
use crate::error::GrocerError;
use fetchers::{ChromeFetcher, RequestFetcher};
use log::{debug, info, warn};
use std::time::Duration;

pub use html::extract_recipe_text;

/// Downloads recipe pages, through the headless renderer when one is configured
pub struct PageFetcher {
    direct: RequestFetcher,
    renderer: Option<ChromeFetcher>,
}

impl PageFetcher {
    pub fn new(config: &FetcherConfig, timeout: Duration) -> Result<Self, GrocerError> {
        let direct = RequestFetcher::new(Some(timeout), config.user_agent.as_deref())?;
        let renderer = ChromeFetcher::new(config.renderer_url.as_deref(), timeout);
        if renderer.is_some() {
            debug!("Pages will be rendered by the headless browser service");
        }

        Ok(Self { direct, renderer })
    }

    /// Page HTML; a renderer failure falls back to a direct download
    pub async fn fetch_html(&self, url: &str) -> Result<String, GrocerError> {
        if let Some(renderer) = &self.renderer {
            match renderer.fetch(url).await {
                Ok(html) => return Ok(html),
                Err(e) => warn!("Rendering {} failed, downloading directly: {}", url, e),
            }
        }
        self.direct.fetch(url).await
    }

    /// Fetch a page and reduce it to its recipe text
    pub async fn fetch_recipe_text(&self, url: &str) -> Result<String, GrocerError> {
        info!("Fetching recipe from URL: {}", url);
        let html = self.fetch_html(url).await?;
        if html.trim().is_empty() {
            return Err(GrocerError::NoContent(url.to_string()));
        }

        let text = extract_recipe_text(&html);
        if text.trim().is_empty() {
            return Err(GrocerError::NoContent(url.to_string()));
        }
        Ok(text)
    }
}

/// The text handed on in place of a page that could not be fetched
pub fn fetch_failure_placeholder(url: &str, reason: &GrocerError) -> String {
    format!(
        "Error: Could not fetch content from {}. Reason: {}",
        url, reason
    )
}
