use crate::error::GrocerError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
}

/// Delegates page loading to a headless browser service, for pages that
/// only render their recipe with JavaScript
pub struct ChromeFetcher {
    endpoint: String,
    client: Client,
}

impl ChromeFetcher {
    /// Uses `renderer_url` when given, else `PAGE_SCRIBER_URL`; `None` when neither is set
    pub fn new(renderer_url: Option<&str>, timeout: Duration) -> Option<Self> {
        let base_url = renderer_url
            .map(str::to_string)
            .or_else(|| env::var("PAGE_SCRIBER_URL").ok())?;
        let endpoint = format!("{}/api/fetch-content", base_url.trim_end_matches('/'));
        let client = Client::builder().timeout(timeout).build().ok()?;
        Some(Self { endpoint, client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, GrocerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ContentRequest { url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GrocerError::HttpStatus {
                url: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let content: ContentResponse = response.json().await?;
        Ok(content.content)
    }
}
