use crate::error::GrocerError;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain HTTP download of a page
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>, user_agent: Option<&str>) -> Result<Self, GrocerError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, GrocerError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GrocerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/przepis")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .with_status(200)
            .with_body("<html><body>Przepis</body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(None, None).unwrap();
        let html = fetcher
            .fetch(&format!("{}/przepis", server.url()))
            .await
            .unwrap();

        assert!(html.contains("Przepis"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(Some(Duration::from_secs(5)), None).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.url())).await;

        match result {
            Err(GrocerError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
