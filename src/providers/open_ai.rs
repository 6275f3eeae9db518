use crate::config::ProviderConfig;
use crate::providers::{http_client, CompletionRequest, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or("OPENAI_API_KEY not found in config or environment")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        Ok(OpenAIProvider {
            client: http_client(timeout)?,
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

/// `messages` array shared by the OpenAI-compatible providers
pub(crate) fn chat_messages(request: &CompletionRequest<'_>) -> Value {
    json!([
        {"role": "system", "content": request.system},
        {"role": "user", "content": request.prompt}
    ])
}

/// Strict `json_schema` response format, or plain text when no schema is given
pub(crate) fn response_format(request: &CompletionRequest<'_>) -> Value {
    match request.schema {
        Some(schema) => json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": true
            }
        }),
        None => json!({"type": "text"}),
    }
}

/// Pull the answer text out of a chat completion body
pub(crate) fn chat_completion_content(
    provider: &str,
    response_body: &Value,
) -> Result<String, ProviderError> {
    // Check for API error response
    if let Some(error) = response_body.get("error") {
        let error_message = error
            .as_str()
            .unwrap_or_else(|| error["message"].as_str().unwrap_or("Unknown error"));
        return Err(format!("{} API error: {}", provider, error_message).into());
    }

    let content = response_body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| format!("Failed to extract content from {} response", provider))?
        .to_string();

    Ok(content)
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": chat_messages(request),
                "response_format": response_format(request),
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await?;

        let status = response.status();
        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);
        if !status.is_success() && response_body.get("error").is_none() {
            return Err(format!("openai request failed with status: {}", status).into());
        }

        chat_completion_content("openai", &response_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ResponseSchema;
    use mockito::{Matcher, Server};

    fn request<'a>(schema: Option<&'a ResponseSchema>) -> CompletionRequest<'a> {
        CompletionRequest {
            system: "You are a helpful assistant specializing in recipe analysis.",
            prompt: "Recipe text:\n2 eggs",
            schema,
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer fake_api_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "choices": [{
                        "message": {
                            "content": "{\"ingredients\": [{\"name\": \"Jajko\", \"quantity\": \"2\", \"unit\": \"\"}]}"
                        }
                    }]
                }"#,
            )
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o".to_string(),
        );

        let result = provider.complete(&request(None)).await.unwrap();
        assert!(result.contains("Jajko"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_sends_json_schema() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "recipe_ingredients", "strict": true}
                }
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "{}"}}]}"#)
            .create_async()
            .await;

        let schema = ResponseSchema {
            name: "recipe_ingredients",
            schema: json!({"type": "object"}),
        };
        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o".to_string(),
        );

        let result = provider.complete(&request(Some(&schema))).await.unwrap();
        assert_eq!(result, "{}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Invalid request"}}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o".to_string(),
        );

        let result = provider.complete(&request(None)).await;
        assert!(result.unwrap_err().to_string().contains("Invalid request"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_name() {
        let mut config = ProviderConfig::with_model("gpt-4o");
        config.api_key = Some("fake_api_key".to_string());
        let provider = OpenAIProvider::new(&config, Duration::from_secs(30)).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }
}
