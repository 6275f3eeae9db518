use crate::config::{AppConfig, SpeechConfig};
use crate::error::GrocerError;
use log::{debug, info};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Reads a shopping list aloud through the hosted text-to-speech endpoint
pub struct SpeechSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl SpeechSynthesizer {
    /// Key from `speech.api_key`, then the openai provider, then `OPENAI_API_KEY`
    pub fn new(config: &AppConfig) -> Result<Self, GrocerError> {
        let speech = &config.speech;
        let openai = config.providers.get("openai");

        let api_key = speech
            .api_key
            .clone()
            .or_else(|| openai.and_then(|p| p.api_key.clone()))
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                GrocerError::SpeechError("OPENAI_API_KEY not found in config or environment".to_string())
            })?;

        let base_url = speech
            .base_url
            .clone()
            .or_else(|| openai.and_then(|p| p.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self::with_client(client, api_key, base_url, speech))
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, speech: &SpeechConfig) -> Self {
        Self::with_client(Client::new(), api_key, base_url, speech)
    }

    fn with_client(client: Client, api_key: String, base_url: String, speech: &SpeechConfig) -> Self {
        SpeechSynthesizer {
            client,
            api_key,
            base_url,
            model: speech.model.clone(),
            voice: speech.voice.clone(),
        }
    }

    /// Synthesize `text` as mp3 audio
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GrocerError> {
        if text.trim().is_empty() {
            return Err(GrocerError::SpeechError("nothing to read".to_string()));
        }

        debug!("Synthesizing {} characters with {}", text.len(), self.voice);
        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "voice": self.voice,
                "input": text,
                "response_format": "mp3"
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GrocerError::SpeechError(format!(
                "text-to-speech request failed with status {}: {}",
                status, body
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesize `text` and write the audio to `path`
    pub async fn save(&self, text: &str, path: &Path) -> Result<(), GrocerError> {
        let audio = self.synthesize(text).await?;
        tokio::fs::write(path, &audio).await?;
        info!("Saved {} bytes of audio to {}", audio.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_save_writes_audio() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/speech")
            .match_header("authorization", "Bearer test_key")
            .match_body(Matcher::PartialJson(json!({
                "model": "tts-1",
                "voice": "alloy",
                "input": "- Cebula: 3 szt.",
                "response_format": "mp3"
            })))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3fake-mp3".as_slice())
            .create_async()
            .await;

        let synthesizer = SpeechSynthesizer::with_base_url(
            "test_key".to_string(),
            server.url(),
            &SpeechConfig::default(),
        );
        let path = std::env::temp_dir().join(format!("grocer-speech-{}.mp3", std::process::id()));

        synthesizer.save("- Cebula: 3 szt.", &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ID3fake-mp3");
        std::fs::remove_file(&path).unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/audio/speech")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Invalid API key"}}"#)
            .create_async()
            .await;

        let synthesizer = SpeechSynthesizer::with_base_url(
            "bad_key".to_string(),
            server.url(),
            &SpeechConfig::default(),
        );

        match synthesizer.synthesize("- Mleko: 1 l").await {
            Err(GrocerError::SpeechError(message)) => assert!(message.contains("Invalid API key")),
            other => panic!("expected a speech error, got {:?}", other.map(|a| a.len())),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let synthesizer = SpeechSynthesizer::with_base_url(
            "test_key".to_string(),
            "http://127.0.0.1:9".to_string(),
            &SpeechConfig::default(),
        );
        assert!(matches!(
            synthesizer.synthesize("  ").await,
            Err(GrocerError::SpeechError(_))
        ));
    }

    #[test]
    fn test_key_from_openai_provider() {
        let mut config = AppConfig::default();
        config.speech.api_key = None;
        if let Some(openai) = config.providers.get_mut("openai") {
            openai.api_key = Some("provider_key".to_string());
        }

        let synthesizer = SpeechSynthesizer::new(&config).unwrap();
        assert_eq!(synthesizer.api_key, "provider_key");
        assert_eq!(synthesizer.base_url, DEFAULT_BASE_URL);
    }
}
