use crate::error::GrocerError;
use crate::providers::{CompletionRequest, LlmProvider, ResponseSchema};
use log::debug;
use serde::de::DeserializeOwned;

/// Remove a surrounding Markdown code fence (```json ... ```), if any
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the opening line
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };
    inner.trim_end().trim_end_matches("```").trim()
}

/// Ask the model for JSON matching `schema` and parse it into `T`
pub async fn complete_json<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    system: &str,
    prompt: &str,
    schema: &ResponseSchema,
) -> Result<T, GrocerError> {
    let request = CompletionRequest {
        system,
        prompt,
        schema: Some(schema),
    };

    let answer = provider
        .complete(&request)
        .await
        .map_err(GrocerError::provider)?;
    debug!("{} answer from {}: {}", schema.name, provider.provider_name(), answer);

    serde_json::from_str(strip_code_fences(&answer)).map_err(|source| GrocerError::MalformedOutput {
        context: schema.name,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    struct CannedProvider(&'static str);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        packaged: bool,
    }

    fn schema() -> ResponseSchema {
        ResponseSchema {
            name: "package_size",
            schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  ```\n[1]\n```  "), "[1]");
    }

    #[tokio::test]
    async fn test_complete_json_parses_fenced_answer() {
        let provider = CannedProvider("```json\n{\"packaged\": true}\n```");
        let answer: Answer = complete_json(&provider, "system", "prompt", &schema())
            .await
            .unwrap();
        assert_eq!(answer, Answer { packaged: true });
    }

    #[tokio::test]
    async fn test_complete_json_reports_malformed_output() {
        let provider = CannedProvider("I think it is packaged.");
        let result: Result<Answer, _> = complete_json(&provider, "system", "prompt", &schema()).await;
        match result {
            Err(GrocerError::MalformedOutput { context, .. }) => assert_eq!(context, "package_size"),
            other => panic!("expected malformed output, got {:?}", other),
        }
    }
}
