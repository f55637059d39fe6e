//! Gemini REST provider.
//!
//! Talks to the hosted `generateContent` endpoint:
//!
//! `POST {base}/models/{model}:generateContent`
//!
//! Authentication is a single static key in the `x-goog-api-key` header.
//! Sampling parameters ride along in `generationConfig`. Errors come back
//! in a `{"error": {...}}` envelope which is decoded for the message; if
//! the body is not the envelope, the raw body is reported instead.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::Content;
use super::{ProviderError, TextModel};
use crate::config::ModelConfig;

/// Hosted Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A handle bound to one Gemini model and its sampling parameters.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: ModelConfig,
}

impl GeminiClient {
    pub fn new(model: ModelConfig, api_key: &str, client: Client) -> Self {
        Self::with_base_url(model, api_key, client, GEMINI_API_BASE)
    }

    /// Point the handle at a non-default endpoint (local stub, proxy).
    pub fn with_base_url(
        model: ModelConfig,
        api_key: &str,
        client: Client,
        base_url: &str,
    ) -> Self {
        debug!(model = %model.id, "Initialized Gemini handle");
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model.id)
    }
}

// ── Gemini API request/response types ───────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn into_text(self) -> Option<(String, Option<String>)> {
        let candidate = self.candidates.into_iter().next()?;
        let finish_reason = candidate.finish_reason;
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            None
        } else {
            Some((text, finish_reason))
        }
    }
}

// ── TextModel implementation ────────────────────────────────────────

#[async_trait::async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, contents: &[Content]) -> Result<String, ProviderError> {
        let url = self.url();
        let body = GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.model.temperature,
                max_output_tokens: self.model.max_output_tokens,
            },
        };

        debug!(model = %self.model.id, entries = contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: GenerateContentResponse = serde_json::from_str(&raw)?;

        let (text, finish_reason) = decoded.into_text().ok_or(ProviderError::EmptyReply)?;

        debug!(
            model = %self.model.id,
            finish_reason = finish_reason.as_deref().unwrap_or("unknown"),
            chars = text.len(),
            "Received model reply"
        );

        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, FLASH_MODEL};

    fn flash() -> ModelConfig {
        ModelConfig {
            id: FLASH_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    #[test]
    fn test_url_construction() {
        let handle = GeminiClient::new(flash(), "key", Client::new());
        assert_eq!(
            handle.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let handle =
            GeminiClient::with_base_url(flash(), "key", Client::new(), "http://localhost:9090/");
        assert_eq!(
            handle.url(),
            "http://localhost:9090/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serialization_shape() {
        let contents = vec![Content::user("a"), Content::model("b"), Content::user("c")];
        let body = GenerateContentRequest {
            contents: &contents,
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 256,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "b");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "there"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let decoded: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let (text, reason) = decoded.into_text().unwrap();
        assert_eq!(text, "Hello there");
        assert_eq!(reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        // Safety-blocked candidates arrive without content.
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let decoded: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(decoded.into_text().is_none());

        let raw = r#"{}"#;
        let decoded: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(decoded.into_text().is_none());
    }

    #[test]
    fn test_error_envelope_decoding() {
        let raw = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.error.message, "API key not valid");
    }
}
