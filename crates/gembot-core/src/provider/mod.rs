//! Model provider trait and the Gemini implementation.
//!
//! `TextModel` is the seam between the two conversation flows and the
//! network: one configured handle, one request payload in, one text reply
//! out. The `gemini` module implements it against the hosted
//! `generateContent` endpoint; tests substitute mocks.

pub mod gemini;
pub mod types;

use async_trait::async_trait;
use types::Content;

/// A configured client bound to one model identifier and parameter set.
///
/// One call is one synchronous round trip: the payload is sent, and either
/// the model's text or a typed error comes back. No retry, no streaming.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Send an ordered list of contents and return the model's text reply.
    async fn generate(&self, contents: &[Content]) -> Result<String, ProviderError>;

    /// The model identifier this handle is bound to.
    fn model_id(&self) -> &str;
}

/// Errors surfaced by a model handle.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to model endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("model returned no usable text")]
    EmptyReply,
}
