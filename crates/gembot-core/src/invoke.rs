//! Model invocation wrapper for the structured flow.
//!
//! One [`Invoker`] is constructed at process start and passed by reference
//! wherever model access is needed. The two variant handles are created
//! lazily on first use and memoized for the life of the process;
//! `tokio::sync::OnceCell` guards the initialization so concurrent first
//! calls (the widget server) construct each handle exactly once.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::{Config, ModelConfig};
use crate::provider::gemini::GeminiClient;
use crate::provider::types::Content;
use crate::provider::{ProviderError, TextModel};
use crate::structured::{self, SchemaViolation, StructuredReply};

/// Builds a model handle from its configuration and the API key.
/// Injected so tests can count constructions.
pub type HandleFactory =
    Box<dyn Fn(&ModelConfig, &str) -> Arc<dyn TextModel> + Send + Sync>;

/// The two model variants the wrapper dispatches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Fast,
    Capable,
}

/// Errors surfaced by a structured invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

/// Holds the lazily constructed flash/pro handles and dispatches
/// structured requests through the fixed template.
pub struct Invoker {
    config: Config,
    factory: HandleFactory,
    fast: OnceCell<Arc<dyn TextModel>>,
    capable: OnceCell<Arc<dyn TextModel>>,
}

impl Invoker {
    /// Construct with the real Gemini handle factory.
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self::with_factory(
            config,
            Box::new(move |model: &ModelConfig, api_key: &str| -> Arc<dyn TextModel> {
                Arc::new(GeminiClient::new(model.clone(), api_key, client.clone()))
            }),
        )
    }

    /// Construct with a custom handle factory (tests, alternate backends).
    pub fn with_factory(config: Config, factory: HandleFactory) -> Self {
        Self {
            config,
            factory,
            fast: OnceCell::new(),
            capable: OnceCell::new(),
        }
    }

    /// The memoized handle for a variant, constructing it on first use.
    async fn handle(&self, variant: Variant) -> &Arc<dyn TextModel> {
        let (cell, model) = match variant {
            Variant::Fast => (&self.fast, &self.config.flash),
            Variant::Capable => (&self.capable, &self.config.pro),
        };
        cell.get_or_init(|| async {
            debug!(model = %model.id, "Constructing model handle");
            (self.factory)(model, &self.config.api_key)
        })
        .await
    }

    /// The fast-variant handle, for callers that drive the model directly
    /// (the interactive chat flow).
    pub async fn fast_handle(&self) -> Arc<dyn TextModel> {
        Arc::clone(self.handle(Variant::Fast).await)
    }

    /// The capable-variant handle.
    pub async fn capable_handle(&self) -> Arc<dyn TextModel> {
        Arc::clone(self.handle(Variant::Capable).await)
    }

    /// Structured extraction via the fast model.
    pub async fn invoke_fast(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<StructuredReply, InvokeError> {
        self.invoke(Variant::Fast, system_prompt, user_prompt).await
    }

    /// Structured extraction via the capable model.
    pub async fn invoke_capable(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<StructuredReply, InvokeError> {
        self.invoke(Variant::Capable, system_prompt, user_prompt)
            .await
    }

    async fn invoke(
        &self,
        variant: Variant,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<StructuredReply, InvokeError> {
        let handle = self.handle(variant).await;
        let prompt = structured::render_prompt(system_prompt, user_prompt);
        let contents = [Content::user(prompt)];

        debug!(model = handle.model_id(), "Dispatching structured request");
        let text = handle.generate(&contents).await?;
        Ok(structured::parse_reply(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, API_KEY_VAR};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> Config {
        Config::from_lookup(|var| {
            (var == API_KEY_VAR).then(|| "AIza-test".to_string())
        })
        .unwrap()
    }

    struct CannedModel {
        id: String,
        text: String,
    }

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate(&self, _contents: &[Content]) -> Result<String, ProviderError> {
            Ok(self.text.clone())
        }

        fn model_id(&self) -> &str {
            &self.id
        }
    }

    fn counting_invoker(text: &str, constructions: Arc<AtomicUsize>) -> Invoker {
        let text = text.to_string();
        Invoker::with_factory(
            test_config(),
            Box::new(move |model: &ModelConfig, _key: &str| -> Arc<dyn TextModel> {
                constructions.fetch_add(1, Ordering::SeqCst);
                Arc::new(CannedModel {
                    id: model.id.clone(),
                    text: text.clone(),
                })
            }),
        )
    }

    #[tokio::test]
    async fn test_handles_are_constructed_once_per_variant() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let invoker = counting_invoker(
            r#"{"summary":"s","sentiment":50,"response":"r"}"#,
            Arc::clone(&constructions),
        );

        for _ in 0..3 {
            invoker.invoke_fast("sys", "usr").await.unwrap();
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            invoker.invoke_capable("sys", "usr").await.unwrap();
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_variants_bind_their_model_ids() {
        let invoker = counting_invoker(
            r#"{"summary":"s","sentiment":50,"response":"r"}"#,
            Arc::new(AtomicUsize::new(0)),
        );

        assert_eq!(invoker.fast_handle().await.model_id(), "gemini-2.5-flash");
        assert_eq!(invoker.capable_handle().await.model_id(), "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_structured_result_round_trip() {
        let invoker = counting_invoker(
            r#"{"summary":"ok","sentiment":80,"response":"hi"}"#,
            Arc::new(AtomicUsize::new(0)),
        );

        let reply = invoker.invoke_fast("sys", "usr").await.unwrap();
        assert_eq!(reply.sentiment, 80);
        assert_eq!(reply.summary, "ok");
    }

    #[tokio::test]
    async fn test_schema_violation_propagates() {
        let invoker = counting_invoker(
            r#"{"summary":"ok","sentiment":150,"response":"hi"}"#,
            Arc::new(AtomicUsize::new(0)),
        );

        let err = invoker.invoke_fast("sys", "usr").await.unwrap_err();
        assert!(matches!(
            err,
            InvokeError::Schema(SchemaViolation::OutOfRange { .. })
        ));
    }
}
