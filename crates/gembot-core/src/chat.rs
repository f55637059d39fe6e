//! Interactive chat flow.
//!
//! The exchange contract is total: whatever the provider does — network
//! failure, bad key, server error — the caller gets a reply back. Errors
//! are captured as [`Reply::Failure`] so tests can tell the two apart, and
//! only the rendering step collapses a failure into the `Error: ...`
//! display string that lands in the transcript. Nothing is retried and
//! nothing propagates.

use std::sync::Arc;
use tracing::warn;

use crate::history::{self, Transcript, Turn};
use crate::provider::TextModel;

/// Outcome of one exchange with the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The model's text.
    Text(String),
    /// A captured provider error, described for display.
    Failure(String),
}

impl Reply {
    /// The text shown to the user and appended to the transcript.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Failure(description) => format!("Error: {description}"),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Perform one round trip: adapt the transcript, send, capture the result.
///
/// The transcript is only read; appending the exchange is the caller's
/// job (see [`ChatSession::send`] and `history::append_exchange`).
pub async fn exchange(model: &dyn TextModel, transcript: &[Turn], message: &str) -> Reply {
    let contents = history::build_contents(transcript, message);
    match model.generate(&contents).await {
        Ok(text) => Reply::Text(text),
        Err(e) => {
            warn!(model = model.model_id(), error = %e, "Exchange failed, folding error into reply");
            Reply::Failure(e.to_string())
        }
    }
}

/// A presentation-loop session owning its transcript.
pub struct ChatSession {
    model: Arc<dyn TextModel>,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            transcript: Transcript::new(),
        }
    }

    /// Send one user message and append the completed exchange.
    ///
    /// Always succeeds; a provider failure becomes the assistant's reply
    /// text.
    pub async fn send(&mut self, message: &str) -> Reply {
        let reply = exchange(self.model.as_ref(), &self.transcript, message).await;
        history::append_exchange(&mut self.transcript, message, &reply.display_text());
        reply
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Drop the whole history, returning the session to an empty state.
    pub fn reset(&mut self) {
        self.transcript.clear();
    }
}
