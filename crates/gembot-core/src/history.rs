//! Conversation transcript and the provider-shape adapter.
//!
//! A [`Transcript`] is the ordered history of role-tagged [`Turn`]s held by
//! a presentation loop (terminal REPL or browser widget). The adapter maps
//! it into the provider's `Content` list: `user` stays `user`, `assistant`
//! becomes `model`, and each turn's text is wrapped in a single-element
//! parts list. The adapter only reads the transcript; mutation stays with
//! the owner.
//!
//! Roles are a closed enum, so an externally supplied turn with any other
//! role label fails deserialization outright instead of being silently
//! dropped.

use serde::{Deserialize, Serialize};

use crate::provider::types::Content;

/// Role tag of one transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation history. Grows by one user turn and one assistant
/// turn per interaction cycle; never reordered or pruned.
pub type Transcript = Vec<Turn>;

/// Map a transcript into the provider's content list, order preserved.
pub fn to_contents(transcript: &[Turn]) -> Vec<Content> {
    transcript
        .iter()
        .map(|turn| match turn.role {
            Role::User => Content::user(turn.content.clone()),
            Role::Assistant => Content::model(turn.content.clone()),
        })
        .collect()
}

/// Build the full request payload: converted history followed by the new
/// user message as its own final entry. The new message is never merged
/// into the history list.
pub fn build_contents(transcript: &[Turn], message: &str) -> Vec<Content> {
    let mut contents = to_contents(transcript);
    contents.push(Content::user(message));
    contents
}

/// Append one completed exchange to the transcript.
pub fn append_exchange(transcript: &mut Transcript, message: &str, reply_text: &str) {
    transcript.push(Turn::user(message));
    transcript.push(Turn::assistant(reply_text));
}
