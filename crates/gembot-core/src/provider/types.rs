//! Wire types shared by every model handle.
//!
//! These mirror the Gemini request shape: a conversation is an ordered
//! list of `Content` entries, each carrying a role and a list of parts.

use serde::{Deserialize, Serialize};

/// Role label as the provider expects it on the wire.
///
/// Note the asymmetry with the transcript side: the provider calls the
/// assistant role `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

/// One entry in the provider-shaped conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: WireRole,
    pub parts: Vec<Part>,
}

/// A single content part. Text only; this wrapper carries no media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: WireRole::Model,
            parts: vec![Part { text: text.into() }],
        }
    }
}
