//! Structured extraction flow.
//!
//! The caller supplies a system prompt and a user prompt; both are
//! substituted into one fixed template together with generated format
//! instructions, and the model's raw text is coerced into the three-field
//! [`StructuredReply`]. The coercion fails closed: a missing field, a
//! wrong type, an out-of-range sentiment, or malformed JSON each surface
//! as a distinct [`SchemaViolation`]. No default filling, no clamping —
//! the opposite of the interactive flow's never-fails contract.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed-shape record extracted from a model's free-form reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReply {
    pub summary: String,
    pub sentiment: u8,
    pub response: String,
}

/// Kind and constraints of one schema field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Integer { min: i64, max: i64 },
}

/// Declarative description of one required field. The same table drives
/// the generated format instructions and the strict parser.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl FieldSpec {
    fn type_hint(&self) -> String {
        match self.kind {
            FieldKind::Text => "string".into(),
            FieldKind::Integer { min, max } => format!("integer between {min} and {max}"),
        }
    }
}

pub const SUMMARY: FieldSpec = FieldSpec {
    name: "summary",
    kind: FieldKind::Text,
    description: "Summary of the user's message",
};

pub const SENTIMENT: FieldSpec = FieldSpec {
    name: "sentiment",
    kind: FieldKind::Integer { min: 0, max: 100 },
    description: "Sentiment score from 0 (negative) to 100 (positive)",
};

pub const RESPONSE: FieldSpec = FieldSpec {
    name: "response",
    kind: FieldKind::Text,
    description: "Suggested response to the user",
};

/// All required fields, in output order.
pub const REPLY_FIELDS: [&FieldSpec; 3] = [&SUMMARY, &SENTIMENT, &RESPONSE];

/// Violations raised by the strict parser.
#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
    #[error("model reply is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("model reply is not a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: String,
    },
    #[error("field `{field}` value {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Format instructions substituted into the `{format_prompt}` slot.
pub fn format_instructions() -> String {
    let mut out = String::from(
        "Reply with a single JSON object containing exactly these fields:\n",
    );
    for spec in REPLY_FIELDS {
        out.push_str(&format!(
            "- \"{}\" ({}): {}\n",
            spec.name,
            spec.type_hint(),
            spec.description
        ));
    }
    out.push_str("Return only the JSON object, with no surrounding prose.");
    out
}

/// Substitute the three named slots into the fixed request template.
pub fn render_prompt(system_prompt: &str, user_prompt: &str) -> String {
    format!(
        "{system_prompt}\n\n{format_prompt}\n\nUser: {user_prompt}",
        system_prompt = system_prompt,
        format_prompt = format_instructions(),
        user_prompt = user_prompt
    )
}

/// Coerce raw model text into a [`StructuredReply`], failing closed.
pub fn parse_reply(text: &str) -> Result<StructuredReply, SchemaViolation> {
    let payload = strip_fence(text);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| SchemaViolation::MalformedJson(e.to_string()))?;
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

    Ok(StructuredReply {
        summary: text_field(object, &SUMMARY)?,
        sentiment: integer_field(object, &SENTIMENT)? as u8,
        response: text_field(object, &RESPONSE)?,
    })
}

/// Models routinely wrap JSON in a Markdown fence despite instructions;
/// accept that one deviation and nothing else.
fn strip_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence regex is valid")
    });
    match fence.captures(text) {
        Some(captures) => captures.get(1).map_or(text, |m| m.as_str()),
        None => text.trim(),
    }
}

fn require<'a>(
    object: &'a Map<String, Value>,
    spec: &FieldSpec,
) -> Result<&'a Value, SchemaViolation> {
    object
        .get(spec.name)
        .ok_or(SchemaViolation::MissingField(spec.name))
}

fn text_field(object: &Map<String, Value>, spec: &FieldSpec) -> Result<String, SchemaViolation> {
    require(object, spec)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SchemaViolation::WrongType {
            field: spec.name,
            expected: spec.type_hint(),
        })
}

fn integer_field(object: &Map<String, Value>, spec: &FieldSpec) -> Result<i64, SchemaViolation> {
    let (min, max) = match spec.kind {
        FieldKind::Integer { min, max } => (min, max),
        FieldKind::Text => (i64::MIN, i64::MAX),
    };
    let value = require(object, spec)?
        .as_i64()
        .ok_or_else(|| SchemaViolation::WrongType {
            field: spec.name,
            expected: spec.type_hint(),
        })?;
    if value < min || value > max {
        return Err(SchemaViolation::OutOfRange {
            field: spec.name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_reply() {
        let reply =
            parse_reply(r#"{"summary":"ok","sentiment":80,"response":"hi"}"#).unwrap();
        assert_eq!(reply.sentiment, 80);
        assert_eq!(reply.summary, "ok");
        assert_eq!(reply.response, "hi");
    }

    #[test]
    fn test_fenced_reply_is_accepted() {
        let text = "```json\n{\"summary\":\"ok\",\"sentiment\":5,\"response\":\"hi\"}\n```";
        let reply = parse_reply(text).unwrap();
        assert_eq!(reply.sentiment, 5);

        // A bare fence without the language tag works too.
        let text = "```\n{\"summary\":\"ok\",\"sentiment\":5,\"response\":\"hi\"}\n```";
        assert!(parse_reply(text).is_ok());
    }

    #[test]
    fn test_out_of_range_sentiment_is_rejected_not_clamped() {
        let err =
            parse_reply(r#"{"summary":"ok","sentiment":150,"response":"hi"}"#).unwrap_err();
        assert!(matches!(
            err,
            SchemaViolation::OutOfRange { field: "sentiment", value: 150, .. }
        ));

        let err =
            parse_reply(r#"{"summary":"ok","sentiment":-1,"response":"hi"}"#).unwrap_err();
        assert!(matches!(err, SchemaViolation::OutOfRange { .. }));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = parse_reply(r#"{"summary":"ok","sentiment":80}"#).unwrap_err();
        assert!(matches!(err, SchemaViolation::MissingField("response")));
    }

    #[test]
    fn test_non_integer_sentiment_is_rejected() {
        let err =
            parse_reply(r#"{"summary":"ok","sentiment":"80","response":"hi"}"#).unwrap_err();
        assert!(matches!(err, SchemaViolation::WrongType { field: "sentiment", .. }));

        let err =
            parse_reply(r#"{"summary":"ok","sentiment":79.5,"response":"hi"}"#).unwrap_err();
        assert!(matches!(err, SchemaViolation::WrongType { field: "sentiment", .. }));
    }

    #[test]
    fn test_malformed_and_non_object_replies() {
        assert!(matches!(
            parse_reply("the user seems upset"),
            Err(SchemaViolation::MalformedJson(_))
        ));
        assert!(matches!(
            parse_reply(r#"["summary","sentiment"]"#),
            Err(SchemaViolation::NotAnObject)
        ));
    }

    #[test]
    fn test_format_instructions_cover_every_field() {
        let instructions = format_instructions();
        for spec in REPLY_FIELDS {
            assert!(instructions.contains(spec.name));
            assert!(instructions.contains(spec.description));
        }
        assert!(instructions.contains("between 0 and 100"));
    }

    #[test]
    fn test_template_slot_order() {
        let prompt = render_prompt("SYS", "USR");
        assert!(prompt.starts_with("SYS\n\n"));
        assert!(prompt.ends_with("\n\nUser: USR"));
        let sys_at = prompt.find("SYS").unwrap();
        let fmt_at = prompt.find("Reply with a single JSON object").unwrap();
        let usr_at = prompt.find("User: USR").unwrap();
        assert!(sys_at < fmt_at && fmt_at < usr_at);
    }
}
