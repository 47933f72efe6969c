//! Normalizes a tool result into the agent's plain reply text.
//!
//! Agents answer either with the literal reply text or, through a quirk of
//! their result serialization, with that text wrapped one level deep in a
//! JSON envelope `{"content": [{"text": "..."}]}`. Both shapes are accepted:
//!
//! - text that is not JSON is the reply;
//! - JSON matching the nested envelope is unwrapped once;
//! - any other JSON is treated as ordinary text and returned unchanged.

use serde_json::Value;

use crate::error::{ParleyError, Result};
use crate::types::ToolCallResult;

/// Message used when an error result carries no readable text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Extract the reply text from a tool result, classifying failures.
pub fn extract_reply(result: ToolCallResult) -> Result<String> {
    if result.is_error {
        let message = result
            .content
            .first()
            .and_then(|item| item.as_text())
            .unwrap_or(UNKNOWN_ERROR)
            .to_string();
        tracing::error!(error = %message, "tool call returned an error result");
        return Err(ParleyError::ToolFailed { message });
    }

    let Some(raw) = result.content.first().and_then(|item| item.as_text()) else {
        let shape = result.describe_shape();
        tracing::error!(%shape, "unexpected success result format");
        return Err(ParleyError::Format { shape });
    };

    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return Ok(raw.to_string());
    };

    match nested_text(&parsed) {
        None => Ok(raw.to_string()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => {
            let reason = format!("nested `text` is {}", json_kind(other));
            tracing::error!(raw = %raw, %reason, "nested reply envelope is malformed");
            Err(ParleyError::NestedParse {
                raw: raw.to_string(),
                reason,
            })
        }
    }
}

/// `content[0].text` when `value` has the nested envelope shape.
fn nested_text(value: &Value) -> Option<&Value> {
    value
        .as_object()?
        .get("content")?
        .as_array()?
        .first()?
        .as_object()?
        .get("text")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
