//! Tool invocation results, decoded into a closed set of content variants.

use rmcp::model::{CallToolResult, Content, RawContent};
use serde::Serialize;

/// One item of a tool result's content list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
    /// Any non-text item (image, audio, resource, ...). Only its wire tag is kept.
    Other { kind: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Other { .. } => None,
        }
    }

    fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Other { kind } => kind,
        }
    }
}

impl From<Content> for ContentItem {
    fn from(item: Content) -> Self {
        match item.raw {
            RawContent::Text(text) => Self::Text { text: text.text },
            other => Self::Other {
                kind: raw_content_kind(&other),
            },
        }
    }
}

fn raw_content_kind(content: &RawContent) -> String {
    serde_json::to_value(content)
        .ok()
        .and_then(|value| {
            value
                .get("type")
                .and_then(|kind| kind.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".into())
}

/// The `{isError, content}` envelope returned by every tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    pub is_error: bool,
    pub content: Vec<ContentItem>,
}

impl ToolCallResult {
    /// Successful result carrying a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ContentItem::text(text)],
        }
    }

    /// Failed result carrying a single text item.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ContentItem::text(text)],
        }
    }

    /// Short description of the content list, for format diagnostics.
    pub fn describe_shape(&self) -> String {
        match self.content.first() {
            None => "empty content".into(),
            Some(first) => format!(
                "first item is `{}` ({} item{})",
                first.kind(),
                self.content.len(),
                if self.content.len() == 1 { "" } else { "s" }
            ),
        }
    }
}

impl From<CallToolResult> for ToolCallResult {
    fn from(result: CallToolResult) -> Self {
        Self {
            is_error: result.is_error.unwrap_or(false),
            content: result.content.into_iter().map(ContentItem::from).collect(),
        }
    }
}
