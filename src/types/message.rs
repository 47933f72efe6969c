//! Message and per-agent history types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ParleyError, Result};

/// Speaker of a history entry, serialized the way chat agents expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single history entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Chronological history of one agent's side of the conversation.
///
/// Entries alternate user/assistant starting with user. The inbound message
/// is appended before the agent is invoked and the reply after, so between
/// the two pushes the history ends with a dangling user entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append the message about to be delivered to the agent.
    pub fn push_inbound(&mut self, content: impl Into<String>) -> Result<()> {
        if self.awaiting_reply() {
            return Err(ParleyError::InvalidState(
                "history already holds an unanswered inbound message".into(),
            ));
        }
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append the agent's validated reply to the pending inbound message.
    pub fn push_reply(&mut self, content: impl Into<String>) -> Result<()> {
        if !self.awaiting_reply() {
            return Err(ParleyError::InvalidState(
                "reply recorded without a pending inbound message".into(),
            ));
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// History as sent alongside the current message: everything except a
    /// trailing unanswered inbound entry.
    pub fn prior_to_inbound(&self) -> &[Message] {
        if self.awaiting_reply() {
            &self.messages[..self.messages.len() - 1]
        } else {
            &self.messages
        }
    }

    pub fn awaiting_reply(&self) -> bool {
        matches!(self.last(), Some(message) if message.role == Role::User)
    }

    /// Whether entries strictly alternate user/assistant starting with user.
    pub fn is_alternating(&self) -> bool {
        self.messages.iter().enumerate().all(|(index, message)| {
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            message.role == expected
        })
    }
}
