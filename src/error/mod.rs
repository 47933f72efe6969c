//! Error types for Parley.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An agent endpoint could not be reached or refused the session handshake.
    #[error("Connection error ({endpoint}): {message}")]
    Connection { endpoint: String, message: String },

    /// The session stream broke while a call was in flight.
    #[error("Transport error ({context}): {message}")]
    Transport { context: String, message: String },

    /// The agent answered the invocation with `isError = true`.
    #[error("Tool call failed: {message}")]
    ToolFailed { message: String },

    /// The tool result did not carry a leading text item.
    #[error("Unexpected tool result format: {shape}")]
    Format { shape: String },

    /// The reply parsed as a nested envelope but its text could not be read.
    #[error("Failed during nested parsing of: {raw} ({reason})")]
    NestedParse { raw: String, reason: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Conversation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ParleyError {
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn transport(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::ToolFailed { .. } => ErrorCategory::ToolExecution,
            Self::Format { .. } | Self::NestedParse { .. } => ErrorCategory::ReplyFormat,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Io,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::UnsupportedOperation(_) | Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the error came from the agent's reply rather than the driver's plumbing.
    pub fn is_agent_reported(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::ToolExecution | ErrorCategory::ReplyFormat
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Connection => RecoverySuggestion::StartAgentServers,
            ErrorCategory::Transport => RecoverySuggestion::RestartConversation,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::ToolExecution => RecoverySuggestion::InspectAgentLogs,
            ErrorCategory::ReplyFormat => RecoverySuggestion::InspectAgentLogs,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Io => RecoverySuggestion::CheckFilePermissions,
            ErrorCategory::Cancelled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ReportBug,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
