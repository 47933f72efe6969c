//! Convenience re-exports for common use.

pub use crate::config::{AgentConfig, AgentEndpoint, ConversationConfig};
pub use crate::driver::{
    ConversationDriver, ConversationEvent, ConversationEventSink, ConversationReport,
    ConversationStatus, DriverPhase,
};
pub use crate::error::{ParleyError, Result};
pub use crate::mcp::{AgentConnector, AgentSession, McpConnector};
pub use crate::reply::extract_reply;
pub use crate::types::{AgentId, ContentItem, History, Message, Role, ToolCallResult};
