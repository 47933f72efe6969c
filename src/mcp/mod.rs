//! Model Context Protocol (MCP) sessions with the conversing agents.

pub mod discovery;
pub mod session;
pub mod transport;

pub use discovery::{discover_tools, ToolDiscovery};
pub use session::{AgentConnector, AgentSession, AgentToolInfo, McpAgentSession, McpConnector};
pub use transport::{HttpTransport, McpTransport, StdioTransport};
