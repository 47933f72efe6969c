//! Tool discovery against a configured agent.

use crate::config::AgentConfig;
use crate::error::Result;

use super::session::{AgentConnector, AgentToolInfo};

/// What an agent advertised when probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDiscovery {
    pub label: String,
    pub endpoint: String,
    pub tools: Vec<AgentToolInfo>,
    /// Whether the tool the driver will invoke is among `tools`.
    pub has_chat_tool: bool,
}

/// Open a session, list its tools, and close it again.
///
/// The session is closed even when listing fails.
pub async fn discover_tools(
    connector: &dyn AgentConnector,
    agent: &AgentConfig,
    tool_name: &str,
) -> Result<ToolDiscovery> {
    let mut session = connector.open(agent).await?;
    let listed = session.list_tools().await;
    if let Err(error) = session.close().await {
        tracing::warn!(agent = %agent.label, error = %error, "failed to close discovery session");
    }
    let tools = listed?;

    let has_chat_tool = tools.iter().any(|tool| tool.name == tool_name);
    tracing::info!(
        agent = %agent.label,
        tools = tools.len(),
        has_chat_tool,
        "discovered agent tools"
    );
    Ok(ToolDiscovery {
        label: agent.label.clone(),
        endpoint: session.endpoint().to_string(),
        tools,
        has_chat_tool,
    })
}
