//! Agent sessions: one live, initialized MCP connection per agent.

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, JsonObject, ProtocolVersion},
    service::{ClientInitializeError, ServiceError},
};
use serde_json::json;

use crate::config::AgentConfig;
use crate::error::{ParleyError, Result};
use crate::types::{Message, ToolCallResult};

use super::transport::{transport_for, McpRunningService, McpTransport};

/// A tool advertised by an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentToolInfo {
    pub name: String,
    pub description: Option<String>,
}

/// An open session with one agent.
///
/// Calls take `&mut self`, so a session never has two invocations in flight.
#[async_trait]
pub trait AgentSession: Send {
    /// Human-readable endpoint, for diagnostics.
    fn endpoint(&self) -> &str;

    /// Invoke `tool_name` with `{message, history}` and wait for the result.
    async fn call_tool(
        &mut self,
        tool_name: &str,
        message: &str,
        history: &[Message],
    ) -> Result<ToolCallResult>;

    async fn list_tools(&mut self) -> Result<Vec<AgentToolInfo>>;

    /// Tear down the stream and session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions for configured agents.
#[async_trait]
pub trait AgentConnector: Send + Sync {
    async fn open(&self, agent: &AgentConfig) -> Result<Box<dyn AgentSession>>;
}

/// Connector speaking MCP over the agent's configured transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

#[async_trait]
impl AgentConnector for McpConnector {
    async fn open(&self, agent: &AgentConfig) -> Result<Box<dyn AgentSession>> {
        let endpoint = agent.endpoint.to_string();
        let transport = transport_for(agent)?;
        let mut session = McpAgentSession::new(endpoint, transport);
        session.initialize().await?;
        tracing::info!(agent = %agent.label, endpoint = %session.endpoint(), "MCP session initialized");
        Ok(Box::new(session))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Initialized,
    Closed,
}

/// MCP-backed [`AgentSession`].
pub struct McpAgentSession {
    endpoint: String,
    transport: Option<Box<dyn McpTransport>>,
    service: Option<McpRunningService>,
    state: SessionState,
}

impl McpAgentSession {
    pub fn new(endpoint: impl Into<String>, transport: Box<dyn McpTransport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: Some(transport),
            service: None,
            state: SessionState::Disconnected,
        }
    }

    /// Wrap an already-running rmcp service.
    ///
    /// The initialize handshake is whatever the caller's `serve(...)` did.
    pub fn from_running_service(endpoint: impl Into<String>, service: McpRunningService) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: None,
            service: Some(service),
            state: SessionState::Connected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == SessionState::Initialized
    }

    /// Connect (if needed) and mark the session ready for calls.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.state {
            SessionState::Initialized => return Ok(()),
            SessionState::Closed => return Err(self.closed_error("initialize")),
            SessionState::Disconnected | SessionState::Connected => {}
        }

        if let Some(service) = self.service.as_ref() {
            if service.is_closed() {
                self.service = None;
                self.state = SessionState::Closed;
                return Err(ParleyError::connection(
                    &self.endpoint,
                    "MCP session closed before initialization",
                ));
            }
        } else {
            let service = self.connect_with_protocol_fallback().await?;
            self.service = Some(service);
        }

        self.state = SessionState::Initialized;
        Ok(())
    }

    async fn connect_with_protocol_fallback(&mut self) -> Result<McpRunningService> {
        let endpoint = self.endpoint.clone();
        let transport = self.transport.as_mut().ok_or_else(|| {
            ParleyError::connection(&endpoint, "no transport to connect with")
        })?;

        let latest = rmcp::model::ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        match transport.connect(latest).await {
            Ok(service) => return Ok(service),
            Err(error) if should_retry_protocol_fallback(&error) => {
                tracing::debug!(endpoint = %endpoint, "agent rejected latest protocol, retrying with 2024-11-05");
            }
            Err(error) => return Err(map_client_initialize_error(&endpoint, error)),
        }

        let fallback = rmcp::model::ClientInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            ..Default::default()
        };
        transport
            .connect(fallback)
            .await
            .map_err(|error| map_client_initialize_error(&endpoint, error))
    }

    fn ensure_initialized(&self, context: &str) -> Result<()> {
        match self.state {
            SessionState::Initialized => Ok(()),
            SessionState::Closed => Err(self.closed_error(context)),
            _ => Err(ParleyError::UnsupportedOperation(
                "MCP session must be initialized first".into(),
            )),
        }
    }

    fn closed_error(&self, context: &str) -> ParleyError {
        ParleyError::transport(context, format!("MCP session to {} is closed", self.endpoint))
    }

    fn service_mut(&mut self, context: &str) -> Result<&mut McpRunningService> {
        let endpoint = &self.endpoint;
        self.service.as_mut().ok_or_else(|| {
            ParleyError::transport(context, format!("MCP session to {endpoint} is closed"))
        })
    }
}

#[async_trait]
impl AgentSession for McpAgentSession {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call_tool(
        &mut self,
        tool_name: &str,
        message: &str,
        history: &[Message],
    ) -> Result<ToolCallResult> {
        self.ensure_initialized("call_tool")?;
        let arguments = chat_arguments(message, history)?;
        let service = self.service_mut("call_tool")?;

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: tool_name.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        Ok(result.into())
    }

    async fn list_tools(&mut self) -> Result<Vec<AgentToolInfo>> {
        self.ensure_initialized("list_tools")?;
        let service = self.service_mut("list_tools")?;

        let tools = match service.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => service
                .list_tools(None)
                .await
                .map_err(|e| map_service_error("list_tools", e))?
                .tools,
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        Ok(tools
            .into_iter()
            .map(|tool| AgentToolInfo {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()),
            })
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.transport = None;
        if let Some(service) = self.service.take() {
            service
                .cancel()
                .await
                .map_err(|e| ParleyError::transport("close", e.to_string()))?;
        }
        Ok(())
    }
}

/// Wire arguments of the chat tool: `{message, history: [{role, content}]}`.
fn chat_arguments(message: &str, history: &[Message]) -> Result<JsonObject> {
    match json!({ "message": message, "history": serde_json::to_value(history)? }) {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ParleyError::InvalidState(format!(
            "chat arguments must be an object, got {other}"
        ))),
    }
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn map_client_initialize_error(endpoint: &str, error: ClientInitializeError) -> ParleyError {
    let message = match error {
        ClientInitializeError::ConnectionClosed(context) => {
            format!("connection closed during initialize: {context}")
        }
        ClientInitializeError::TransportError { error, context } => {
            format!("transport error ({context}): {error}")
        }
        ClientInitializeError::JsonRpcError(error) => format!(
            "initialize rejected with JSON-RPC error {}: {}",
            error.code.0, error.message
        ),
        ClientInitializeError::Cancelled => "initialize cancelled".to_string(),
        other => format!("initialize failed: {other}"),
    };
    ParleyError::connection(endpoint, message)
}

fn map_service_error(context: &str, error: ServiceError) -> ParleyError {
    match error {
        ServiceError::McpError(error) => ParleyError::transport(
            context,
            format!("MCP error {}: {}", error.code.0, error.message),
        ),
        ServiceError::TransportSend(error) => {
            ParleyError::transport(context, format!("send failed: {error}"))
        }
        ServiceError::TransportClosed => ParleyError::transport(context, "transport closed"),
        ServiceError::UnexpectedResponse => {
            ParleyError::transport(context, "unexpected MCP response")
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            ParleyError::transport(context, format!("request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => ParleyError::Timeout(timeout.as_millis() as u64),
        other => ParleyError::transport(context, format!("MCP service error: {other}")),
    }
}
