//! MCP transports used to reach an agent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use tokio::process::Command;

use crate::config::{AgentConfig, AgentEndpoint};
use crate::error::{ParleyError, Result};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Establishes an initialized rmcp session with one agent.
#[async_trait]
pub trait McpTransport: Send {
    /// Open the stream and run the initialize handshake.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError>;
}

/// Build the transport matching an agent's configured endpoint.
pub fn transport_for(agent: &AgentConfig) -> Result<Box<dyn McpTransport>> {
    match &agent.endpoint {
        AgentEndpoint::Http { url } => {
            let mut transport = HttpTransport::new(url.clone());
            for (name, value) in &agent.headers {
                transport = transport.header(name.clone(), value.clone());
            }
            transport.http_client()?;
            Ok(Box::new(transport))
        }
        AgentEndpoint::Stdio { command, args } => {
            Ok(Box::new(StdioTransport::new(command.clone(), args.clone())))
        }
    }
}

/// Streamable-HTTP MCP transport (for remote agents).
pub struct HttpTransport {
    url: String,
    headers: BTreeMap<String, String>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ParleyError::Configuration(format!("invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ParleyError::Configuration(format!("invalid value for header '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ParleyError::Configuration(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError> {
        // Header errors normally surface earlier, in `transport_for`.
        let client = self.http_client().map_err(|e| {
            ClientInitializeError::ConnectionClosed(format!("HTTP client unavailable: {e}"))
        })?;
        let transport = StreamableHttpClientTransport::with_client(
            client,
            StreamableHttpClientTransportConfig::with_uri(self.url.clone()),
        );

        client_info.into_dyn().serve(transport).await
    }
}

/// Stdio-based MCP transport (for agents launched as child processes).
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
}

impl StdioTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError> {
        let mut command = Command::new(&self.command);
        command.args(&self.args);
        let transport = TokioChildProcess::new(command).map_err(|error| {
            ClientInitializeError::transport::<TokioChildProcess>(error, "spawn stdio transport")
        })?;

        client_info.into_dyn().serve(transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_rejects_invalid_header_names() {
        let transport = HttpTransport::new("http://127.0.0.1:1/mcp").header("bad header", "x");
        let err = transport.http_client().expect_err("space is not a valid header char");
        assert!(matches!(err, ParleyError::Configuration(m) if m.contains("bad header")));
    }

    #[test]
    fn http_client_accepts_custom_headers() {
        let transport = HttpTransport::new("http://127.0.0.1:1/mcp").header("x-agent", "bot-a");
        assert!(transport.http_client().is_ok());
        assert_eq!(transport.url(), "http://127.0.0.1:1/mcp");
    }

    #[test]
    fn stdio_constructor_keeps_command_and_args() {
        let transport = StdioTransport::new("python", vec!["bot_b.py".into(), "--port".into()]);
        assert_eq!(transport.command(), "python");
        assert_eq!(
            transport.args(),
            &["bot_b.py".to_string(), "--port".to_string()]
        );
    }
}
