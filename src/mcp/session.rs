use rmcp::model::{CallToolRequestParam, ClientInfo};
use rmcp::service::{Peer, QuitReason, RunningService};
use rmcp::transport::{IntoTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

use super::config::ServerConfig;
use super::protocol::{CallToolResult, McpTool};
use super::McpError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One initialized connection to one tool server.
///
/// Frames are written by the rmcp service task, so a caller that is dropped
/// mid-request never leaves a partial frame behind.
pub struct McpSession {
    name: String,
    server_name: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    request_timeout: Duration,
}

impl McpSession {
    /// Spawn the configured server process and complete the handshake over its stdio
    pub async fn connect_stdio(name: &str, config: &ServerConfig) -> Result<Self, McpError> {
        log::info!("🔌 Starting MCP server '{}': {} {:?}", name, config.command, config.args);

        let mut command = Command::new(&config.command);
        command.args(&config.args).envs(&config.env).kill_on_drop(true);

        let (transport, stderr) = TokioChildProcess::builder(command)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| McpError::Spawn {
                server: name.to_string(),
                source,
            })?;

        if let Some(stderr) = stderr {
            let server = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!("[{}] {}", server, line);
                }
            });
        }

        Self::connect(name, transport).await
    }

    /// Complete the handshake over any rmcp transport (child process, byte stream, ...)
    pub async fn connect<T, E, A>(name: &str, transport: T) -> Result<Self, McpError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut info = ClientInfo::default();
        info.client_info.name = env!("CARGO_PKG_NAME").to_string();
        info.client_info.version = env!("CARGO_PKG_VERSION").to_string();

        let handshake = tokio::time::timeout(DEFAULT_REQUEST_TIMEOUT, info.serve(transport));
        let service = match handshake.await {
            Ok(Ok(service)) => service,
            Ok(Err(e)) => {
                return Err(McpError::Initialize {
                    server: name.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(McpError::Timeout {
                    method: "initialize".to_string(),
                    timeout: DEFAULT_REQUEST_TIMEOUT,
                })
            }
        };

        let server_name = service
            .peer_info()
            .map(|info| info.server_info.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        log::info!("🤝 MCP session '{}' initialized (server: {})", name, server_name);

        Ok(Self {
            name: name.to_string(),
            server_name,
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name the server reported during the handshake
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// List every tool the server offers, following pagination cursors
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let tools = self.timed("tools/list", self.peer.list_all_tools()).await?;

        let tools = tools
            .into_iter()
            .map(McpTool::from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("MCP session '{}' offers {} tools", self.name, tools.len());
        Ok(tools)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(McpError::Protocol(format!(
                    "arguments for tool '{}' must be an object, got {}",
                    name, other
                )))
            }
        };

        log::info!("🔧 Calling tool '{}' on '{}'", name, self.name);
        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments,
        };
        let result = self.timed("tools/call", self.peer.call_tool(params)).await?;
        CallToolResult::from_wire(result)
    }

    async fn timed<T, F>(&self, method: &str, request: F) -> Result<T, McpError>
    where
        F: Future<Output = Result<T, rmcp::service::ServiceError>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(McpError::from),
            Err(_) => Err(McpError::Timeout {
                method: method.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }

    /// Stop the service task and release the transport. Closing an already
    /// closed session is a no-op.
    ///
    /// Returns `TransportClosed` when the server had already gone away.
    pub async fn close(&self) -> Result<(), McpError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        let reason = service.cancel().await.map_err(|e| {
            McpError::Protocol(format!("service task for '{}' failed: {}", self.name, e))
        })?;
        log::info!("🔌 MCP session '{}' closed", self.name);

        match reason {
            QuitReason::Cancelled => Ok(()),
            QuitReason::Closed => Err(McpError::TransportClosed(format!(
                "server '{}' exited before the session was closed",
                self.name
            ))),
            _ => Err(McpError::Protocol(format!(
                "service task for '{}' ended abnormally",
                self.name
            ))),
        }
    }
}
