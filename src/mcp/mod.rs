//! Model Context Protocol client side.
//!
//! Sessions run on the `rmcp` service loop over the stdio of the tool servers
//! listed in a JSON configuration file. Only tool listing and tool calls are
//! used; that is all the tool agent needs.

pub mod client;
pub mod config;
pub mod protocol;
pub mod session;

pub use client::McpClient;
pub use config::{McpConfig, ServerConfig};
pub use protocol::{CallToolResult, McpTool, ToolContent};
pub use session::McpSession;

use rmcp::service::ServiceError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("MCP config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Invalid MCP config: {0}")]
    InvalidConfig(String),
    #[error("Failed to start MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP handshake with '{server}' failed: {reason}")]
    Initialize { server: String, reason: String },
    #[error("MCP transport closed: {0}")]
    TransportClosed(String),
    #[error("MCP request '{method}' timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },
    #[error("MCP server returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("MCP protocol error: {0}")]
    Protocol(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// True for errors that only mean the peer went away first while we were
    /// tearing the session down. These are expected during shutdown races.
    pub fn is_benign_teardown(&self) -> bool {
        matches!(self, McpError::TransportClosed(_))
    }
}

impl From<ServiceError> for McpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::McpError(data) => McpError::Rpc {
                code: i64::from(data.code.0),
                message: data.message.to_string(),
            },
            ServiceError::TransportClosed => {
                McpError::TransportClosed("server connection is gone".to_string())
            }
            other => McpError::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::{ErrorCode, ErrorData};

    #[test]
    fn test_closed_transport_is_benign() {
        let err = McpError::from(ServiceError::TransportClosed);
        assert!(err.is_benign_teardown());
    }

    #[test]
    fn test_server_error_maps_to_rpc() {
        let data = ErrorData::new(ErrorCode(-32603), "internal", None);
        let err = McpError::from(ServiceError::McpError(data));

        assert!(!err.is_benign_teardown());
        assert_eq!(err.to_string(), "MCP server returned error -32603: internal");
    }

    #[test]
    fn test_timeout_names_method() {
        let err = McpError::Timeout {
            method: "tools/call".to_string(),
            timeout: Duration::from_millis(50),
        };
        assert!(!err.is_benign_teardown());
        assert_eq!(err.to_string(), "MCP request 'tools/call' timed out after 50ms");
    }
}
