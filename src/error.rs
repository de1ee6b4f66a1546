use thiserror::Error;

/// Startup failures, wrapping the component that failed
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("LLM error: {0}")]
    LLM(#[from] crate::llm::LLMError),

    #[error("MCP error: {0}")]
    Mcp(#[from] crate::mcp::McpError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
