//! Voice assistant language model backed by an MCP tool agent.
//!
//! The voice pipeline host calls a [`host::LanguageModel`] once per turn. This
//! crate provides two of them: [`host::AssistantLLM`], which streams a plain chat
//! completion, and [`adapter::MessagingAdapter`], which routes the user's request
//! through a tool-using agent ([`tool_agent`]) talking to MCP servers ([`mcp`]) and
//! rewrites the answer for speech.

pub mod adapter;
pub mod config;
pub mod error;
pub mod host;
pub mod llm;
pub mod mcp;
pub mod tool_agent;

// Re-export common types
pub use adapter::{AdapterReply, MessagingAdapter};
pub use error::{AgentError, Result};
pub use host::{ChatRequest, LanguageModel};
