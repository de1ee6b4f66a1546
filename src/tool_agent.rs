//! Tool-using agent that answers a query by driving MCP tools with an LLM.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::llm::{LLMClient, LLMError, Message, SystemPrompts};
use crate::mcp::{McpClient, McpError, McpSession};

#[derive(Error, Debug)]
pub enum ToolAgentError {
    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),
    #[error("Tool '{tool}' returned no content")]
    ToolNoContent { tool: String },
    #[error("Agent stopped after reaching the maximum of {0} steps")]
    MaxStepsExceeded(usize),
}

/// The secondary agent as the adapter sees it
#[async_trait::async_trait]
pub trait SecondaryAgent: Send + Sync {
    /// Answer `query`, taking at most `max_steps` reasoning steps.
    /// The result is untyped; callers validate it.
    async fn run(&self, query: &str, max_steps: usize) -> Result<Value, ToolAgentError>;

    /// Release every open tool-server session
    async fn close_all_sessions(&self) -> Result<(), McpError>;
}

/// Tools offered across all sessions, with the session that owns each name
struct ToolCatalog {
    definitions: Vec<Value>,
    routes: HashMap<String, Arc<McpSession>>,
}

impl ToolCatalog {
    async fn collect(client: &McpClient) -> Result<Self, McpError> {
        let mut definitions = Vec::new();
        let mut routes = HashMap::new();

        for session in client.sessions().await {
            for tool in session.list_tools().await? {
                if routes.contains_key(&tool.name) {
                    log::warn!(
                        "Tool '{}' from '{}' shadows an earlier tool of that name, ignoring it",
                        tool.name,
                        session.name()
                    );
                    continue;
                }

                definitions.push(json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description.clone().unwrap_or_default(),
                        "parameters": tool.input_schema
                    }
                }));
                routes.insert(tool.name, Arc::clone(&session));
            }
        }

        log::info!("🧰 Tool catalog ready with {} tools", definitions.len());
        Ok(Self {
            definitions,
            routes,
        })
    }

    fn get_tool_definitions(&self) -> &[Value] {
        &self.definitions
    }
}

pub struct McpAgent {
    llm: Arc<dyn LLMClient>,
    client: Arc<McpClient>,
    system_prompt: String,
    catalog: OnceCell<ToolCatalog>,
}

impl McpAgent {
    pub fn new(llm: Arc<dyn LLMClient>, client: Arc<McpClient>) -> Self {
        Self {
            llm,
            client,
            system_prompt: SystemPrompts::messaging_agent().to_string(),
            catalog: OnceCell::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn catalog(&self) -> Result<&ToolCatalog, McpError> {
        self.catalog
            .get_or_try_init(|| ToolCatalog::collect(&self.client))
            .await
    }

    /// Reason/act loop: every LLM call is one step. The first answer without
    /// tool calls is the result.
    pub async fn run(&self, query: &str, max_steps: usize) -> Result<Value, ToolAgentError> {
        let catalog = self.catalog().await?;
        let mut messages = vec![Message::system(&self.system_prompt), Message::user(query)];

        for step in 1..=max_steps {
            let response = self
                .llm
                .complete(messages.clone(), catalog.get_tool_definitions())
                .await?;

            if response.tool_calls.is_empty() {
                log::info!("🤖 Agent answered after {} step(s)", step);
                return Ok(Value::String(response.content));
            }

            log::debug!(
                "Step {}: {} tool call(s) requested",
                step,
                response.tool_calls.len()
            );
            messages.push(Message::assistant_with_tools(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let Some(session) = catalog.routes.get(&call.name) else {
                    log::warn!("LLM requested unknown tool '{}'", call.name);
                    messages.push(Message::tool_result(
                        &call.id,
                        format!("Error: no tool named '{}' is available", call.name),
                    ));
                    continue;
                };

                let result = session.call_tool(&call.name, call.arguments.clone()).await?;
                if result.is_empty() {
                    return Err(ToolAgentError::ToolNoContent {
                        tool: call.name.clone(),
                    });
                }
                if result.is_error {
                    log::warn!("Tool '{}' reported an error: {}", call.name, result.text());
                }
                messages.push(Message::tool_result(&call.id, result.text()));
            }
        }

        Err(ToolAgentError::MaxStepsExceeded(max_steps))
    }
}

/// Tool client and agent, created together so neither exists without the other
pub struct AgentSession {
    client: Arc<McpClient>,
    agent: McpAgent,
}

impl AgentSession {
    /// Read the tool-server config, start every server and build the agent
    pub async fn connect(
        config_path: impl AsRef<Path>,
        llm: Arc<dyn LLMClient>,
    ) -> crate::Result<Self> {
        let client = Arc::new(McpClient::from_config_file(config_path)?);
        client.create_all_sessions().await?;
        Ok(Self::new(client, llm))
    }

    pub fn new(client: Arc<McpClient>, llm: Arc<dyn LLMClient>) -> Self {
        let agent = McpAgent::new(llm, Arc::clone(&client));
        Self { client, agent }
    }
}

#[async_trait::async_trait]
impl SecondaryAgent for AgentSession {
    async fn run(&self, query: &str, max_steps: usize) -> Result<Value, ToolAgentError> {
        self.agent.run(query, max_steps).await
    }

    async fn close_all_sessions(&self) -> Result<(), McpError> {
        self.client.close_all_sessions().await
    }
}
