//! In-memory MCP server and scripted LLM shared by the integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

use voice_mcp_agent::llm::{LLMClient, LLMError, LLMResponse, Message, ToolCall};
use voice_mcp_agent::mcp::McpSession;

/// What the fake server does with one request
pub enum Reply {
    Result(Value),
    Error(i64, String),
    /// Never answer
    Silent,
    /// Drop the connection
    Hangup,
}

/// Start a fake MCP server on an in-memory pipe and return a session that has
/// completed the handshake with it.
///
/// The server answers `initialize` itself and hands every other request to
/// `handler`. The join handle resolves to the list of methods the server saw
/// (requests and notifications) once the client closes its side. A line that is
/// not valid JSON is recorded as `<invalid>`.
pub async fn fake_server<F>(name: &str, handler: F) -> (McpSession, JoinHandle<Vec<String>>)
where
    F: Fn(&str, &Value) -> Reply + Send + 'static,
{
    fake_server_with_buffer(name, 64 * 1024, handler).await
}

/// Like [`fake_server`], with a pipe that only holds `buffer` bytes
pub async fn fake_server_with_buffer<F>(
    name: &str,
    buffer: usize,
    handler: F,
) -> (McpSession, JoinHandle<Vec<String>>)
where
    F: Fn(&str, &Value) -> Reply + Send + 'static,
{
    let (client_io, server_io) = tokio::io::duplex(buffer);
    let (server_read, mut server_write) = tokio::io::split(server_io);
    let server_name = format!("fake-{}", name);

    let server = tokio::spawn(async move {
        let mut seen = Vec::new();
        let mut lines = BufReader::new(server_read).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let Ok(msg) = serde_json::from_str::<Value>(&line) else {
                seen.push(INVALID_LINE.to_string());
                continue;
            };
            let method = msg["method"].as_str().unwrap_or_default().to_string();
            if !method.is_empty() {
                seen.push(method.clone());
            }

            // Notifications and responses to our own requests need no answer
            let Some(id) = msg.get("id").cloned() else {
                continue;
            };
            if method.is_empty() {
                continue;
            }

            let reply = match method.as_str() {
                "initialize" => Reply::Result(initialize_result(&server_name)),
                _ => handler(&method, &msg["params"]),
            };
            let response = match reply {
                Reply::Result(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                Reply::Error(code, message) => {
                    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
                }
                Reply::Silent => continue,
                Reply::Hangup => break,
            };

            let mut frame = response.to_string();
            frame.push('\n');
            if server_write.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
        }

        seen
    });

    let session = McpSession::connect(name, client_io)
        .await
        .expect("handshake with fake server failed");
    (session, server)
}

/// Recorded by the fake server for a line it could not parse
pub const INVALID_LINE: &str = "<invalid>";

pub fn initialize_result(server_name: &str) -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {"tools": {}},
        "serverInfo": {"name": server_name, "version": "0.0.1"}
    })
}

/// Handler for a small messaging workspace with three tools.
///
/// `search_messages` never answers a search for "everything".
pub fn messaging_server(method: &str, params: &Value) -> Reply {
    match method {
        "tools/list" => Reply::Result(json!({
            "tools": [
                {
                    "name": "conversations_history",
                    "description": "Read recent messages in a channel",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"channel_id": {"type": "string"}},
                        "required": ["channel_id"]
                    }
                },
                {
                    "name": "channels_empty",
                    "description": "Always answers with nothing",
                    "inputSchema": {"type": "object", "properties": {}}
                },
                {
                    "name": "search_messages",
                    "description": "Search the whole workspace",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"query": {"type": "string"}},
                        "required": ["query"]
                    }
                }
            ]
        })),
        "tools/call" => match params["name"].as_str() {
            Some("conversations_history") => Reply::Result(json!({
                "content": [{
                    "type": "text",
                    "text": format!(
                        "U024BE7LH (alice) in {}: deploy finished at 1712345678.000100",
                        params["arguments"]["channel_id"].as_str().unwrap_or("?")
                    )
                }]
            })),
            Some("channels_empty") => Reply::Result(json!({"content": []})),
            Some("search_messages") => match params["arguments"]["query"].as_str() {
                Some("everything") => Reply::Silent,
                query => Reply::Result(json!({
                    "content": [{"type": "text", "text": format!("no hits for {:?}", query)}]
                })),
            },
            _ => Reply::Error(-32602, "Unknown tool".to_string()),
        },
        _ => Reply::Error(-32601, format!("Method not found: {}", method)),
    }
}

/// LLM that replays canned responses and records every request
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<Result<LLMResponse, LLMError>>>,
    pub requests: Mutex<Vec<(Vec<Message>, usize)>>,
}

impl ScriptedLLM {
    pub fn new(responses: Vec<Result<LLMResponse, LLMError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LLMClient for ScriptedLLM {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: &[Value],
    ) -> Result<LLMResponse, LLMError> {
        self.requests.lock().unwrap().push((messages, tools.len()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::Config("script exhausted".to_string())))
    }
}

pub fn tool_call_response(id: &str, name: &str, arguments: Value) -> LLMResponse {
    LLMResponse {
        content: String::new(),
        usage: None,
        model: "scripted".to_string(),
        finish_reason: Some("tool_calls".to_string()),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
    }
}
