use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::config::ApiConfig;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: f32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: Some(1024),
            top_p: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set on `Role::Tool` messages
    pub tool_call_id: Option<String>,
    /// Set on assistant messages that requested tools
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Wire representation for the chat-completions endpoint
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "role": self.role.as_ref(),
            "content": self.content,
        });

        if let Some(ref id) = self.tool_call_id {
            value["tool_call_id"] = json!(id);
        }

        if !self.tool_calls.is_empty() {
            let calls: Vec<Value> = self
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            value["tool_calls"] = json!(calls);
        }

        value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl LLMResponse {
    /// Plain text response with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            model: String::new(),
            finish_reason: Some("stop".to_string()),
            tool_calls: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Lazy sequence of text deltas from a streamed completion
pub type TextStream = BoxStream<'static, Result<String, LLMError>>;

pub struct OpenAiLLM {
    client: Client,
    api_key: String,
    base_url: String,
    config: LLMConfig,
}

impl OpenAiLLM {
    pub fn new(config: &ApiConfig) -> Result<Self, LLMError> {
        Self::with_config(config, LLMConfig::default())
    }

    pub fn with_config(api: &ApiConfig, config: LLMConfig) -> Result<Self, LLMError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60)) // LLM calls can be slow
            .build()
            .map_err(|e| LLMError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api.openai_key().to_string(),
            base_url: api.base_url().to_string(),
            config,
        })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    fn build_payload(&self, messages: &[Message], tools: &[Value], stream: bool) -> Value {
        let messages_json: Vec<Value> = messages.iter().map(Message::to_json).collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_json,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "stream": stream
        });

        if let Some(max_tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        if !tools.is_empty() {
            payload["tools"] = json!(tools);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }

    async fn post(&self, payload: &Value) -> Result<reqwest::Response, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    /// Generate a completion with tools
    pub async fn complete_with_tools(
        &self,
        messages: Vec<Message>,
        tools: &[Value],
    ) -> Result<LLMResponse, LLMError> {
        let payload = self.build_payload(&messages, tools, false);
        let response = self.post(&payload).await?;
        let response_text = response.text().await?;
        parse_response(&response_text, &self.config.model)
    }

    /// Stream a completion as text deltas.
    ///
    /// The request is sent eagerly; the returned stream yields each `delta.content`
    /// fragment as it arrives and ends at `[DONE]` or end of body.
    pub async fn complete_stream(&self, messages: Vec<Message>) -> Result<TextStream, LLMError> {
        let payload = self.build_payload(&messages, &[], true);
        let response = self.post(&payload).await?;

        let byte_stream = response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));
        let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));

        let stream = async_stream::stream! {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_sse_line(&line) {
                        SseLine::Delta(text) => yield Ok(text),
                        SseLine::Done => break,
                        SseLine::Skip => {}
                    },
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(LLMError::Stream(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Ask with system message
    pub async fn ask_with_system(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LLMError> {
        let messages = vec![Message::system(system_prompt), Message::user(user_prompt)];
        let response = self.complete_with_tools(messages, &[]).await?;
        Ok(response.content)
    }
}

/// Parse the JSON body of a non-streaming chat completion
pub fn parse_response(response_text: &str, default_model: &str) -> Result<LLMResponse, LLMError> {
    let json: Value = serde_json::from_str(response_text)
        .map_err(|e| LLMError::ParseError(format!("Invalid JSON: {}", e)))?;

    let choices = json["choices"]
        .as_array()
        .ok_or_else(|| LLMError::ParseError("Missing 'choices' field".to_string()))?;

    let first_choice = choices
        .first()
        .ok_or_else(|| LLMError::ParseError("Empty choices array".to_string()))?;
    let message = &first_choice["message"];

    let content = message["content"]
        .as_str()
        .unwrap_or("") // Content can be null when tool calls are made
        .to_string();

    let finish_reason = first_choice["finish_reason"]
        .as_str()
        .map(|s| s.to_string());

    let model = json["model"].as_str().unwrap_or(default_model).to_string();

    let usage = json.get("usage").map(|usage_json| Usage {
        prompt_tokens: usage_json["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: usage_json["completion_tokens"].as_u64().unwrap_or(0) as u32,
        total_tokens: usage_json["total_tokens"].as_u64().unwrap_or(0) as u32,
    });

    let mut tool_calls = Vec::new();
    if let Some(tool_calls_array) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for tool_call_json in tool_calls_array {
            if let (Some(id), Some(name), Some(arguments)) = (
                tool_call_json["id"].as_str(),
                tool_call_json["function"]["name"].as_str(),
                tool_call_json["function"]["arguments"].as_str(),
            ) {
                let arguments: Value = if arguments.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(arguments).map_err(|e| {
                        LLMError::ParseError(format!("Invalid tool call arguments: {}", e))
                    })?
                };

                tool_calls.push(ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                });
            }
        }
    }

    Ok(LLMResponse {
        content,
        usage,
        model,
        finish_reason,
        tool_calls,
    })
}

#[derive(Debug, PartialEq)]
pub enum SseLine {
    Delta(String),
    Done,
    Skip,
}

/// Classify one line of a chat-completions SSE body
pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(json) = serde_json::from_str::<Value>(data) else {
        log::debug!("Ignoring malformed SSE payload: {}", data);
        return SseLine::Skip;
    };

    match json["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => SseLine::Delta(content.to_string()),
        _ => SseLine::Skip,
    }
}

#[async_trait::async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: &[Value],
    ) -> Result<LLMResponse, LLMError>;

    /// Streamed completion. Clients without streaming support yield the whole
    /// answer as a single chunk.
    async fn stream(&self, messages: Vec<Message>) -> Result<TextStream, LLMError> {
        let response = self.complete(messages, &[]).await?;
        Ok(Box::pin(futures_util::stream::once(async move {
            Ok(response.content)
        })))
    }
}

#[async_trait::async_trait]
impl LLMClient for OpenAiLLM {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: &[Value],
    ) -> Result<LLMResponse, LLMError> {
        self.complete_with_tools(messages, tools).await
    }

    async fn stream(&self, messages: Vec<Message>) -> Result<TextStream, LLMError> {
        self.complete_stream(messages).await
    }
}
