//! Language-model plug-point that answers through the tool agent.
//!
//! Each turn: resolve the user's text, send it to the secondary agent, have a
//! second LLM call rewrite the agent's answer for speech, and hand back one chunk.
//! Nothing in here returns an error to the host; every failure becomes one of the
//! fixed [`AdapterReply`] texts and is logged.

pub mod input;
pub mod reply;

pub use input::{resolve_user_text, USER_TEXT_PARAMS, USER_TEXT_STRATEGIES};
pub use reply::AdapterReply;

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::host::{ChatRequest, ChatStream, LanguageModel};
use crate::llm::{LLMClient, Message, SystemPrompts};
use crate::tool_agent::{AgentSession, SecondaryAgent, ToolAgentError};

/// Upper bound on reasoning/tool steps for one query
pub const MAX_AGENT_STEPS: usize = 30;

/// How long shutdown waits for the tool sessions to close
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MessagingAdapter {
    session: Mutex<Option<Arc<dyn SecondaryAgent>>>,
    rewriter: Arc<dyn LLMClient>,
}

impl MessagingAdapter {
    /// Build the adapter from a tool-server config file.
    ///
    /// Never fails: if the config is missing or a server cannot be started, the
    /// failure is logged and every later turn answers with the apology text.
    pub async fn new(config_path: impl AsRef<Path>, llm: Arc<dyn LLMClient>) -> Self {
        let config_path = config_path.as_ref();
        let session = match AgentSession::connect(config_path, Arc::clone(&llm)).await {
            Ok(session) => {
                log::info!("✅ Tool agent ready (config: {})", config_path.display());
                Some(Arc::new(session) as Arc<dyn SecondaryAgent>)
            }
            Err(e) => {
                log::error!(
                    "Failed to initialize tool agent from {}: {}",
                    config_path.display(),
                    e
                );
                None
            }
        };

        Self::with_session(session, llm)
    }

    pub fn with_session(
        session: Option<Arc<dyn SecondaryAgent>>,
        rewriter: Arc<dyn LLMClient>,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            rewriter,
        }
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Answer one turn
    pub async fn respond(&self, request: &ChatRequest, cancel: CancellationToken) -> AdapterReply {
        let Some(session) = self.session.lock().await.clone() else {
            log::warn!("Tool agent unavailable, answering with apology");
            return AdapterReply::NoSession;
        };

        let Some((source, user_text)) = resolve_user_text(request) else {
            log::warn!("No user text found in request");
            return AdapterReply::NotUnderstood;
        };
        log::info!("🗣️  User text (from {}): {}", source, user_text);

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("🛑 Query cancelled while the tool agent was running");
                return AdapterReply::QueryCancelled;
            }
            result = session.run(&user_text, MAX_AGENT_STEPS) => result,
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(ToolAgentError::ToolNoContent { tool }) => {
                log::error!("Tool '{}' returned no content for query '{}'", tool, user_text);
                return AdapterReply::ToolNoContent;
            }
            Err(e) => {
                log::error!("Tool agent failed for query '{}': {:?}", user_text, e);
                return AdapterReply::QueryFailed;
            }
        };

        let raw_text = match raw {
            Value::String(text) => text,
            other => {
                log::error!("Tool agent returned non-text result: {}", other);
                return AdapterReply::InternalError;
            }
        };
        log::debug!("Raw tool agent answer: {}", raw_text);

        let messages = vec![
            Message::system(SystemPrompts::speech_rewrite()),
            Message::user(SystemPrompts::speech_rewrite_input(&raw_text)),
        ];

        let rewritten = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("🛑 Query cancelled during speech rewrite");
                return AdapterReply::CleanupCancelled;
            }
            result = self.rewriter.complete(messages, &[]) => result,
        };

        match rewritten {
            Ok(response) => {
                log::info!("💬 Final response: {}", response.content);
                AdapterReply::Success(response.content)
            }
            Err(e) => {
                log::error!("Speech rewrite failed: {}", e);
                AdapterReply::CleanupFailed
            }
        }
    }

    /// Release the tool sessions. Safe to call any number of times; errors are
    /// only logged.
    pub async fn shutdown(&self) {
        let Some(session) = self.session.lock().await.take() else {
            log::debug!("No tool agent session to close");
            return;
        };

        log::info!("🔌 Closing tool agent sessions");
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, session.close_all_sessions()).await {
            Ok(Ok(())) => log::info!("✅ Tool agent sessions closed"),
            Ok(Err(e)) if e.is_benign_teardown() => {
                log::warn!("Tool session already gone during shutdown: {}", e)
            }
            Ok(Err(e)) => log::error!("Failed to close tool agent sessions: {}", e),
            Err(_) => log::warn!(
                "Timed out after {:?} closing tool agent sessions",
                SHUTDOWN_TIMEOUT
            ),
        }
    }
}

impl LanguageModel for MessagingAdapter {
    fn chat(&self, request: ChatRequest, cancel: CancellationToken) -> ChatStream<'_> {
        Box::pin(async_stream::stream! {
            let reply = self.respond(&request, cancel).await;
            yield reply.into_text();
        })
    }
}
