//! The contract between the voice pipeline host and its language model.
//!
//! The host calls [`LanguageModel::chat`] once per conversational turn and speaks
//! whatever text the returned stream yields. Teardown work is registered with
//! [`ShutdownHooks`] and run once when the session ends.

pub mod assistant;
pub mod console;

pub use assistant::AssistantLLM;
pub use console::ConsoleHost;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::{Map, Value};
use std::future::Future;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::llm::{ChatContext, Message};

/// Lazy sequence of speakable text chunks
pub type ChatStream<'a> = BoxStream<'a, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LLMCapabilities {
    pub chat: bool,
}

/// Everything the host hands over for one turn.
///
/// Hosts differ in how they pass the user's words: a structured context, a plain
/// history list, or loose named parameters. All three shapes are carried here.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub chat_ctx: Option<ChatContext>,
    pub history: Option<Vec<Message>>,
    pub params: Map<String, Value>,
}

impl ChatRequest {
    pub fn from_context(chat_ctx: ChatContext) -> Self {
        Self {
            chat_ctx: Some(chat_ctx),
            ..Self::default()
        }
    }

    pub fn from_history(history: Vec<Message>) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Language-model plug-point installed into the host
pub trait LanguageModel: Send + Sync {
    fn capabilities(&self) -> LLMCapabilities {
        LLMCapabilities { chat: true }
    }

    /// Produce the reply for one turn. Errors never escape; they become text.
    fn chat(&self, request: ChatRequest, cancel: CancellationToken) -> ChatStream<'_>;
}

type Hook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Zero-argument async callbacks run once at teardown, in registration order
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<Hook>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks
            .lock()
            .await
            .push(Box::new(move || Box::pin(hook())));
    }

    pub async fn len(&self) -> usize {
        self.hooks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.hooks.lock().await.is_empty()
    }

    /// Run and drop every registered hook. Later calls only run hooks
    /// registered since.
    pub async fn run_all(&self) {
        let hooks = std::mem::take(&mut *self.hooks.lock().await);
        log::info!("🧹 Running {} shutdown hook(s)", hooks.len());
        for hook in hooks {
            hook().await;
        }
    }
}
