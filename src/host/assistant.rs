use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{ChatRequest, ChatStream, LanguageModel};
use crate::adapter::{resolve_user_text, AdapterReply};
use crate::llm::{ConversationTemplates, LLMClient, Message, Role, SystemPrompts};

/// Plain assistant: streams the chat model's answer to the accumulated context
pub struct AssistantLLM {
    llm: Arc<dyn LLMClient>,
    system_prompt: String,
}

impl AssistantLLM {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            system_prompt: SystemPrompts::witty_voice_assistant().to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Messages to send for this turn, always led by a system message
    fn build_messages(&self, request: &ChatRequest) -> Option<Vec<Message>> {
        let mut messages = match (&request.chat_ctx, &request.history) {
            (Some(ctx), _) if !ctx.is_empty() => ctx.get_messages(),
            (_, Some(history)) if !history.is_empty() => history.clone(),
            _ => vec![Message::user(resolve_user_text(request)?.1)],
        };

        if messages.first().map(|msg| msg.role) != Some(Role::System) {
            messages.insert(0, Message::system(&self.system_prompt));
        }
        Some(messages)
    }
}

impl LanguageModel for AssistantLLM {
    fn chat(&self, request: ChatRequest, cancel: CancellationToken) -> ChatStream<'_> {
        Box::pin(async_stream::stream! {
            match self.build_messages(&request) {
                None => {
                    log::warn!("No user text found in request");
                    yield AdapterReply::NOT_UNDERSTOOD.to_string();
                }
                Some(messages) => {
                    let started = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.llm.stream(messages) => Some(result),
                    };

                    match started {
                        None => log::info!("🛑 Turn cancelled before the model answered"),
                        Some(Err(e)) => {
                            log::error!("Chat completion failed: {}", e);
                            yield ConversationTemplates::stream_interrupted().to_string();
                        }
                        Some(Ok(mut deltas)) => loop {
                            let item = tokio::select! {
                                biased;
                                _ = cancel.cancelled() => None,
                                item = deltas.next() => Some(item),
                            };

                            match item {
                                None => {
                                    log::info!("🛑 Turn cancelled mid-stream");
                                    break;
                                }
                                Some(None) => break,
                                Some(Some(Ok(text))) => {
                                    yield text;
                                }
                                Some(Some(Err(e))) => {
                                    log::error!("Chat stream failed: {}", e);
                                    yield ConversationTemplates::stream_interrupted().to_string();
                                    break;
                                }
                            }
                        },
                    }
                }
            }
        })
    }
}
