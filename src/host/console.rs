use futures_util::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;

use super::{ChatRequest, LanguageModel, ShutdownHooks};
use crate::llm::{ChatContext, ConversationTemplates};

/// Text-only stand-in for the voice pipeline: one line in is one user turn,
/// streamed chunks are written out as they arrive.
pub struct ConsoleHost {
    model: Arc<dyn LanguageModel>,
    hooks: Arc<ShutdownHooks>,
    context: ChatContext,
    interrupt: CancellationToken,
}

impl ConsoleHost {
    pub fn new(model: Arc<dyn LanguageModel>, context: ChatContext) -> Self {
        Self {
            model,
            hooks: Arc::new(ShutdownHooks::new()),
            context,
            interrupt: CancellationToken::new(),
        }
    }

    /// Registration point for teardown callbacks
    pub fn shutdown_hooks(&self) -> Arc<ShutdownHooks> {
        Arc::clone(&self.hooks)
    }

    /// Cancelling this token cancels the in-flight turn and ends the session
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    /// Run one turn and record both sides in the context
    pub async fn run_turn<W>(
        &mut self,
        text: &str,
        cancel: CancellationToken,
        out: &mut W,
    ) -> std::io::Result<String>
    where
        W: AsyncWrite + Unpin,
    {
        self.context.add_user_message(text);

        let model = Arc::clone(&self.model);
        let mut chunks = model.chat(ChatRequest::from_context(self.context.clone()), cancel);

        let mut reply = String::new();
        out.write_all("🤖 ".as_bytes()).await?;
        while let Some(chunk) = chunks.next().await {
            out.write_all(chunk.as_bytes()).await?;
            out.flush().await?;
            reply.push_str(&chunk);
        }
        out.write_all(b"\n").await?;

        if !reply.is_empty() {
            self.context.add_assistant_message(reply.clone());
        }
        Ok(reply)
    }

    /// Greet, then serve turns until input ends, `quit`, or interrupt.
    /// Shutdown hooks run on every exit path.
    pub async fn run<R, W>(&mut self, input: R, mut out: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.serve(input, &mut out).await;
        self.hooks.run_all().await;
        result
    }

    async fn serve<R, W>(&mut self, input: R, out: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let greeting = ConversationTemplates::greeting();
        out.write_all(format!("🤖 {}\n", greeting).as_bytes()).await?;
        self.context.add_assistant_message(greeting);

        let mut lines = LinesStream::new(input.lines());
        let interrupt = self.interrupt.clone();

        loop {
            let line = tokio::select! {
                biased;
                _ = interrupt.cancelled() => None,
                line = lines.next() => line,
            };
            let Some(line) = line.transpose()? else {
                break;
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if matches!(text, "quit" | "exit") {
                out.write_all(format!("🤖 {}\n", ConversationTemplates::goodbye()).as_bytes())
                    .await?;
                break;
            }

            let cancel = interrupt.child_token();
            self.run_turn(text, cancel, out).await?;

            if interrupt.is_cancelled() {
                log::info!("Interrupted, ending session");
                break;
            }
        }

        Ok(())
    }
}
