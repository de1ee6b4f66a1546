use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use voice_mcp_agent::{
    adapter::MessagingAdapter,
    config::load_config,
    host::{AssistantLLM, ConsoleHost, LanguageModel},
    llm::{ChatContext, LLMClient, LLMConfig, OpenAiLLM, SystemPrompts},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// MCP server config file; when set, answers go through the tool agent
    #[arg(long)]
    mcp_config: Option<PathBuf>,

    /// Chat model used for answers and speech rewrites
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,
}

fn build_llm(model: &str) -> voice_mcp_agent::Result<Arc<dyn LLMClient>> {
    let api_config = load_config()?;
    let config = LLMConfig {
        model: model.to_string(),
        ..LLMConfig::default()
    };
    Ok(Arc::new(OpenAiLLM::with_config(&api_config, config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    log::info!("🚀 Initializing voice-mcp-agent");

    let args = Args::parse();

    let llm = build_llm(&args.model).context("Failed to create LLM client")?;
    log::info!("🧠 LLM client ready ({})", args.model);

    let context =
        ChatContext::with_defaults().with_system_message(SystemPrompts::witty_voice_assistant());

    let mut host = match args.mcp_config {
        Some(path) => {
            let adapter = Arc::new(MessagingAdapter::new(&path, llm).await);
            let model: Arc<dyn LanguageModel> = adapter.clone();
            let host = ConsoleHost::new(model, context);
            host.shutdown_hooks()
                .register(move || async move { adapter.shutdown().await })
                .await;
            log::info!("🧰 Messaging adapter installed");
            host
        }
        None => {
            log::info!("💬 Plain assistant installed");
            ConsoleHost::new(Arc::new(AssistantLLM::new(llm)), context)
        }
    };

    let interrupt = host.interrupt_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Received Ctrl+C, shutting down...");
            interrupt.cancel();
        }
    });

    println!("🎧 Type a message and press Enter. Type 'quit' or press Ctrl+C to exit.");

    host.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("Console session failed")?;

    println!("👋 Goodbye!");
    Ok(())
}
