//! One-shot ask — process a single utterance and print the reply.

use anyhow::Result;
use vesper_agent::ReplyVia;
use vesper_config::AssistantConfig;

pub async fn run(message: &str) -> Result<()> {
    let config = AssistantConfig::load_or_default()?;
    let mut assistant = super::build_assistant(&config);

    let reply = assistant.handle(message).await;
    println!("{}", reply.text);

    if let Some(orchestration) = &reply.orchestration {
        tracing::debug!(
            iterations = orchestration.iterations,
            tokens_used = orchestration.tokens_used,
            failed_tools = ?orchestration.failed_tools,
            "Run stats"
        );
    } else {
        debug_assert_eq!(reply.via, ReplyVia::Dispatch);
    }

    Ok(())
}
