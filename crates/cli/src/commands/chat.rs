//! Interactive chat — terminal REPL over the assistant pipeline.

use anyhow::Result;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use vesper_agent::{ReplyVia, RunEvent};
use vesper_config::AssistantConfig;

pub async fn run() -> Result<()> {
    let config = AssistantConfig::load_or_default()?;
    let mut assistant = super::build_assistant(&config);

    println!("Vesper ready. Type a request, or 'quit' to exit.");

    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        let (tx, mut rx) = mpsc::channel::<RunEvent>(64);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    RunEvent::Thought { content } => println!("  · thinking: {content}"),
                    RunEvent::Action { tool_name, params } => {
                        println!("  · running {tool_name} {params}")
                    }
                    RunEvent::Observation { content, success } => {
                        let marker = if success { "✓" } else { "✗" };
                        println!("  · {marker} {content}")
                    }
                    _ => {}
                }
            }
        });

        let reply = assistant.handle_with_events(&line, Some(tx)).await;
        let _ = printer.await;

        let via = match reply.via {
            ReplyVia::Dispatch => "direct",
            ReplyVia::Agent => "agent",
        };
        println!("vesper ({via})> {}\n", reply.text);
    }

    println!("Bye.");
    Ok(())
}
