//! `officechat chat`: The interactive office chat.

use crate::RunContext;
use crate::commands::doctor;
use crate::printer::{ChatPrinter, StreamPrinter, print_answer};
use crate::setup::{self, Office};
use officechat_agent::{Agent, DIRECT_SENDER};
use officechat_core::message::preview;
use officechat_office::OfficeChat;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info, warn};

const SYSTEM_SENDER: &str = "System";

/// One line of user input, interpreted.
#[derive(Debug, PartialEq, Eq)]
pub enum LoopCommand {
    Exit,
    Help,
    History,
    Ask { agent: String, question: String },
    AskUsage,
    Say(String),
    Empty,
}

/// Interpret one input line. Keywords are case-insensitive.
pub fn parse_line(line: &str) -> LoopCommand {
    let line = line.trim();
    let lower = line.to_lowercase();

    match lower.as_str() {
        "" => return LoopCommand::Empty,
        "exit" | "quit" => return LoopCommand::Exit,
        "help" => return LoopCommand::Help,
        "history" => return LoopCommand::History,
        "ask" => return LoopCommand::AskUsage,
        _ => {}
    }

    if lower.starts_with("ask ") {
        let mut parts = line.splitn(3, ' ');
        let _ = parts.next();
        let agent = parts.next().unwrap_or_default().trim();
        let question = parts.next().unwrap_or_default().trim();
        if agent.is_empty() || question.is_empty() {
            return LoopCommand::AskUsage;
        }
        return LoopCommand::Ask {
            agent: agent.to_string(),
            question: question.to_string(),
        };
    }

    LoopCommand::Say(line.to_string())
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("- exit: Exit the chat");
    println!("- help: Show this help message");
    println!("- history: Show the chat history");
    println!("- ask <agent_name> <question>: Ask a specific agent directly");
}

async fn print_history(chat: &OfficeChat) {
    println!("\n----- Chat History -----");
    for message in chat.history(None).await {
        println!("{}: {}", message.sender, message.content);
    }
    println!("------------------------");
}

/// Post to the whole office, bounded by `limit` when set.
///
/// Dropping the post on timeout cancels whatever chain of replies is still running.
async fn post_guarded(chat: &OfficeChat, content: &str, sender: &str, limit: Option<Duration>) {
    info!(sender = %sender, content = %preview(content), "Posting to office chat");
    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, chat.post(content, sender)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(seconds = limit.as_secs(), "Office replies timed out");
                println!("\n  ⚠️  Stopped waiting for replies after {}s", limit.as_secs());
                return;
            }
        },
        None => chat.post(content, sender).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error posting message to office chat");
        println!("\nError posting message: {e}");
    }
}

/// Whole-answer direct ask.
async fn ask_plain(agent: &Agent, question: &str) {
    match agent.ask(question).await {
        Ok(answer) => println!("{}: {answer}", agent.name()),
        Err(e) => {
            error!(agent = %agent.name(), error = %e, "Error in direct ask");
            println!("\nError asking {}: {e}", agent.name());
        }
    }
}

/// Streamed direct ask. Rendered locally like the plain ask, so the
/// answer never reaches the office chat.
async fn ask_streamed(agent: &Arc<Agent>, question: &str, out: &mut impl Write) {
    let events = agent.ask_streaming(question);
    match print_answer(agent.name(), events, out).await {
        Ok(None) => {}
        Ok(Some(message)) => {
            error!(agent = %agent.name(), error = %message, "Error in streamed direct ask");
            println!("\nError asking {}: {message}", agent.name());
        }
        Err(e) => warn!(error = %e, "Could not write the streamed answer"),
    }
}

pub async fn run(
    ctx: &RunContext,
    streaming: bool,
    publish_timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = setup::ollama(&ctx.config);
    if ctx.skip_check {
        info!("Skipping Ollama check");
    } else {
        println!("Checking Ollama at {}...", ctx.config.ollama_host);
        doctor::check_backend(provider.as_ref(), &ctx.config.ollama_host, &ctx.model).await?;
    }

    println!("Using model: {}", ctx.model);
    println!("Setting up the office environment...");
    let office = setup::build_office(&ctx.config, &ctx.model, provider).await?;

    office.chat.subscribe(Arc::new(ChatPrinter)).await;
    if streaming {
        office.chat.subscribe_streaming(Arc::new(StreamPrinter)).await;
    }

    let limit = publish_timeout
        .or(ctx.config.publish_timeout_secs)
        .map(Duration::from_secs);

    post_guarded(&office.chat, &ctx.config.welcome_message, SYSTEM_SENDER, limit).await;

    print_banner(&office, streaming);
    run_loop(&office, streaming, limit).await?;

    println!("Exiting the office chat. Goodbye!");
    Ok(())
}

fn print_banner(office: &Office, streaming: bool) {
    let mode = if streaming { " (Streaming Mode)" } else { "" };
    println!("\n===== Welcome to the Agent Office{mode} =====\n");
    println!("Agents available:");
    for agent in &office.agents {
        println!("- {} ({})", agent.name(), agent.role());
    }
    println!("\nEnter your messages to the office chat below.");
    println!("Type 'exit' to quit or 'help' for more commands.");
}

async fn run_loop(
    office: &Office,
    streaming: bool,
    limit: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        match parse_line(&line) {
            LoopCommand::Empty => {}
            LoopCommand::Exit => {
                info!("User exiting chat");
                break;
            }
            LoopCommand::Help => print_help(),
            LoopCommand::History => print_history(&office.chat).await,
            LoopCommand::AskUsage => println!("Usage: ask <agent_name> <question>"),
            LoopCommand::Ask { agent, question } => {
                let Some(agent) = office.find(&agent) else {
                    warn!(agent = %agent, "Agent not found");
                    println!(
                        "Agent '{agent}' not found. Available agents: {}",
                        office.names().join(", ")
                    );
                    continue;
                };
                info!(agent = %agent.name(), question = %preview(&question), "Asking agent directly");
                println!("\nAsking {}...", agent.name());
                if streaming {
                    ask_streamed(agent, &question, &mut std::io::stdout()).await;
                } else {
                    ask_plain(agent, &question).await;
                }
            }
            LoopCommand::Say(text) => {
                post_guarded(&office.chat, &text, DIRECT_SENDER, limit).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_ignore_case_and_whitespace() {
        assert_eq!(parse_line("  EXIT "), LoopCommand::Exit);
        assert_eq!(parse_line("Help"), LoopCommand::Help);
        assert_eq!(parse_line("history"), LoopCommand::History);
        assert_eq!(parse_line("   "), LoopCommand::Empty);
    }

    #[test]
    fn ask_splits_agent_and_question() {
        assert_eq!(
            parse_line("Ask roger what is our Q3 pipeline?"),
            LoopCommand::Ask {
                agent: "roger".into(),
                question: "what is our Q3 pipeline?".into(),
            }
        );
    }

    #[test]
    fn ask_without_question_shows_usage() {
        assert_eq!(parse_line("ask roger"), LoopCommand::AskUsage);
        assert_eq!(parse_line("ask"), LoopCommand::AskUsage);
    }

    #[test]
    fn anything_else_goes_to_the_office() {
        assert_eq!(
            parse_line("Who can help with pricing?"),
            LoopCommand::Say("Who can help with pricing?".into())
        );
        assert_eq!(parse_line("asking around"), LoopCommand::Say("asking around".into()));
    }

    #[tokio::test]
    async fn guard_gives_up_on_slow_chains() {
        use async_trait::async_trait;
        use officechat_core::message::ChatMessage;
        use officechat_office::Subscriber;

        struct Stuck;

        #[async_trait]
        impl Subscriber for Stuck {
            fn name(&self) -> &str {
                "stuck"
            }
            async fn on_message(&self, _message: &ChatMessage) -> officechat_core::Result<()> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let chat = OfficeChat::new();
        chat.subscribe(Arc::new(Stuck)).await;

        tokio::time::pause();
        post_guarded(&chat, "hello", DIRECT_SENDER, Some(Duration::from_secs(5))).await;

        // The message was committed before delivery began.
        let history = chat.history(None).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
    }

    #[tokio::test]
    async fn streamed_direct_ask_stays_off_the_bus() {
        use async_trait::async_trait;
        use officechat_config::AppConfig;
        use officechat_core::error::ProviderError;
        use officechat_core::provider::{Provider, ProviderRequest};

        struct Plain;

        #[async_trait]
        impl Provider for Plain {
            fn name(&self) -> &str {
                "plain"
            }
            async fn complete(&self, _request: ProviderRequest) -> Result<String, ProviderError> {
                Ok("Our Q3 pipeline is strong.".into())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            notes_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let office = setup::build_office(&config, "llama3", Arc::new(Plain))
            .await
            .unwrap();
        let roger = office.find("roger").unwrap();

        let mut out = Vec::new();
        ask_streamed(roger, "How is the pipeline?", &mut out).await;

        assert!(office.chat.history(None).await.is_empty());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Roger: Our Q3 pipeline is strong.\n"
        );
        for peer in office.agents.iter().filter(|a| a.name() != "Roger") {
            assert_eq!(peer.transcript().await.len(), 1);
        }
    }
}
