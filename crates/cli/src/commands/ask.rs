//! `officechat ask`: One direct question to one agent.

use crate::RunContext;
use crate::commands::doctor;
use crate::printer::{ChatPrinter, print_answer};
use crate::setup;
use std::sync::Arc;

pub async fn run(
    ctx: &RunContext,
    agent_name: &str,
    question: &str,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = setup::ollama(&ctx.config);
    if !ctx.skip_check {
        doctor::check_backend(provider.as_ref(), &ctx.config.ollama_host, &ctx.model).await?;
    }

    let office = setup::build_office(&ctx.config, &ctx.model, provider).await?;
    // Broadcasts made through ask_office still show up.
    office.chat.subscribe(Arc::new(ChatPrinter)).await;

    let agent = office.find(agent_name).ok_or_else(|| {
        format!(
            "Agent '{agent_name}' not found. Available agents: {}",
            office.names().join(", ")
        )
    })?;

    if !stream {
        let answer = agent.ask(question).await?;
        println!("{}: {answer}", agent.name());
        return Ok(());
    }

    let events = agent.ask_streaming(question);
    match print_answer(agent.name(), events, &mut std::io::stdout()).await? {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}
