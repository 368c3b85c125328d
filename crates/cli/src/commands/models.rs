//! `officechat models`: List known and pulled models.

use crate::RunContext;
use crate::setup;
use officechat_config::MODEL_CATALOG;

pub async fn run(ctx: &RunContext) -> Result<(), Box<dyn std::error::Error>> {
    println!("Known models:");
    for model in MODEL_CATALOG {
        let marker = if *model == ctx.model { "*" } else { " " };
        println!("  {marker} {model}");
    }

    let provider = setup::ollama(&ctx.config);
    match provider.list_models().await {
        Ok(pulled) if pulled.is_empty() => {
            println!("\nNo models pulled on {}", ctx.config.ollama_host);
        }
        Ok(pulled) => {
            println!("\nPulled on {}:", ctx.config.ollama_host);
            for model in pulled {
                println!("    {model}");
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Could not list pulled models");
            println!("\n  ⚠️  Ollama not reachable at {}", ctx.config.ollama_host);
        }
    }

    Ok(())
}
