//! `officechat doctor`: Diagnose the backend and configuration.

use crate::RunContext;
use crate::setup;
use officechat_core::provider::Provider;

/// Whether `model` is among the backend's pulled models.
///
/// Ollama reports untagged pulls as `<name>:latest`.
pub fn is_pulled(model: &str, pulled: &[String]) -> bool {
    pulled
        .iter()
        .any(|m| m == model || (!model.contains(':') && *m == format!("{model}:latest")))
}

/// Check that the backend answers and has `model`, printing one line per check.
///
/// Used by `doctor` and as the startup check of `chat` and `ask`.
pub async fn check_backend(
    provider: &dyn Provider,
    host: &str,
    model: &str,
) -> Result<(), String> {
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Ollama reachable at {host}"),
        Ok(false) => {
            println!("  ❌ Ollama at {host} did not answer");
            return Err(format!(
                "Ollama at {host} is not responding. Start it with `ollama serve`"
            ));
        }
        Err(e) => {
            println!("  ❌ Failed to connect to Ollama at {host}: {e}");
            return Err(format!(
                "Cannot reach Ollama at {host}. Start it with `ollama serve`"
            ));
        }
    }

    let pulled = provider
        .list_models()
        .await
        .map_err(|e| format!("Failed to list models: {e}"))?;
    println!("  ✅ {} model(s) pulled", pulled.len());

    if is_pulled(model, &pulled) {
        println!("  ✅ Model {model} available");
        Ok(())
    } else {
        println!("  ❌ Model {model} not found. Run: ollama pull {model}");
        Err(format!("Model {model} is not pulled"))
    }
}

async fn python_version(interpreter: &str) -> Option<String> {
    let output = tokio::process::Command::new(interpreter)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    // Older interpreters print the version to stderr.
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Some(String::from_utf8_lossy(&text).trim().to_string())
}

pub async fn run(ctx: &RunContext) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 officechat Doctor — System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;
    let config = &ctx.config;

    if ctx.config_path.exists() {
        println!("  ✅ Config file valid ({})", ctx.config_path.display());
    } else {
        println!(
            "  ⚠️  No config file at {}, using defaults",
            ctx.config_path.display()
        );
    }
    println!(
        "  ✅ {} agent(s) enabled",
        config.active_agents().count()
    );

    let provider = setup::ollama(config);
    if check_backend(provider.as_ref(), &config.ollama_host, &ctx.model)
        .await
        .is_err()
    {
        issues += 1;
    }

    if config.serpapi_api_key.is_some() {
        println!("  ✅ SerpAPI key configured");
    } else {
        println!("  ⚠️  No SerpAPI key, web_search disabled. Set SERPAPI_API_KEY");
        issues += 1;
    }

    match python_version(&config.python.interpreter).await {
        Some(version) => println!("  ✅ {version}"),
        None => {
            println!(
                "  ⚠️  Python interpreter '{}' not found, python_runner will fail",
                config.python.interpreter
            );
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
