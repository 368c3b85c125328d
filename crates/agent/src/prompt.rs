//! Prompt rendering: persona system prompts and the per-turn tools description.

use officechat_config::AgentProfile;
use officechat_core::tool::ToolDefinition;

const RESPONSE_SHAPE: &str = r#"
To use a tool, respond with the following JSON schema:
{
  "tool": "tool_name",
  "parameters": {
    "param1": "value1",
    "param2": "value2"
  },
  "reasoning": "Your step-by-step reasoning for why this tool should be used"
}
"#;

/// Describe every tool and the required response shape.
///
/// Rendered fresh on every turn.
pub fn tools_prompt(definitions: &[ToolDefinition]) -> String {
    let mut out = String::from("You have access to the following tools:\n\n");
    for def in definitions {
        let params = serde_json::to_string_pretty(&def.parameters).unwrap_or_else(|_| "{}".into());
        out.push_str(&format!("Tool: {}\n", def.name));
        out.push_str(&format!("Description: {}\n", def.description));
        out.push_str(&format!("Parameters: {params}\n\n"));
    }
    out.push_str(RESPONSE_SHAPE);
    out
}

/// The first transcript entry for an agent built from `profile`.
pub fn system_prompt(profile: &AgentProfile) -> String {
    if let Some(custom) = &profile.system_prompt {
        return custom.clone();
    }

    let mut out = match &profile.specialty {
        Some(specialty) => format!("You are {}, {}.\n", profile.name, specialty),
        None => format!(
            "You are {}, who works in the {} department.\nYou have expertise in {} topics.\n",
            profile.name,
            profile.role,
            profile.role.to_lowercase()
        ),
    };
    out.push_str(
        "You are part of an office environment where multiple specialized agents collaborate.\n",
    );

    if profile.focus.is_empty() {
        out.push_str(
            "When you receive a message in the office chat, you should only respond if it relates to your expertise.\n",
        );
    } else {
        out.push_str("You should respond to questions about:\n");
        for topic in &profile.focus {
            out.push_str(&format!("- {topic}\n"));
        }
    }

    out.push_str(
        "\nMessages from System are announcements; use the no_response tool for them.\n\
         If a question is outside your domain of expertise, use the no_response tool.\n\
         Always think carefully about whether you should respond or not.\n",
    );
    out
}
