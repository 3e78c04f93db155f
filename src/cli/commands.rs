//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::cli::repl::Repl;
use crate::core::Result;

/// Result of parsing a command
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, repl: &mut Repl) -> Result<CommandResult> {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            repl.clear_history();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "models" => {
            let models = repl.list_models().await?;
            let output = format!(
                "Available models:\n{}\n\nCurrent: {}",
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                repl.config().model.completion
            );
            Ok(CommandResult::Handled(output))
        }

        "tools" => {
            let output = format!(
                "Registered tools:\n{}",
                repl.tool_names()
                    .iter()
                    .map(|t| format!("  - {}", t))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            Ok(CommandResult::Handled(output))
        }

        "cost" => {
            let cost = repl.total_cost();
            Ok(CommandResult::Handled(format!(
                "Session cost:\n  Input tokens:  {}\n  Output tokens: {}\n  Price:         {:.6}",
                cost.input_tokens, cost.output_tokens, cost.price
            )))
        }

        "set" => handle_set_command(args, repl),

        "status" => {
            let config = repl.config();
            let status = format!(
                "Ergon Status:\n\
                 ─────────────────────────────\n\
                 Model:          {}\n\
                 Backend:        {}\n\
                 Max iterations: {}\n\
                 Streaming:      {}\n\
                 History:        {} messages\n\
                 Debug:          {}",
                config.model.completion,
                config.ollama_url(),
                config
                    .agent
                    .max_iterations
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string()),
                if config.streaming.enabled { "on" } else { "off" },
                repl.conversation_length(),
                if config.agent.debug { "on" } else { "off" }
            );
            Ok(CommandResult::Handled(status))
        }

        "debug" => {
            let new_state = !repl.config().agent.debug;
            repl.config_mut().agent.debug = new_state;
            Ok(CommandResult::Handled(format!(
                "Debug mode: {}",
                if new_state { "ON" } else { "OFF" }
            )))
        }

        _ => {
            // Not a command, treat as normal input
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, repl: &mut Repl) -> Result<CommandResult> {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();

    if parts.is_empty() || parts[0].is_empty() {
        return Ok(CommandResult::Handled(
            "Usage: set <model|iterations|streaming> <value>\n\
             Examples:\n\
               set model qwen3:8b\n\
               set iterations 5\n\
               set streaming off"
                .to_string(),
        ));
    }

    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "model" => {
            if value.is_empty() {
                return Ok(CommandResult::Handled(format!(
                    "Current model: {}",
                    repl.config().model.completion
                )));
            }
            repl.set_model(value);
            Ok(CommandResult::Handled(format!("Model set to: {}", value)))
        }

        "iterations" => {
            if value == "unlimited" {
                repl.config_mut().agent.max_iterations = None;
                return Ok(CommandResult::Handled("Max iterations: unlimited".to_string()));
            }
            match value.parse::<usize>() {
                Ok(n) => {
                    repl.config_mut().agent.max_iterations = Some(n);
                    Ok(CommandResult::Handled(format!("Max iterations set to: {}", n)))
                }
                Err(_) => Ok(CommandResult::Handled(format!(
                    "Not a number: '{}'. Use an integer or 'unlimited'.",
                    value
                ))),
            }
        }

        "streaming" => {
            let enabled = matches!(value.to_lowercase().as_str(), "on" | "true" | "1" | "yes");
            repl.config_mut().set_streaming(enabled);
            Ok(CommandResult::Handled(format!(
                "Streaming: {}",
                if enabled { "ON" } else { "OFF" }
            )))
        }

        _ => Ok(CommandResult::Handled(format!(
            "Unknown setting: {}. Available: model, iterations, streaming",
            key
        ))),
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Ergon Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Ergon
  clear, reset     Clear conversation history
  status           Show current configuration
  models           List available backend models
  tools            List registered tools
  cost             Show accumulated session cost
  debug            Toggle debug mode

  set model <name>          Set the completion model
  set iterations <n>        Set the per-run iteration budget
  set streaming <on|off>    Enable/disable token streaming

Keyboard Shortcuts:
  Ctrl+C           Cancel current operation
  Ctrl+D           Exit Ergon
─────────────────────────────────────────────"#
        .to_string()
}
