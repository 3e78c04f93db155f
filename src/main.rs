//! Ergon - ReAct-style tool-using agent executor
//!
//! Main entry point for the CLI application.

use std::sync::Arc;

use clap::Parser;

use ergon::agent::StdoutSink;
use ergon::{AgentExecutor, CompletionClient, Config, OllamaClient, Repl, ToolRegistry};

/// Ergon - tool-using agent executor
#[derive(Parser, Debug)]
#[command(name = "ergon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Completion model
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Backend host
    #[arg(long)]
    host: Option<String>,

    /// Backend port
    #[arg(long)]
    port: Option<u16>,

    /// Maximum reasoning iterations per run
    #[arg(long, short = 'i')]
    max_iterations: Option<usize>,

    /// Maximum wall-clock seconds per run
    #[arg(long)]
    max_seconds: Option<f64>,

    /// Disable token streaming
    #[arg(long)]
    no_stream: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.model.completion = model.clone();
    }

    if let Some(ref host) = args.host {
        config.ollama.host = host.clone();
    }

    if let Some(port) = args.port {
        config.ollama.port = port;
    }

    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = Some(max);
    }

    if let Some(secs) = args.max_seconds {
        config.agent.max_wall_time_secs = Some(secs);
    }

    if args.no_stream {
        config.streaming.enabled = false;
    }

    if args.debug {
        config.agent.debug = true;
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let budget = config.budget();
        let client = Arc::new(OllamaClient::from_config(&config));
        let registry = Arc::new(ToolRegistry::with_builtins());

        let mut executor = AgentExecutor::new(client as Arc<dyn CompletionClient>, registry)
            .with_streaming(config.streaming.enabled);
        if config.streaming.enabled {
            executor = executor.with_sink(Arc::new(StdoutSink));
        }

        let result = executor.run(&prompt, budget).await?;
        println!("{}", result.final_answer);

        if config.agent.debug {
            eprintln!(
                "DEBUG: {} steps, {} in / {} out tokens, price {:.6}",
                result.scratchpad.len(),
                result.cost.input_tokens,
                result.cost.output_tokens,
                result.cost.price
            );
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    repl.run().await?;

    Ok(())
}
