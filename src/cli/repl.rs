//! Interactive REPL for Ergon
//!
//! Provides the main user interaction loop: each input becomes one agent
//! execution, and the transcript plus cost lands in the conversation store.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::agent::{
    AgentExecutor, Conversation, ConversationStore, MemoryStore, PromptAssembler, StdoutSink,
    TrimStrategy,
};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, CostRecord, Result, RunOutcome};
use crate::llm::OllamaClient;
use crate::tools::ToolRegistry;

/// The user everything in a local session is stored under
const LOCAL_USER: &str = "local";

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    client: Arc<OllamaClient>,
    registry: Arc<ToolRegistry>,
    conversation: Conversation,
    store: MemoryStore,
}

impl Repl {
    /// Create a new REPL with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Self {
        let client = Arc::new(OllamaClient::from_config(&config));

        Self {
            config,
            client,
            registry: Arc::new(ToolRegistry::with_builtins()),
            conversation: Conversation::new("repl"),
            store: MemoryStore::new(),
        }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        // Check the backend before looping
        print!("Initializing...");
        io::stdout().flush()?;

        match self.client.is_model_available().await {
            Ok(true) => println!(" Ready!\n"),
            Ok(false) => {
                println!(
                    "\n\nModel '{}' not found. Run: ollama pull {}\n",
                    self.config.model.completion, self.config.model.completion
                );
                return Ok(());
            }
            Err(e) => {
                println!("\n\nInitialization error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, self).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Conversation cleared.\n");
                    continue;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                    continue;
                }
                Ok(CommandResult::Continue(question)) => {
                    self.process(&question).await;
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Run one agent execution for a user question
    async fn process(&mut self, question: &str) {
        self.conversation.add_user(question);

        let mut executor = AgentExecutor::new(
            Arc::clone(&self.client) as Arc<dyn crate::llm::CompletionClient>,
            Arc::clone(&self.registry),
        )
        .with_streaming(self.config.streaming.enabled);

        if self.config.streaming.enabled {
            executor = executor.with_sink(Arc::new(StdoutSink));
        }

        if let Some(n) = self.config.agent.trim_last {
            executor = executor.with_assembler(
                PromptAssembler::new().with_trim(TrimStrategy::LastN(n)),
            );
        }

        match executor.run(question, self.config.budget()).await {
            Ok(result) => {
                println!("\nAssistant:\n{}\n", result.final_answer);

                if result.outcome == RunOutcome::BudgetExceeded {
                    println!("(budget exhausted before a final answer)\n");
                }

                println!(
                    "[{} steps, {} in / {} out tokens, price {:.6}]\n",
                    result.scratchpad.len(),
                    result.cost.input_tokens,
                    result.cost.output_tokens,
                    result.cost.price
                );

                self.conversation.add_assistant(&result.final_answer);
                self.conversation.add_cost(&result.cost);
            }
            Err(failure) => {
                eprintln!("\nError: {}\n", failure);
                // Failed runs still cost money
                self.conversation.add_cost(&failure.cost);
            }
        }

        if let Err(e) = self.store.save(LOCAL_USER, &self.conversation).await {
            eprintln!("Warning: failed to save conversation: {}", e);
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Set the completion model and rebuild the client
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.set_model(model);
        self.client = Arc::new(OllamaClient::from_config(&self.config));
    }

    /// Clear conversation history
    pub fn clear_history(&mut self) {
        self.conversation = Conversation::new("repl");
    }

    /// Get conversation length
    pub fn conversation_length(&self) -> usize {
        self.conversation.len()
    }

    /// Total cost accumulated this session
    pub fn total_cost(&self) -> CostRecord {
        self.conversation.cost
    }

    /// Names of the registered tools
    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.client.list_models().await
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!(
            r#"
───────────────────────────────────────────────
  ergon - tool-using agent executor
───────────────────────────────────────────────"#
        );
        println!("Backend:  {}", self.config.ollama_url());
        println!("Model:    {}", self.config.model.completion);
        println!("Tools:    {}", self.registry.names().join(", "));
        println!();
        println!("Commands: help, status, models, tools, cost, exit");
        println!("───────────────────────────────────────────────");
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
