//! Ergon - ReAct-style tool-using agent executor
//!
//! A control loop that lets a language model iteratively decide between
//! reasoning, invoking external tools, and finishing, while streaming
//! partial output and tracking cost.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion client abstraction with an Ollama implementation
//! - **Tools**: Tool capability, registry, and built-in tools
//! - **Agent**: Executor state machine, planner, parser, prompt assembly,
//!   scratchpad, cost accounting, sinks, and the conversation store
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ergon::{AgentExecutor, Config, ExecutionBudget, OllamaClient, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load();
//!     let client = Arc::new(OllamaClient::from_config(&config));
//!     let registry = Arc::new(ToolRegistry::with_builtins());
//!
//!     let executor = AgentExecutor::new(client, registry);
//!     let result = executor
//!         .run("What is (2 + 3) * 4?", ExecutionBudget::with_iterations(10))
//!         .await
//!         .unwrap();
//!     println!("{}", result.final_answer);
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{
    AgentExecutor, AgentStepPlanner, CostAccumulator, ExecutionFailure, OutputParser,
    ParseErrorPolicy, PromptAssembler, Scratchpad, SinkEvent, StreamingSink, TrimStrategy,
};
pub use cli::Repl;
pub use core::{
    Config, ErgonError, ExecutionBudget, ExecutionResult, ParseReason, Result, RunOutcome,
};
pub use llm::{CompletionClient, OllamaClient};
pub use tools::{Tool, ToolRegistry};
