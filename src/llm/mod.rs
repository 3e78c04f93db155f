//! LLM module - completion backend integrations
//!
//! Provides the completion client abstraction with Ollama as the primary
//! backend.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{
    stream_from_events, Completion, CompletionClient, CompletionEvent, CompletionStream,
    CompletionSummary,
};
