//! Completion client trait for abstracting the model backend
//!
//! Enables swapping between Ollama and any other prompt-completion backend.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{CostRecord, Result};

/// Final usage metrics of one completion call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionSummary {
    /// Why generation stopped (stop sequence, length, ...)
    pub stop_reason: Option<String>,
    /// Prompt tokens consumed
    pub input_tokens: u64,
    /// Completion tokens produced
    pub output_tokens: u64,
    /// Price of this call
    pub price: f64,
}

impl CompletionSummary {
    /// View the summary as a cost record
    pub fn cost(&self) -> CostRecord {
        CostRecord {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            price: self.price,
        }
    }
}

/// One event of a streaming completion
///
/// A well-behaved stream yields zero or more `Token` events followed by
/// exactly one `Summary`, which is the unambiguous terminal signal.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
    /// A raw text fragment
    Token(String),
    /// The terminal event carrying final usage metrics
    Summary(CompletionSummary),
}

/// A blocking completion: full text plus usage metrics when available
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text
    pub text: String,
    /// Usage metrics, absent if the backend did not report them
    pub summary: Option<CompletionSummary>,
}

/// Type alias for a boxed stream of completion events
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent>> + Send>>;

/// Build a completion stream from a fixed event sequence
///
/// Useful for scripted backends in tests and for replaying transcripts.
pub fn stream_from_events(events: Vec<Result<CompletionEvent>>) -> CompletionStream {
    Box::pin(tokio_stream::iter(events))
}

/// Trait for completion backends
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion for a prompt, blocking until done
    async fn invoke(&self, prompt: &str, stop: &[String]) -> Result<Completion>;

    /// Generate a completion incrementally
    async fn stream(&self, prompt: &str, stop: &[String]) -> Result<CompletionStream>;

    /// Get the backend name
    fn name(&self) -> &str;
}
