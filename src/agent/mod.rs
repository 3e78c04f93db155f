//! Agent module - the reasoning loop and its collaborators
//!
//! Contains the executor state machine, the step planner, output parsing,
//! prompt assembly, the scratchpad, cost accounting, streaming sinks, and
//! the conversation store boundary.

pub mod cost;
pub mod executor;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod scratchpad;
pub mod sink;
pub mod store;

pub use cost::CostAccumulator;
pub use executor::{
    AgentExecutor, ExecutionFailure, ParseErrorPolicy, EXCEPTION_TOOL, FALLBACK_ANSWER,
};
pub use parser::OutputParser;
pub use planner::AgentStepPlanner;
pub use prompt::PromptAssembler;
pub use scratchpad::{Scratchpad, TrimStrategy};
pub use sink::{ChannelSink, NullSink, SinkEvent, StdoutSink, StreamingSink};
pub use store::{Conversation, ConversationStore, MemoryStore, StoredMessage};
