//! Tools module - the tool capability and registry
//!
//! A tool is anything the agent can invoke with an input and observe the
//! result of. Implementations register in the [`ToolRegistry`] and describe
//! themselves for the prompt catalog.

pub mod builtin;
pub mod registry;

use async_trait::async_trait;

use crate::core::{Result, ToolInput, ToolOutcome, ToolParameter};

pub use registry::ToolRegistry;

/// Capability interface for agent tools
///
/// Expected failure modes (bad input, no results) must be converted into a
/// string observation by the tool itself; only truly exceptional conditions
/// should return an error, which aborts the run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry
    fn name(&self) -> &str;

    /// Free-text description rendered into the prompt catalog
    fn description(&self) -> &str;

    /// Ordered parameter declarations rendered into the prompt catalog
    fn parameters(&self) -> Vec<ToolParameter>;

    /// Whether this tool's observation becomes the final answer, skipping
    /// further reasoning
    fn return_direct(&self) -> bool {
        false
    }

    /// Invoke the tool
    async fn invoke(&self, input: &ToolInput) -> Result<ToolOutcome>;
}
