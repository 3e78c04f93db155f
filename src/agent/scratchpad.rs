//! Scratchpad - the running (action, observation) transcript of one execution
//!
//! Append-only and owned by the run; order is the temporal order of tool
//! invocations. Trimming is a prompt-rendering concern only and never touches
//! the authoritative step list handed back to the caller.

use std::borrow::Cow;
use std::sync::Arc;

use crate::core::AgentStep;

/// Ordered transcript of past steps within one execution
#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    steps: Vec<AgentStep>,
}

impl Scratchpad {
    /// Create an empty scratchpad
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; order is never revisited
    pub fn push(&mut self, step: AgentStep) {
        self.steps.push(step);
    }

    /// The steps taken so far, in invocation order
    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    /// Number of steps taken
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Hand the steps to the caller at the end of a run
    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }
}

/// Caller-supplied trimming function
pub type TrimFn = Arc<dyn Fn(&[AgentStep]) -> Vec<AgentStep> + Send + Sync>;

/// How much of the scratchpad is rendered into the next prompt
#[derive(Clone, Default)]
pub enum TrimStrategy {
    /// Render every step
    #[default]
    None,
    /// Render only the last N steps
    LastN(usize),
    /// Caller-supplied trimming function
    Custom(TrimFn),
}

impl TrimStrategy {
    /// Apply the strategy to a step slice
    pub fn apply<'a>(&self, steps: &'a [AgentStep]) -> Cow<'a, [AgentStep]> {
        match self {
            TrimStrategy::None => Cow::Borrowed(steps),
            TrimStrategy::LastN(n) => {
                let start = steps.len().saturating_sub(*n);
                Cow::Borrowed(&steps[start..])
            }
            TrimStrategy::Custom(f) => Cow::Owned(f(steps)),
        }
    }
}

impl std::fmt::Debug for TrimStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrimStrategy::None => write!(f, "TrimStrategy::None"),
            TrimStrategy::LastN(n) => write!(f, "TrimStrategy::LastN({})", n),
            TrimStrategy::Custom(_) => write!(f, "TrimStrategy::Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgentAction, ToolInput};

    fn step(tool: &str, obs: &str) -> AgentStep {
        AgentStep::new(
            AgentAction::new(tool, ToolInput::Text(String::new()), "t"),
            obs,
        )
    }

    #[test]
    fn test_append_order() {
        let mut pad = Scratchpad::new();
        pad.push(step("a", "1"));
        pad.push(step("b", "2"));
        pad.push(step("c", "3"));

        let tools: Vec<&str> = pad.steps().iter().map(|s| s.action.tool.as_str()).collect();
        assert_eq!(tools, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trim_none() {
        let steps = vec![step("a", "1"), step("b", "2")];
        let trimmed = TrimStrategy::None.apply(&steps);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn test_trim_last_n() {
        let steps = vec![step("a", "1"), step("b", "2"), step("c", "3")];
        let trimmed = TrimStrategy::LastN(2).apply(&steps);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].action.tool, "b");

        // Larger than the list keeps everything
        let trimmed = TrimStrategy::LastN(10).apply(&steps);
        assert_eq!(trimmed.len(), 3);
    }

    #[test]
    fn test_trim_custom() {
        let steps = vec![step("a", "1"), step("b", "2")];
        let strategy = TrimStrategy::Custom(Arc::new(|steps: &[AgentStep]| {
            steps
                .iter()
                .filter(|s| s.action.tool != "a")
                .cloned()
                .collect()
        }));

        let trimmed = strategy.apply(&steps);
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].action.tool, "b");
    }
}
