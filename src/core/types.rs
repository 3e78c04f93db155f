//! Shared types used across Ergon modules
//!
//! Contains agent decisions, scratchpad steps, tool metadata, budgets, and
//! cost records.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Input handed to a tool, as extracted from the model's `<action-input>` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolInput {
    /// Structured input (the block parsed as a JSON object)
    Json(serde_json::Value),
    /// Free-text input
    Text(String),
}

impl ToolInput {
    /// Parse a raw `<action-input>` block: JSON object if it parses, text otherwise
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) if value.is_object() => Self::Json(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Get a string field by key (JSON inputs only)
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self {
            Self::Json(value) => value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            Self::Text(_) => None,
        }
    }

    /// Get a boolean field by key (JSON inputs only)
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self {
            Self::Json(value) => value.get(key).and_then(|v| v.as_bool()),
            Self::Text(_) => None,
        }
    }

    /// The raw text of the input, for free-text tools and transcript rendering
    pub fn as_text(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for ToolInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A decision to invoke a named tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentAction {
    /// Name of the tool to invoke
    pub tool: String,
    /// Input for the tool
    pub input: ToolInput,
    /// The thought text that led to this action
    pub thought: String,
}

impl AgentAction {
    /// Create a new action
    pub fn new(tool: impl Into<String>, input: ToolInput, thought: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            input,
            thought: thought.into(),
        }
    }
}

/// A terminal decision carrying the final answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentFinish {
    /// Named output values; the answer lives under `output`
    pub outputs: HashMap<String, String>,
    /// The closing thought that led to this answer
    pub thought: String,
}

impl AgentFinish {
    /// Create a finish decision from a plain answer string
    pub fn from_answer(answer: impl Into<String>, thought: impl Into<String>) -> Self {
        let mut outputs = HashMap::new();
        outputs.insert("output".to_string(), answer.into());
        Self {
            outputs,
            thought: thought.into(),
        }
    }

    /// The final answer text
    pub fn answer(&self) -> &str {
        self.outputs.get("output").map(String::as_str).unwrap_or("")
    }
}

/// What the model decided to do next
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    /// Invoke tools, in the order given
    Act(Vec<AgentAction>),
    /// Stop with a final answer
    Finish(AgentFinish),
}

/// One action paired with the observation it produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentStep {
    /// The action that was taken
    pub action: AgentAction,
    /// The observation returned by the tool (or synthesized by the executor)
    pub observation: String,
}

impl AgentStep {
    /// Create a new step
    pub fn new(action: AgentAction, observation: impl Into<String>) -> Self {
        Self {
            action,
            observation: observation.into(),
        }
    }
}

/// Declared parameter of a tool, rendered into the prompt catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter type (string, number, boolean, ...)
    pub kind: String,
    /// What the parameter means
    pub description: String,
    /// Whether the model must supply it
    pub required: bool,
}

impl ToolParameter {
    /// Create a required parameter
    pub fn required(
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: true,
        }
    }

    /// Create an optional parameter
    pub fn optional(
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Result of invoking a tool
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Human-readable observation fed back to the model
    pub observation: String,
    /// Optional structured data for the caller (e.g. which chunks were used)
    pub data: Option<serde_json::Value>,
}

impl ToolOutcome {
    /// Create a plain observation
    pub fn observation(text: impl Into<String>) -> Self {
        Self {
            observation: text.into(),
            data: None,
        }
    }

    /// Create an observation with auxiliary structured data
    pub fn with_data(text: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            observation: text.into(),
            data: Some(data),
        }
    }
}

/// Iteration and wall-clock bounds for one execution
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionBudget {
    /// Maximum planning iterations, unlimited when None
    pub max_iterations: Option<usize>,
    /// Maximum wall-clock time, unlimited when None
    pub max_wall_time: Option<Duration>,
}

impl ExecutionBudget {
    /// A budget with no bounds
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Bound by iteration count only
    pub fn with_iterations(max: usize) -> Self {
        Self {
            max_iterations: Some(max),
            max_wall_time: None,
        }
    }

    /// Add a wall-clock bound
    pub fn and_wall_time(mut self, max: Duration) -> Self {
        self.max_wall_time = Some(max);
        self
    }

    /// Whether the loop may run another iteration
    ///
    /// Continues iff `max_iterations` is unset or not yet reached, AND
    /// `max_wall_time` is unset or not yet elapsed.
    pub fn allows(&self, iterations: usize, elapsed: Duration) -> bool {
        let iterations_ok = self.max_iterations.map_or(true, |max| iterations < max);
        let time_ok = self.max_wall_time.map_or(true, |max| elapsed < max);
        iterations_ok && time_ok
    }
}

/// Token counts and price accumulated across the model calls of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Prompt tokens consumed
    pub input_tokens: u64,
    /// Completion tokens produced
    pub output_tokens: u64,
    /// Total price in the backend's currency
    pub price: f64,
}

impl CostRecord {
    /// Add another record into this one
    pub fn add(&mut self, other: &CostRecord) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.price += other.price;
    }
}

/// How a run reached its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a finish decision (or a return_direct tool fired)
    Finished,
    /// The iteration or wall-clock budget ran out
    BudgetExceeded,
}

/// Everything a completed run hands back to the caller
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The final answer text
    pub final_answer: String,
    /// The full (action, observation) trace in invocation order
    pub scratchpad: Vec<AgentStep>,
    /// Accumulated token counts and price
    pub cost: CostRecord,
    /// Whether the run finished or hit its budget
    pub outcome: RunOutcome,
}
