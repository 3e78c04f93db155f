//! Agent executor - the think/act/observe state machine
//!
//! Drives the reasoning loop until the model finishes, the budget runs out,
//! or an unrecoverable error occurs. Recoverable conditions (malformed
//! output, unknown tool names) become scratchpad observations so the model
//! can self-correct on the next turn; only transport failures and
//! un-converted tool errors end the run early.
//!
//! Budget checks happen once per loop iteration, so a hang inside one tool
//! invocation or one model call cannot be cut short mid-flight.

use std::sync::Arc;
use std::time::Instant;

use crate::agent::cost::CostAccumulator;
use crate::agent::planner::AgentStepPlanner;
use crate::agent::prompt::PromptAssembler;
use crate::agent::scratchpad::Scratchpad;
use crate::agent::sink::{SinkEvent, StreamingSink};
use crate::core::{
    AgentAction, AgentDecision, AgentStep, CostRecord, ErgonError, ExecutionBudget,
    ExecutionResult, ParseReason, RunOutcome, ToolInput,
};
use crate::llm::CompletionClient;
use crate::tools::ToolRegistry;

/// Reserved pseudo-tool name for parse-error feedback steps
pub const EXCEPTION_TOOL: &str = "_exception";

/// Fixed answer produced when the budget runs out
pub const FALLBACK_ANSWER: &str = "Agent stopped: iteration or time budget exhausted.";

/// Caller-supplied handler turning a parse failure into feedback text
pub type ParseErrorHandler = Arc<dyn Fn(&ParseReason, &str) -> String + Send + Sync>;

/// What to do with a recoverable parse error
#[derive(Clone, Default)]
pub enum ParseErrorPolicy {
    /// Propagate it; no self-correction
    Raise,
    /// Feed a fixed string back to the model
    Fixed(String),
    /// Feed the parser's own reason back to the model
    #[default]
    Feedback,
    /// Feed back whatever the handler computes from (reason, raw text)
    Handler(ParseErrorHandler),
}

impl std::fmt::Debug for ParseErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorPolicy::Raise => write!(f, "ParseErrorPolicy::Raise"),
            ParseErrorPolicy::Fixed(s) => write!(f, "ParseErrorPolicy::Fixed({:?})", s),
            ParseErrorPolicy::Feedback => write!(f, "ParseErrorPolicy::Feedback"),
            ParseErrorPolicy::Handler(_) => write!(f, "ParseErrorPolicy::Handler(..)"),
        }
    }
}

/// A terminal failure, still carrying the partial trace and cost
///
/// The caller can persist and cost-account a failed run.
#[derive(Debug)]
pub struct ExecutionFailure {
    /// What went wrong
    pub error: ErgonError,
    /// Steps completed before the failure
    pub scratchpad: Vec<AgentStep>,
    /// Cost accumulated before the failure
    pub cost: CostRecord,
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ExecutionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// How one batch of actions left the loop
enum StepFlow {
    /// Keep looping
    Continue,
    /// A return_direct tool fired; its observation is the final answer
    ReturnDirect(String),
    /// Unrecoverable error
    Fail(ErgonError),
}

/// The core state machine driving one agent execution at a time
pub struct AgentExecutor {
    planner: AgentStepPlanner,
    registry: Arc<ToolRegistry>,
    policy: ParseErrorPolicy,
    sink: Option<Arc<dyn StreamingSink>>,
    streaming: bool,
}

impl AgentExecutor {
    /// Create an executor over a completion client and tool registry
    pub fn new(client: Arc<dyn CompletionClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            planner: AgentStepPlanner::new(client),
            registry,
            policy: ParseErrorPolicy::default(),
            sink: None,
            streaming: true,
        }
    }

    /// Replace the prompt assembler (preamble, trimming)
    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.planner = self.planner.with_assembler(assembler);
        self
    }

    /// Set the parse-error policy
    pub fn with_parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach a sink for status and token events
    pub fn with_sink(mut self, sink: Arc<dyn StreamingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Enable or disable the streaming completion path (on by default)
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    /// Run the loop until a finish decision, budget exhaustion, or failure
    ///
    /// Every exit path emits a closing `StreamingEnd` to an attached sink,
    /// exactly once, as the last event.
    pub async fn run(
        &self,
        question: &str,
        budget: ExecutionBudget,
    ) -> std::result::Result<ExecutionResult, ExecutionFailure> {
        let cost = CostAccumulator::new();
        let mut scratchpad = Scratchpad::new();
        let started = Instant::now();
        let mut iterations = 0usize;

        while budget.allows(iterations, started.elapsed()) {
            let stream_sink = if self.streaming {
                self.sink.as_deref()
            } else {
                None
            };

            let decision = self
                .planner
                .plan(&self.registry, &scratchpad, question, &cost, stream_sink)
                .await;
            iterations += 1;

            match decision {
                Err(ErgonError::Parse {
                    reason,
                    raw,
                    recoverable: true,
                }) if !matches!(self.policy, ParseErrorPolicy::Raise) => {
                    // Feed the correction back so the model can retry next turn
                    let feedback = self.parse_feedback(&reason, &raw);
                    scratchpad.push(AgentStep::new(
                        AgentAction::new(EXCEPTION_TOOL, ToolInput::Text(raw), ""),
                        feedback,
                    ));
                }
                Err(error) => return Err(self.fail(error, scratchpad, &cost)),
                Ok(AgentDecision::Finish(finish)) => {
                    if !finish.thought.is_empty() {
                        self.emit(SinkEvent::Thinking(finish.thought.clone()));
                    }
                    self.end_stream("stop");
                    return Ok(ExecutionResult {
                        final_answer: finish.answer().to_string(),
                        scratchpad: scratchpad.into_steps(),
                        cost: cost.total(),
                        outcome: RunOutcome::Finished,
                    });
                }
                Ok(AgentDecision::Act(actions)) => {
                    match self.run_actions(actions, &mut scratchpad).await {
                        StepFlow::Continue => {}
                        StepFlow::ReturnDirect(answer) => {
                            self.end_stream("stop");
                            return Ok(ExecutionResult {
                                final_answer: answer,
                                scratchpad: scratchpad.into_steps(),
                                cost: cost.total(),
                                outcome: RunOutcome::Finished,
                            });
                        }
                        StepFlow::Fail(error) => {
                            return Err(self.fail(error, scratchpad, &cost))
                        }
                    }
                }
            }
        }

        // Budget exhausted: fixed fallback answer, no further model calls
        self.end_stream("budget");
        Ok(ExecutionResult {
            final_answer: FALLBACK_ANSWER.to_string(),
            scratchpad: scratchpad.into_steps(),
            cost: cost.total(),
            outcome: RunOutcome::BudgetExceeded,
        })
    }

    /// Resolve and invoke each action in the order received
    async fn run_actions(
        &self,
        actions: Vec<AgentAction>,
        scratchpad: &mut Scratchpad,
    ) -> StepFlow {
        let multi = actions.len() > 1;

        for action in actions {
            if !action.thought.is_empty() {
                self.emit(SinkEvent::Thinking(action.thought.clone()));
            }

            let Some(tool) = self.registry.lookup(&action.tool) else {
                // Unknown tool names are never fatal
                let observation = self.invalid_tool_observation(&action.tool);
                scratchpad.push(AgentStep::new(action, observation));
                continue;
            };

            self.emit(SinkEvent::FetchingKnowledge);

            match tool.invoke(&action.input).await {
                Ok(outcome) => {
                    let direct = tool.return_direct();
                    let observation = outcome.observation.clone();
                    scratchpad.push(AgentStep::new(action, outcome.observation));

                    if direct {
                        if multi {
                            return StepFlow::Fail(ErgonError::Unsupported(
                                "return_direct tool in a multi-action step".to_string(),
                            ));
                        }
                        return StepFlow::ReturnDirect(observation);
                    }
                }
                Err(error) => {
                    // The tool failed to convert its own failure into an
                    // observation; that ends the run
                    let tool_name = action.tool.clone();
                    return StepFlow::Fail(match error {
                        e @ ErgonError::ToolExecution { .. } => e,
                        other => ErgonError::tool(tool_name, other.to_string()),
                    });
                }
            }
        }

        StepFlow::Continue
    }

    /// Feedback text for a recoverable parse error, per the configured policy
    fn parse_feedback(&self, reason: &ParseReason, raw: &str) -> String {
        match &self.policy {
            ParseErrorPolicy::Feedback => reason.to_string(),
            ParseErrorPolicy::Fixed(text) => text.clone(),
            ParseErrorPolicy::Handler(handler) => handler(reason, raw),
            // Raise never reaches here
            ParseErrorPolicy::Raise => reason.to_string(),
        }
    }

    /// Observation for a tool name absent from the registry
    fn invalid_tool_observation(&self, requested: &str) -> String {
        format!(
            "invalid tool '{}', available tools: {}",
            requested,
            self.registry.names().join(", ")
        )
    }

    fn fail(
        &self,
        error: ErgonError,
        scratchpad: Scratchpad,
        cost: &CostAccumulator,
    ) -> ExecutionFailure {
        self.emit(SinkEvent::Error(error.to_string()));
        self.end_stream("error");
        ExecutionFailure {
            error,
            scratchpad: scratchpad.into_steps(),
            cost: cost.total(),
        }
    }

    fn emit(&self, event: SinkEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }

    fn end_stream(&self, stop_reason: &str) {
        self.emit(SinkEvent::StreamingEnd(stop_reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Result, ToolOutcome, ToolParameter};
    use crate::llm::{Completion, CompletionStream};
    use crate::tools::Tool;
    use async_trait::async_trait;

    struct DirectTool;

    #[async_trait]
    impl Tool for DirectTool {
        fn name(&self) -> &str {
            "direct"
        }

        fn description(&self) -> &str {
            "answers directly"
        }

        fn parameters(&self) -> Vec<ToolParameter> {
            Vec::new()
        }

        fn return_direct(&self) -> bool {
            true
        }

        async fn invoke(&self, _input: &ToolInput) -> Result<ToolOutcome> {
            Ok(ToolOutcome::observation("the answer"))
        }
    }

    struct UnusedClient;

    #[async_trait]
    impl crate::llm::CompletionClient for UnusedClient {
        async fn invoke(&self, _prompt: &str, _stop: &[String]) -> Result<Completion> {
            Err(ErgonError::transport("unused"))
        }

        async fn stream(&self, _prompt: &str, _stop: &[String]) -> Result<CompletionStream> {
            Err(ErgonError::transport("unused"))
        }

        fn name(&self) -> &str {
            "unused"
        }
    }

    fn executor_with_direct_tool() -> AgentExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(DirectTool));
        AgentExecutor::new(Arc::new(UnusedClient), Arc::new(registry))
    }

    fn action(tool: &str) -> AgentAction {
        AgentAction::new(tool, ToolInput::Text(String::new()), "t")
    }

    #[tokio::test]
    async fn test_return_direct_single_action() {
        let executor = executor_with_direct_tool();
        let mut scratchpad = Scratchpad::new();

        let flow = executor
            .run_actions(vec![action("direct")], &mut scratchpad)
            .await;

        assert!(matches!(flow, StepFlow::ReturnDirect(ref a) if a == "the answer"));
        assert_eq!(scratchpad.len(), 1);
    }

    #[tokio::test]
    async fn test_return_direct_in_multi_action_step_is_unsupported() {
        let executor = executor_with_direct_tool();
        let mut scratchpad = Scratchpad::new();

        let flow = executor
            .run_actions(vec![action("direct"), action("direct")], &mut scratchpad)
            .await;

        assert!(matches!(flow, StepFlow::Fail(ErgonError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let executor = executor_with_direct_tool();
        let mut scratchpad = Scratchpad::new();

        let flow = executor
            .run_actions(vec![action("nope")], &mut scratchpad)
            .await;

        assert!(matches!(flow, StepFlow::Continue));
        assert_eq!(scratchpad.len(), 1);
        let observation = &scratchpad.steps()[0].observation;
        assert!(observation.contains("invalid tool 'nope'"));
        assert!(observation.contains("direct"));
    }
}
