//! Prompt assembler - renders the next prompt sent to the model
//!
//! Purely a rendering function: tool catalog, format instructions, the user
//! question, and the transcript so far. Deterministic given the same inputs,
//! no side effects.

use crate::agent::parser::{
    ACTION_INPUT_TAG, ACTION_TAG, FINAL_ANSWER_TAG, FINAL_THOUGHT_TAG, OBSERVATION_TAG,
    THOUGHT_TAG,
};
use crate::agent::scratchpad::{Scratchpad, TrimStrategy};
use crate::core::AgentStep;
use crate::tools::ToolRegistry;

/// Default opening instruction
const DEFAULT_PREAMBLE: &str =
    "You are an assistant that answers questions by reasoning step by step and \
     invoking tools when they help.";

/// Renders the tool catalog and transcript into the next prompt
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    preamble: String,
    trim: TrimStrategy,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptAssembler {
    /// Create an assembler with the default preamble and no trimming
    pub fn new() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            trim: TrimStrategy::None,
        }
    }

    /// Replace the opening instruction
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Set how much of the scratchpad is rendered
    pub fn with_trim(mut self, trim: TrimStrategy) -> Self {
        self.trim = trim;
        self
    }

    /// Stop sequences for the completion call
    ///
    /// Generation stops before the model invents its own observation.
    pub fn stop_sequences() -> Vec<String> {
        vec![format!("<{}>", OBSERVATION_TAG)]
    }

    /// Render the full prompt
    pub fn render(&self, registry: &ToolRegistry, scratchpad: &Scratchpad, question: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(&self.preamble);
        prompt.push_str("\n\nYou have access to the following tools:\n\n");
        prompt.push_str(&registry.render_catalog());
        prompt.push_str(&format_instructions());
        prompt.push_str(&format!("\nQuestion: {}\n", question));

        let steps = self.trim.apply(scratchpad.steps());
        if !steps.is_empty() {
            prompt.push('\n');
            prompt.push_str(&render_transcript(&steps));
        }

        prompt
    }
}

/// The response-format contract, phrased in the same tags the parser expects
fn format_instructions() -> String {
    format!(
        "\nAnswer in this exact format. Reason inside <{t}></{t}>, name one tool \
         inside <{a}></{a}>, give its input inside <{i}></{i}>, then stop and wait. \
         The result will be given to you inside <{o}></{o}>. When you know the \
         answer, reply with <{ft}></{ft}> followed by <{fa}></{fa}> instead of an \
         action.\n",
        t = THOUGHT_TAG,
        a = ACTION_TAG,
        i = ACTION_INPUT_TAG,
        o = OBSERVATION_TAG,
        ft = FINAL_THOUGHT_TAG,
        fa = FINAL_ANSWER_TAG,
    )
}

/// Render past steps in the same tag format the model produces
fn render_transcript(steps: &[AgentStep]) -> String {
    let mut output = String::new();

    for step in steps {
        output.push_str(&format!(
            "<{t}>{}</{t}>\n<{a}>{}</{a}>\n<{i}>{}</{i}>\n<{o}>{}</{o}>\n",
            step.action.thought,
            step.action.tool,
            step.action.input,
            step.observation,
            t = THOUGHT_TAG,
            a = ACTION_TAG,
            i = ACTION_INPUT_TAG,
            o = OBSERVATION_TAG,
        ));
    }

    output
}
