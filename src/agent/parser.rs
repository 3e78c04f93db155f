//! Output parser - structured decisions from raw model text
//!
//! The model is instructed to answer in explicit open/close tags. Extraction
//! is tolerant of multi-line content between tags and intolerant of missing
//! tags; a final-answer marker always wins over action markers.

use crate::core::{AgentAction, AgentDecision, AgentFinish, ErgonError, ParseReason, Result, ToolInput};

/// Tag enclosing the reasoning text
pub const THOUGHT_TAG: &str = "thought";
/// Tag naming the tool to invoke
pub const ACTION_TAG: &str = "action";
/// Tag enclosing the tool input
pub const ACTION_INPUT_TAG: &str = "action-input";
/// Tag enclosing the closing thought of a final answer
pub const FINAL_THOUGHT_TAG: &str = "final-thought";
/// Tag enclosing the final answer
pub const FINAL_ANSWER_TAG: &str = "final-answer";
/// Tag the executor echoes observations back in
pub const OBSERVATION_TAG: &str = "observation";

/// Parses raw model output into an [`AgentDecision`]
pub struct OutputParser;

impl OutputParser {
    /// Parse raw model text
    ///
    /// Returns `Finish` whenever a final-answer marker is present, `Act` when
    /// the thought/action/action-input triple is complete, and a parse error
    /// naming the first missing marker otherwise.
    pub fn parse(raw: &str) -> Result<AgentDecision> {
        if raw.trim().is_empty() {
            return Err(ErgonError::parse(ParseReason::EmptyOutput, raw));
        }

        // Final answer takes priority over any action markers, even broken ones
        if let Some(answer) = extract_tag(raw, FINAL_ANSWER_TAG)? {
            let thought = extract_tag(raw, FINAL_THOUGHT_TAG)
                .ok()
                .flatten()
                .or_else(|| extract_tag(raw, THOUGHT_TAG).ok().flatten())
                .unwrap_or_default();
            return Ok(AgentDecision::Finish(AgentFinish::from_answer(
                answer, thought,
            )));
        }

        let thought = extract_tag(raw, THOUGHT_TAG)?
            .ok_or_else(|| ErgonError::parse(ParseReason::MissingThought, raw))?;
        let action = extract_tag(raw, ACTION_TAG)?
            .ok_or_else(|| ErgonError::parse(ParseReason::MissingAction, raw))?;
        let action_input = extract_tag(raw, ACTION_INPUT_TAG)?
            .ok_or_else(|| ErgonError::parse(ParseReason::MissingActionInput, raw))?;

        Ok(AgentDecision::Act(vec![AgentAction::new(
            action,
            ToolInput::parse(&action_input),
            thought,
        )]))
    }
}

/// Extract the trimmed content of the first `<tag>...</tag>` pair
///
/// `Ok(None)` when the opening tag is absent; an unclosed-tag parse error
/// when the opening tag has no matching close.
fn extract_tag(text: &str, tag: &str) -> Result<Option<String>> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let Some(start) = text.find(&open) else {
        return Ok(None);
    };
    let content_start = start + open.len();

    let Some(end) = text[content_start..].find(&close) else {
        return Err(ErgonError::parse(
            ParseReason::UnclosedTag(tag.to_string()),
            text,
        ));
    };

    Ok(Some(text[content_start..content_start + end].trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let raw = "<thought>I should search</thought>\n<action>search</action>\n<action-input>{\"q\":\"x\"}</action-input>";
        let decision = OutputParser::parse(raw).unwrap();

        let AgentDecision::Act(actions) = decision else {
            panic!("expected an action");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].tool, "search");
        assert_eq!(actions[0].thought, "I should search");
        assert_eq!(actions[0].input.get_str("q"), Some("x".to_string()));
    }

    #[test]
    fn test_parse_finish() {
        let raw = "<final-thought>done</final-thought>\n<final-answer>Hello</final-answer>";
        let decision = OutputParser::parse(raw).unwrap();

        let AgentDecision::Finish(finish) = decision else {
            panic!("expected a finish");
        };
        assert_eq!(finish.answer(), "Hello");
        assert_eq!(finish.thought, "done");
    }

    #[test]
    fn test_final_answer_wins_over_action() {
        let raw = "<thought>t</thought>\n<action>search</action>\n<action-input>x</action-input>\n<final-answer>42</final-answer>";
        let decision = OutputParser::parse(raw).unwrap();

        assert!(matches!(decision, AgentDecision::Finish(ref f) if f.answer() == "42"));
    }

    #[test]
    fn test_multiline_content() {
        let raw = "<thought>line one\nline two</thought>\n<action>search</action>\n<action-input>first\nsecond</action-input>";
        let decision = OutputParser::parse(raw).unwrap();

        let AgentDecision::Act(actions) = decision else {
            panic!("expected an action");
        };
        assert_eq!(actions[0].thought, "line one\nline two");
        assert_eq!(
            actions[0].input,
            ToolInput::Text("first\nsecond".to_string())
        );
    }

    #[test]
    fn test_missing_markers() {
        let cases = [
            ("<action>a</action><action-input>i</action-input>", ParseReason::MissingThought),
            ("<thought>t</thought><action-input>i</action-input>", ParseReason::MissingAction),
            ("<thought>t</thought><action>a</action>", ParseReason::MissingActionInput),
        ];

        for (raw, expected) in cases {
            match OutputParser::parse(raw) {
                Err(ErgonError::Parse {
                    reason, recoverable, ..
                }) => {
                    assert_eq!(reason, expected);
                    assert!(recoverable);
                }
                other => panic!("expected parse error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unclosed_tag_is_not_recoverable() {
        let raw = "<thought>never closed";
        match OutputParser::parse(raw) {
            Err(ErgonError::Parse {
                reason, recoverable, ..
            }) => {
                assert_eq!(reason, ParseReason::UnclosedTag("thought".to_string()));
                assert!(!recoverable);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_output() {
        match OutputParser::parse("   \n ") {
            Err(ErgonError::Parse { reason, .. }) => {
                assert_eq!(reason, ParseReason::EmptyOutput);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_surrounding_noise_is_ignored() {
        let raw = "Sure! Here is my reasoning.\n<thought>t</thought> noise <action>search</action> more <action-input>q</action-input> trailing";
        assert!(OutputParser::parse(raw).is_ok());
    }
}
