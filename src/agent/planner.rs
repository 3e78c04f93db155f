//! Step planner - one planning call of the reasoning loop
//!
//! Assembles the prompt, invokes the completion client (streaming when a live
//! sink is attached), accounts usage, and parses the output into a decision.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::cost::CostAccumulator;
use crate::agent::parser::OutputParser;
use crate::agent::prompt::PromptAssembler;
use crate::agent::scratchpad::Scratchpad;
use crate::agent::sink::{SinkEvent, StreamingSink};
use crate::core::{AgentDecision, ErgonError, Result};
use crate::llm::{CompletionClient, CompletionEvent};
use crate::tools::ToolRegistry;

/// Produces the next decision from the scratchpad history
pub struct AgentStepPlanner {
    client: Arc<dyn CompletionClient>,
    assembler: PromptAssembler,
}

impl AgentStepPlanner {
    /// Create a planner with the default prompt assembler
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            assembler: PromptAssembler::new(),
        }
    }

    /// Replace the prompt assembler
    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Plan the next step
    ///
    /// With a sink attached the streaming path is used and every token is
    /// forwarded as it arrives; otherwise a blocking completion is made.
    pub async fn plan(
        &self,
        registry: &ToolRegistry,
        scratchpad: &Scratchpad,
        question: &str,
        cost: &CostAccumulator,
        sink: Option<&dyn StreamingSink>,
    ) -> Result<AgentDecision> {
        let prompt = self.assembler.render(registry, scratchpad, question);
        let stop = PromptAssembler::stop_sequences();

        let text = match sink {
            Some(sink) => self.complete_streaming(&prompt, &stop, cost, sink).await?,
            None => {
                let completion = self.client.invoke(&prompt, &stop).await?;
                if let Some(summary) = &completion.summary {
                    cost.add_summary(summary);
                }
                completion.text
            }
        };

        OutputParser::parse(&text)
    }

    /// Consume the token stream, forwarding fragments to the sink
    ///
    /// A transport error mid-stream aborts the call; if the partial text still
    /// parses (cleanly or to a recoverable parse error) the failure is
    /// downgraded to that outcome, otherwise it surfaces as-is.
    async fn complete_streaming(
        &self,
        prompt: &str,
        stop: &[String],
        cost: &CostAccumulator,
        sink: &dyn StreamingSink,
    ) -> Result<String> {
        let mut stream = self.client.stream(prompt, stop).await?;

        let mut text = String::new();
        let mut failure: Option<ErgonError> = None;

        while let Some(event) = stream.next().await {
            match event {
                Ok(CompletionEvent::Token(token)) => {
                    sink.emit(SinkEvent::Streaming(token.clone()));
                    text.push_str(&token);
                }
                Ok(CompletionEvent::Summary(summary)) => {
                    // The summary is the terminal signal
                    cost.add_summary(&summary);
                    break;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(error) = failure {
            return match OutputParser::parse(&text) {
                Ok(_) => Ok(text),
                Err(parse_err) if parse_err.is_recoverable_parse() => Err(parse_err),
                Err(_) => Err(error),
            };
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::sink::NullSink;
    use crate::core::AgentDecision;
    use crate::llm::{stream_from_events, Completion, CompletionStream, CompletionSummary};
    use async_trait::async_trait;

    /// Client whose stream dies after some tokens
    struct DyingClient {
        tokens: Vec<&'static str>,
    }

    #[async_trait]
    impl CompletionClient for DyingClient {
        async fn invoke(&self, _prompt: &str, _stop: &[String]) -> Result<Completion> {
            Err(ErgonError::transport("blocking path unused"))
        }

        async fn stream(&self, _prompt: &str, _stop: &[String]) -> Result<CompletionStream> {
            let mut events: Vec<Result<CompletionEvent>> = self
                .tokens
                .iter()
                .map(|t| Ok(CompletionEvent::Token((*t).to_string())))
                .collect();
            events.push(Err(ErgonError::transport("connection reset")));
            Ok(stream_from_events(events))
        }

        fn name(&self) -> &str {
            "dying"
        }
    }

    #[tokio::test]
    async fn test_partial_output_is_salvaged_when_parseable() {
        let client = Arc::new(DyingClient {
            tokens: vec![
                "<thought>t</thought>",
                "<action>search</action>",
                "<action-input>x</action-input>",
            ],
        });
        let planner = AgentStepPlanner::new(client);
        let cost = CostAccumulator::new();

        let decision = planner
            .plan(
                &ToolRegistry::new(),
                &Scratchpad::new(),
                "q",
                &cost,
                Some(&NullSink),
            )
            .await
            .unwrap();

        assert!(matches!(decision, AgentDecision::Act(_)));
        // The summary never arrived, so nothing was accounted
        assert_eq!(cost.total().input_tokens, 0);
    }

    #[tokio::test]
    async fn test_unparseable_partial_surfaces_transport_error() {
        // A truncated tag is not recoverable, so the transport failure wins
        let client = Arc::new(DyingClient {
            tokens: vec!["<thought>cut off mid-"],
        });
        let planner = AgentStepPlanner::new(client);
        let cost = CostAccumulator::new();

        let result = planner
            .plan(
                &ToolRegistry::new(),
                &Scratchpad::new(),
                "q",
                &cost,
                Some(&NullSink),
            )
            .await;

        assert!(matches!(result, Err(ErgonError::Transport(_))));
    }

    #[tokio::test]
    async fn test_incomplete_partial_becomes_recoverable_parse_error() {
        // A well-formed but incomplete triple is fed back for self-correction
        let client = Arc::new(DyingClient {
            tokens: vec!["<thought>t</thought>", "<action>search</action>"],
        });
        let planner = AgentStepPlanner::new(client);
        let cost = CostAccumulator::new();

        let result = planner
            .plan(
                &ToolRegistry::new(),
                &Scratchpad::new(),
                "q",
                &cost,
                Some(&NullSink),
            )
            .await;

        assert!(matches!(
            result,
            Err(ErgonError::Parse {
                recoverable: true,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_summary_is_accounted() {
        struct WellBehaved;

        #[async_trait]
        impl CompletionClient for WellBehaved {
            async fn invoke(&self, _prompt: &str, _stop: &[String]) -> Result<Completion> {
                Err(ErgonError::transport("blocking path unused"))
            }

            async fn stream(&self, _prompt: &str, _stop: &[String]) -> Result<CompletionStream> {
                Ok(stream_from_events(vec![
                    Ok(CompletionEvent::Token(
                        "<final-answer>hi</final-answer>".to_string(),
                    )),
                    Ok(CompletionEvent::Summary(CompletionSummary {
                        stop_reason: Some("stop".to_string()),
                        input_tokens: 20,
                        output_tokens: 10,
                        price: 0.5,
                    })),
                ]))
            }

            fn name(&self) -> &str {
                "well-behaved"
            }
        }

        let planner = AgentStepPlanner::new(Arc::new(WellBehaved));
        let cost = CostAccumulator::new();

        let decision = planner
            .plan(
                &ToolRegistry::new(),
                &Scratchpad::new(),
                "q",
                &cost,
                Some(&NullSink),
            )
            .await
            .unwrap();

        assert!(matches!(decision, AgentDecision::Finish(_)));
        assert_eq!(cost.total().input_tokens, 20);
        assert_eq!(cost.total().output_tokens, 10);
    }
}
