//! Streaming sink - incremental status events for UI feedback
//!
//! A sink receives an ordered event sequence during one execution. The
//! executor emits `StreamingEnd` exactly once per run, as the last event, on
//! every exit path, so consumer state never hangs.

use std::io::{self, Write};

use tokio::sync::mpsc;

/// One status event of a run
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// The model committed to a thought
    Thinking(String),
    /// A tool invocation is about to start
    FetchingKnowledge,
    /// A raw token fragment arrived from the model
    Streaming(String),
    /// The run is over; carries the stop reason ("stop", "budget", "error")
    StreamingEnd(String),
    /// Something went wrong; always followed by `StreamingEnd`
    Error(String),
}

/// Receives status events as they happen
pub trait StreamingSink: Send + Sync {
    /// Handle one event
    fn emit(&self, event: SinkEvent);
}

/// Sink that discards everything
pub struct NullSink;

impl StreamingSink for NullSink {
    fn emit(&self, _event: SinkEvent) {}
}

/// Sink that prints tokens to stdout as they arrive
pub struct StdoutSink;

impl StreamingSink for StdoutSink {
    fn emit(&self, event: SinkEvent) {
        match event {
            SinkEvent::Streaming(token) => {
                print!("{}", token);
                let _ = io::stdout().flush();
            }
            SinkEvent::StreamingEnd(_) => {
                println!();
            }
            SinkEvent::Error(reason) => {
                eprintln!("\nError: {}", reason);
            }
            SinkEvent::Thinking(_) | SinkEvent::FetchingKnowledge => {}
        }
    }
}

/// Sink that forwards events over a channel (e.g. to a websocket relay)
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    /// Create a sink forwarding into the given sender
    pub fn new(tx: mpsc::UnboundedSender<SinkEvent>) -> Self {
        Self { tx }
    }
}

impl StreamingSink for ChannelSink {
    fn emit(&self, event: SinkEvent) {
        // A closed receiver just means nobody is watching anymore
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);

        sink.emit(SinkEvent::Thinking("t".to_string()));
        sink.emit(SinkEvent::Streaming("tok".to_string()));
        sink.emit(SinkEvent::StreamingEnd("stop".to_string()));

        assert_eq!(rx.recv().await, Some(SinkEvent::Thinking("t".to_string())));
        assert_eq!(rx.recv().await, Some(SinkEvent::Streaming("tok".to_string())));
        assert_eq!(
            rx.recv().await,
            Some(SinkEvent::StreamingEnd("stop".to_string()))
        );
    }

    #[tokio::test]
    async fn test_channel_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let sink = ChannelSink::new(tx);
        sink.emit(SinkEvent::Streaming("tok".to_string()));
    }
}
