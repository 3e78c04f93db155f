//! Custom error types for Ergon
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Why the output parser could not extract a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    /// No `<thought>` tag in the model output
    MissingThought,
    /// No `<action>` tag in the model output
    MissingAction,
    /// No `<action-input>` tag in the model output
    MissingActionInput,
    /// The model produced no usable text at all
    EmptyOutput,
    /// An opening tag without its matching closing tag
    UnclosedTag(String),
}

impl ParseReason {
    /// Whether this condition can be fed back to the model for self-correction
    pub fn recoverable(&self) -> bool {
        !matches!(self, ParseReason::UnclosedTag(_))
    }
}

impl std::fmt::Display for ParseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseReason::MissingThought => write!(f, "missing thought"),
            ParseReason::MissingAction => write!(f, "missing action"),
            ParseReason::MissingActionInput => write!(f, "missing action input"),
            ParseReason::EmptyOutput => write!(f, "empty output"),
            ParseReason::UnclosedTag(tag) => write!(f, "unclosed <{}> tag", tag),
        }
    }
}

/// Main error type for Ergon operations
#[derive(Error, Debug)]
pub enum ErgonError {
    /// Model output that could not be parsed into a decision
    #[error("parse error: {reason}")]
    Parse {
        reason: ParseReason,
        raw: String,
        recoverable: bool,
    },

    /// Completion backend connection or API errors
    #[error("transport error: {0}")]
    Transport(String),

    /// A tool's internal failure that escaped un-converted
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A behavior the executor deliberately does not implement
    #[error("not implemented: {0}")]
    Unsupported(String),

    /// Model not available on the backend
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Ergon operations
pub type Result<T> = std::result::Result<T, ErgonError>;

impl ErgonError {
    /// Create a parse error; recoverability follows the reason
    pub fn parse(reason: ParseReason, raw: impl Into<String>) -> Self {
        let recoverable = reason.recoverable();
        Self::Parse {
            reason,
            raw: raw.into(),
            recoverable,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for parse errors the executor may resolve via scratchpad feedback
    pub fn is_recoverable_parse(&self) -> bool {
        matches!(
            self,
            ErgonError::Parse {
                recoverable: true,
                ..
            }
        )
    }
}
