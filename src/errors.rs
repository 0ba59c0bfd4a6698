//! Error types for the tool runner
//!
//! Two families live here:
//! - [`ToolError`]: the protocol-level error value written into the response
//!   envelope. Its [`ErrorCode`] is drawn from a closed set and decides the
//!   process exit status.
//! - [`RunnerError`] / [`TransportError`]: internal failures of the runner
//!   itself and of the caller-side invoker.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of error codes a tool may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request missing or carrying malformed required fields
    InputInvalid,

    /// Non-empty input that is not valid JSON
    ParseError,

    /// Network request could not be sent or completed
    FetchFailed,

    /// Remote endpoint answered with a status >= 400
    HttpError,

    /// Response body could not be decoded into the expected format
    DecodeFailed,

    /// Execution deadline elapsed and the operation was cancelled
    Timeout,

    /// Anything not raised as a recognized tool error
    Unexpected,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InputInvalid => "INPUT_INVALID",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::HttpError => "HTTP_ERROR",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Unexpected => "UNEXPECTED",
        }
    }

    /// Process exit status for an invocation that ended with this code.
    ///
    /// Classified errors are a normal outcome of a tool call and exit 0;
    /// only `UNEXPECTED` is reported as a crash.
    pub fn exit_status(&self) -> i32 {
        match self {
            ErrorCode::Unexpected => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error value carried by a failed response envelope
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn input_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputInvalid, message)
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FetchFailed, message)
    }

    /// `HTTP_ERROR` with the status in `details.status`
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::HttpError, message)
            .with_details(serde_json::json!({ "status": status }))
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeFailed, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unexpected, message)
    }

    /// Attach `{"cause": ...}` details from an underlying error
    pub fn caused_by(self, cause: impl fmt::Display) -> Self {
        self.with_details(serde_json::json!({ "cause": cause.to_string() }))
    }

    /// Exit status this error maps to
    pub fn exit_status(&self) -> i32 {
        self.code.exit_status()
    }
}

/// Internal errors of the runner itself
#[derive(Error, Debug)]
pub enum RunnerError {
    /// State machine transition errors
    #[error("Invalid state transition from {from:?} via {event}")]
    InvalidTransition { from: String, event: String },

    /// I/O errors on the standard streams
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

impl From<RunnerError> for ToolError {
    fn from(err: RunnerError) -> Self {
        ToolError::unexpected(err.to_string())
    }
}

/// Caller-side failures: the tool process did not produce a usable envelope
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to spawn tool process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error talking to tool process: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool process did not finish within {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("Tool process wrote no envelope (exit status {exit_code:?})")]
    MissingEnvelope { exit_code: Option<i32> },

    #[error("Tool process wrote a malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },
}
