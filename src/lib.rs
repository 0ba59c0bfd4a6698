//! toolrunner - process-per-call JSON tools
//!
//! Each tool runs as its own short-lived process: it reads one JSON request
//! from stdin, runs its operation under a deadline, releases its network
//! resources and writes exactly one JSON envelope to stdout.
//!
//! # Architecture
//!
//! - **runner**: read/parse/validate/execute/release/write state machine
//! - **tools**: the `Operation` trait and the five tool implementations
//! - **net**: closable connection pool and cancellable HTTP requests
//! - **client**: caller-side invoker that spawns a tool process

pub mod errors;
pub mod types;
pub mod config;
pub mod net;
pub mod tools;
pub mod runner;
pub mod client;

// Ambient layers
pub mod cli;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{ErrorCode, Result, RunnerError, ToolError, TransportError};
pub use runner::{InvocationOutcome, ToolRunner};
pub use types::{Request, ResponseEnvelope};
