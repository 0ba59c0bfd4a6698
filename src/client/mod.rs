//! Caller-side invoker for tool processes

pub mod invoke;

pub use invoke::{parse_envelope, Invocation, ToolInvoker, DEFAULT_INVOKE_TIMEOUT};
