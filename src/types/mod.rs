//! Type definitions module
//!
//! Wire types shared by the runner and the caller-side invoker.

pub mod envelope;

// Re-export commonly used types
pub use envelope::{Request, ResponseEnvelope};
