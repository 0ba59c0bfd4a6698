//! Tool layer
//!
//! - `types`: the `Operation` trait and its execution context
//! - `registry`: tool names and schema metadata
//! - `implementations`: scrape, summarize, translate, sentiment, resize

pub mod types;
pub mod registry;
pub mod implementations;

// Re-export commonly used types
pub use types::{Operation, OperationContext, ToolSchema};
pub use registry::{ToolKind, ToolRegistry};
