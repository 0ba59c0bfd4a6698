//! Network and resource layer
//!
//! - `pool`: closable connection pool owned by one invocation
//! - `fetch`: cancellable requests with status and body-size checks
//! - `openai`: chat-completions client used by the text tools

pub mod pool;
pub mod fetch;
pub mod openai;

// Re-export commonly used types
pub use pool::{ConnectionPool, PoolGuard};
pub use fetch::{Fetcher, BROWSER_HEADERS};
pub use openai::ChatClient;
