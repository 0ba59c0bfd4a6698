//! Execution deadline with cooperative cancellation
//!
//! The operation runs on its own task. When the deadline elapses the
//! cancellation token fires, the task is aborted and awaited, and the
//! invocation reports `TIMEOUT`. A panic inside the operation surfaces as
//! `UNEXPECTED` instead of tearing down the process.

use crate::errors::ToolError;
use crate::tools::types::{Operation, OperationContext};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;

/// Run `op.execute(input, ctx)` bounded by `timeout`
pub async fn execute_with_deadline<O: Operation>(
    op: Arc<O>,
    input: O::Input,
    ctx: OperationContext,
    timeout: Duration,
) -> Result<O::Output, ToolError> {
    let cancel = ctx.cancel.clone();
    let mut task = tokio::spawn(async move { op.execute(input, ctx).await });

    tokio::select! {
        joined = &mut task => joined.unwrap_or_else(|e| Err(join_error(e))),
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            task.abort();
            // Wait for the task to unwind so its network futures are dropped
            let _ = task.await;

            let timeout_ms = timeout.as_millis() as u64;
            tracing::warn!(timeout_ms, "execution deadline elapsed");
            Err(ToolError::timeout(format!("Operation timed out after {}ms", timeout_ms))
                .with_details(json!({ "timeout_ms": timeout_ms })))
        }
    }
}

fn join_error(err: JoinError) -> ToolError {
    if err.is_panic() {
        let message = panic_message(err.into_panic());
        tracing::error!(panic = %message, "operation panicked");
        ToolError::unexpected(message)
    } else {
        ToolError::unexpected("operation task was cancelled")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}
