//! Request intake: read stdin under a deadline and decode one JSON object

use crate::errors::{Result, ToolError};
use crate::types::envelope::json_kind;
use crate::types::Request;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_BUF_CAPACITY: usize = 8 * 1024;

/// Read until EOF or until `timeout` elapses.
///
/// On deadline the bytes collected so far are returned; a caller that never
/// closes stdin still gets a response.
pub async fn read_request<R>(reader: &mut R, timeout: Duration) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_BUF_CAPACITY);

    let read_all = async {
        loop {
            buf.reserve(READ_BUF_CAPACITY);
            if reader.read_buf(&mut buf).await? == 0 {
                return Ok::<(), std::io::Error>(());
            }
        }
    };

    match tokio::time::timeout(timeout, read_all).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "stdin read deadline elapsed; using partial input"
            );
        }
    }

    tracing::debug!(bytes = buf.len(), "request read");
    Ok(buf)
}

/// Decode raw input into a request object.
///
/// Empty or whitespace-only input is `{}`. Invalid UTF-8 or JSON is
/// `PARSE_ERROR`; valid JSON that is not an object is `INPUT_INVALID`.
pub fn parse_request(raw: &[u8]) -> std::result::Result<Request, ToolError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ToolError::parse_error("Input is not valid UTF-8").caused_by(e))?;

    if text.trim().is_empty() {
        return Ok(Request::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::input_invalid(format!(
            "Request must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ToolError::parse_error("Malformed JSON input").caused_by(e)),
    }
}
