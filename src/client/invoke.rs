//! Caller side of the process protocol
//!
//! Spawns one tool process per call, writes the request, closes stdin and
//! collects everything the process prints until it exits.

use crate::errors::TransportError;
use crate::types::ResponseEnvelope;
use serde_json::Value;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default caller-side timeout
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one tool process run
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Envelope parsed from stdout
    pub envelope: ResponseEnvelope,
    /// Process exit status (None when killed by a signal)
    pub exit_code: Option<i32>,
    /// Diagnostics the tool wrote to stderr
    pub stderr: String,
}

/// Builder for invoking a tool binary
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            envs: Vec::new(),
            timeout: DEFAULT_INVOKE_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the tool once with `request` on its stdin
    pub async fn invoke(&self, request: &Value) -> Result<Invocation, TransportError> {
        let payload = serde_json::to_vec(request).map_err(|e| TransportError::MalformedEnvelope {
            reason: format!("request is not serializable: {}", e),
        })?;
        self.invoke_raw(payload).await
    }

    /// Run the tool once with raw bytes on its stdin
    pub async fn invoke_raw(&self, payload: Vec<u8>) -> Result<Invocation, TransportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransportError::Spawn)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "child stdin unavailable"))?;

        // Feed stdin concurrently so a chatty child cannot block on a full stdout pipe.
        let writer = tokio::spawn(async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        });

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                writer.abort();
                return Err(TransportError::TimedOut {
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        match writer.await {
            Ok(Ok(())) => {}
            // The tool may answer without reading all of its input.
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(e) => return Err(TransportError::Io(io::Error::new(io::ErrorKind::Other, e))),
        }

        let exit_code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::debug!(?exit_code, stdout_bytes = output.stdout.len(), "tool process exited");

        let envelope = parse_envelope(&output.stdout, exit_code)?;
        Ok(Invocation {
            envelope,
            exit_code,
            stderr,
        })
    }
}

/// Parse a tool's complete stdout as one envelope
pub fn parse_envelope(stdout: &[u8], exit_code: Option<i32>) -> Result<ResponseEnvelope, TransportError> {
    let text = std::str::from_utf8(stdout).map_err(|e| TransportError::MalformedEnvelope {
        reason: format!("stdout is not UTF-8: {}", e),
    })?;

    if text.trim().is_empty() {
        return Err(TransportError::MissingEnvelope { exit_code });
    }

    let value: Value = serde_json::from_str(text.trim()).map_err(|e| {
        TransportError::MalformedEnvelope {
            reason: e.to_string(),
        }
    })?;

    ResponseEnvelope::from_value(value).map_err(|reason| TransportError::MalformedEnvelope { reason })
}
