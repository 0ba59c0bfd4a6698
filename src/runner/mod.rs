//! Tool process runner
//!
//! Drives one invocation from stdin to stdout:
//! read (read deadline) -> parse -> validate -> execute (execution deadline)
//! -> release the connection pool -> write one envelope. The binary then
//! exits explicitly with [`terminate`].

pub mod state;
pub mod input;
pub mod deadline;
pub mod output;

pub use deadline::execute_with_deadline;
pub use input::{parse_request, read_request};
pub use output::write_all_chunked;
pub use state::{RunnerEvent, RunnerState, StateTracker};

use crate::config::{Config, Credentials};
use crate::errors::{Result, ToolError};
use crate::net::{ConnectionPool, PoolGuard};
use crate::tools::types::{Operation, OperationContext};
use crate::types::ResponseEnvelope;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// What one invocation produced
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    /// The envelope that was written
    pub envelope: ResponseEnvelope,
    /// Process exit status for this envelope
    pub exit_code: i32,
    /// Final state of the invocation
    pub state: RunnerState,
}

/// Runs a single operation behind the stdin/stdout protocol
pub struct ToolRunner<O: Operation> {
    op: Arc<O>,
    config: Config,
    credentials: Credentials,
}

impl<O: Operation> ToolRunner<O> {
    pub fn new(op: O, config: Config) -> Self {
        Self {
            op: Arc::new(op),
            config,
            credentials: Credentials::default(),
        }
    }

    /// Set the credentials captured at startup
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Run against the process's standard streams
    pub async fn run_stdio(&self) -> Result<InvocationOutcome> {
        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        self.run_with_io(&mut stdin, &mut stdout).await
    }

    /// Run with a connection pool built from the HTTP settings
    pub async fn run_with_io<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<InvocationOutcome>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        match ConnectionPool::new(&self.config.http) {
            Ok(pool) => self.run_with_pool(reader, writer, pool).await,
            Err(err) => write_failure(writer, err, self.config.runner.write_chunk_size).await,
        }
    }

    /// Run one invocation with an injected pool.
    ///
    /// The pool is closed before the envelope is written on every path.
    /// An `Err` means the envelope itself could not be written.
    pub async fn run_with_pool<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        pool: ConnectionPool,
    ) -> Result<InvocationOutcome>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("invocation", tool = self.op.name(), id = %invocation_id);
        self.run_inner(reader, writer, pool).instrument(span).await
    }

    async fn run_inner<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        pool: ConnectionPool,
    ) -> Result<InvocationOutcome>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut tracker = StateTracker::new();
        let guard = PoolGuard::new(pool);

        let phase = self.intake_and_execute(&mut tracker, reader, guard.pool()).await;
        let envelope = match phase {
            Ok(executed) => {
                tracker.apply(RunnerEvent::Finished)?;
                let was_open = guard.release();
                tracing::debug!(was_open, "connection pool closed");
                tracker.apply(RunnerEvent::Released)?;

                match executed.and_then(|output| ResponseEnvelope::from_output(&output)) {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        log_failure(&err);
                        ResponseEnvelope::failure(err)
                    }
                }
            }
            Err(err) => {
                drop(guard);
                tracker.apply(RunnerEvent::Abort)?;
                log_failure(&err);
                ResponseEnvelope::failure(err)
            }
        };

        write_envelope(&mut tracker, writer, envelope, self.config.runner.write_chunk_size).await
    }

    /// Read, parse, validate and execute. The outer `Err` is a failure
    /// before the operation started; the inner result is the operation's.
    async fn intake_and_execute<R>(
        &self,
        tracker: &mut StateTracker,
        reader: &mut R,
        pool: &ConnectionPool,
    ) -> std::result::Result<std::result::Result<O::Output, ToolError>, ToolError>
    where
        R: AsyncRead + Unpin,
    {
        let runner = &self.config.runner;

        tracker.apply(RunnerEvent::Begin)?;
        let raw = read_request(reader, runner.read_timeout()).await?;

        tracker.apply(RunnerEvent::InputCollected)?;
        let request = parse_request(&raw)?;

        tracker.apply(RunnerEvent::Parsed)?;
        let input = self.op.validate(&request)?;

        tracker.apply(RunnerEvent::Validated)?;
        let ctx = OperationContext::new(pool.clone(), CancellationToken::new())
            .with_credentials(self.credentials.clone())
            .with_openai(self.config.openai.clone());

        tracing::info!(exec_timeout_ms = runner.exec_timeout_ms, "executing");
        Ok(execute_with_deadline(self.op.clone(), input, ctx, runner.exec_timeout()).await)
    }
}

/// Write a failure envelope without running any operation.
///
/// Used when the invocation cannot even be set up, e.g. a bad config file.
pub async fn write_failure<W>(writer: &mut W, error: ToolError, chunk_size: usize) -> Result<InvocationOutcome>
where
    W: AsyncWrite + Unpin,
{
    let mut tracker = StateTracker::new();
    tracker.apply(RunnerEvent::Abort)?;
    log_failure(&error);
    write_envelope(&mut tracker, writer, ResponseEnvelope::failure(error), chunk_size).await
}

async fn write_envelope<W>(
    tracker: &mut StateTracker,
    writer: &mut W,
    mut envelope: ResponseEnvelope,
    chunk_size: usize,
) -> Result<InvocationOutcome>
where
    W: AsyncWrite + Unpin,
{
    let bytes = match envelope.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            envelope = ResponseEnvelope::failure(ToolError::unexpected(format!(
                "failed to serialize envelope: {}",
                e
            )));
            envelope.to_bytes()?
        }
    };

    write_all_chunked(writer, &bytes, chunk_size).await?;
    tracker.apply(RunnerEvent::Flushed)?;

    Ok(InvocationOutcome {
        exit_code: envelope.exit_status(),
        envelope,
        state: tracker.current(),
    })
}

fn log_failure(err: &ToolError) {
    if err.exit_status() == 0 {
        tracing::info!(code = %err.code, message = %err.message, "invocation failed");
    } else {
        tracing::error!(code = %err.code, message = %err.message, "invocation failed unexpectedly");
    }
}

/// Exit the process with the outcome's status.
///
/// Called only after the envelope has been flushed. The process does not
/// wait for the runtime to go idle: a stdin reader abandoned at the read
/// deadline would otherwise keep it alive.
pub fn terminate(outcome: &InvocationOutcome) -> ! {
    tracing::debug!(exit_code = outcome.exit_code, "exiting");
    std::process::exit(outcome.exit_code)
}
