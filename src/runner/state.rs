//! Invocation state machine
//!
//! One invocation moves strictly forward through its phases:
//! Start, Reading, Parsing, Validating, Executing, Releasing, Writing, Exited.
//! Any phase before Writing may abort straight to Writing carrying an error
//! envelope. Releasing is entered even when execution failed or timed out.

use crate::errors::{Result, RunnerError};
use serde::{Deserialize, Serialize};

/// Invocation phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunnerState {
    /// Process started, nothing read yet
    Start,

    /// Collecting stdin under the read deadline
    Reading,

    /// Decoding the collected bytes into a request object
    Parsing,

    /// Operation-level input validation
    Validating,

    /// Operation running under the execution deadline
    Executing,

    /// Closing the connection pool
    Releasing,

    /// Writing the envelope
    Writing,

    /// Envelope flushed (terminal)
    Exited,
}

/// Events that drive the invocation forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    /// Begin reading stdin
    Begin,

    /// Input collected (EOF or read deadline)
    InputCollected,

    /// Request object decoded
    Parsed,

    /// Input validated
    Validated,

    /// Operation finished, failed or timed out
    Finished,

    /// Connection pool closed
    Released,

    /// Envelope flushed to stdout
    Flushed,

    /// Failure before execution; jump to writing an error envelope
    Abort,
}

impl RunnerState {
    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerState::Exited)
    }

    /// Attempt a transition
    ///
    /// Valid transitions:
    /// 1. Start      -> Reading    (Begin)
    /// 2. Reading    -> Parsing    (InputCollected)
    /// 3. Parsing    -> Validating (Parsed)
    /// 4. Validating -> Executing  (Validated)
    /// 5. Executing  -> Releasing  (Finished)
    /// 6. Releasing  -> Writing    (Released)
    /// 7. Writing    -> Exited     (Flushed)
    /// 8. Start..Releasing -> Writing (Abort)
    pub fn transition(&self, event: RunnerEvent) -> Result<RunnerState> {
        use RunnerEvent::*;
        use RunnerState::*;

        let next_state = match (self, event) {
            (Start, Begin) => Reading,
            (Reading, InputCollected) => Parsing,
            (Parsing, Parsed) => Validating,
            (Validating, Validated) => Executing,
            (Executing, Finished) => Releasing,
            (Releasing, Released) => Writing,
            (Writing, Flushed) => Exited,

            (Start | Reading | Parsing | Validating | Executing | Releasing, Abort) => Writing,

            (from, event) => {
                return Err(RunnerError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next_state)
    }

    /// Events accepted in this state
    pub fn valid_events(&self) -> Vec<RunnerEvent> {
        use RunnerEvent::*;
        use RunnerState::*;

        match self {
            Start => vec![Begin, Abort],
            Reading => vec![InputCollected, Abort],
            Parsing => vec![Parsed, Abort],
            Validating => vec![Validated, Abort],
            Executing => vec![Finished, Abort],
            Releasing => vec![Released, Abort],
            Writing => vec![Flushed],
            Exited => vec![],
        }
    }
}

/// Tracks the current phase of one invocation
#[derive(Debug)]
pub struct StateTracker {
    state: RunnerState,
    history: Vec<RunnerState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            state: RunnerState::Start,
            history: vec![RunnerState::Start],
        }
    }

    pub fn current(&self) -> RunnerState {
        self.state
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[RunnerState] {
        &self.history
    }

    /// Apply an event, logging the move
    pub fn apply(&mut self, event: RunnerEvent) -> Result<RunnerState> {
        let next = self.state.transition(event)?;
        tracing::trace!(from = ?self.state, to = ?next, ?event, "state transition");
        self.state = next;
        self.history.push(next);
        Ok(next)
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
