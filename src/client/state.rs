//! Per-submission state machine.
//!
//! ```text
//! idle → connecting → awaiting_response → rendered       → closed
//!                                       ↘ error_rendered ↗
//! ```
//!
//! There is no recovery transition: a failed submission stays in the state
//! where it failed and a new submission is needed to retry.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    /// Request not yet started.
    Idle,
    /// Socket being opened.
    Connecting,
    /// Request sent, waiting for the reply frame.
    AwaitingResponse,
    /// A 200 reply was rendered.
    Rendered,
    /// A non-200 reply was rendered as a placeholder or raw dump.
    ErrorRendered,
    /// Socket closed after rendering.
    Closed,
}

impl QueryState {
    /// Returns `true` if `next` directly follows `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting)
                | (Self::Connecting, Self::AwaitingResponse)
                | (Self::AwaitingResponse, Self::Rendered | Self::ErrorRendered)
                | (Self::Rendered | Self::ErrorRendered, Self::Closed)
        )
    }

    /// Returns `true` once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the snake_case name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::AwaitingResponse => "awaiting_response",
            Self::Rendered => "rendered",
            Self::ErrorRendered => "error_rendered",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state visited so far.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: QueryState,
    history: Vec<QueryState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Starts a lifecycle in [`QueryState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: QueryState::Idle,
            history: vec![QueryState::Idle],
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> QueryState {
        self.state
    }

    /// Returns the visited states in order, current state last.
    #[must_use]
    pub fn history(&self) -> &[QueryState] {
        &self.history
    }

    /// Moves to `next` if the transition is legal.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn advance(&mut self, next: QueryState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = %self.state, to = %next, "illegal query state transition");
            return false;
        }
        tracing::debug!(from = %self.state, to = %next, "query state");
        self.state = next;
        self.history.push(next);
        true
    }
}
