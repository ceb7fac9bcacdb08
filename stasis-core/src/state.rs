// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Capture state machine with typed state transitions.
//!
//! Implements the capture lifecycle: Idle → (PreDumping) → Dumping → Done | Failed.
//! There is no edge from a failed pre-dump to Dumping, so a full capture can
//! never follow a failed incremental pass.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;

/// Phases of one capture operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapturePhase {
    /// Nothing has been invoked yet.
    Idle,

    /// Memory-tracking pre-dump in progress.
    PreDumping,

    /// Full dump in progress.
    Dumping,

    /// Full dump succeeded.
    Done,

    /// A pass failed; the attempt is over.
    Failed,
}

impl CapturePhase {
    /// Get the phase name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::PreDumping => "PreDumping",
            Self::Dumping => "Dumping",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    /// Check if transition to the target phase is valid.
    pub fn can_transition_to(&self, target: CapturePhase) -> bool {
        matches!(
            (self, target),
            // From Idle
            (Self::Idle, Self::PreDumping) |
            (Self::Idle, Self::Dumping) |
            // From PreDumping
            (Self::PreDumping, Self::Dumping) |
            (Self::PreDumping, Self::Failed) |
            // From Dumping
            (Self::Dumping, Self::Done) |
            (Self::Dumping, Self::Failed)
        )
    }

    /// Terminal phases accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for a single capture attempt.
#[derive(Debug)]
pub struct CaptureStateMachine {
    current: CapturePhase,
    started: Instant,
    visited: Vec<CapturePhase>,
}

impl CaptureStateMachine {
    /// Create a state machine in the Idle phase.
    pub fn new() -> Self {
        Self {
            current: CapturePhase::Idle,
            started: Instant::now(),
            visited: vec![CapturePhase::Idle],
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> CapturePhase {
        self.current
    }

    /// Phases entered so far, in order.
    pub fn visited(&self) -> &[CapturePhase] {
        &self.visited
    }

    /// Time since the machine was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Attempt to transition to a new phase.
    pub fn transition_to(&mut self, target: CapturePhase) -> Result<(), StateTransitionError> {
        if !self.current.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.current.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            from = self.current.name(),
            to = target.name(),
            elapsed_ms = self.elapsed().as_millis(),
            "Capture state transition"
        );

        self.current = target;
        self.visited.push(target);

        Ok(())
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        let sm = CaptureStateMachine::new();
        assert_eq!(sm.phase(), CapturePhase::Idle);
        assert_eq!(sm.visited(), &[CapturePhase::Idle]);
    }

    #[test]
    fn test_two_phase_path() {
        let mut sm = CaptureStateMachine::new();
        sm.transition_to(CapturePhase::PreDumping).unwrap();
        sm.transition_to(CapturePhase::Dumping).unwrap();
        sm.transition_to(CapturePhase::Done).unwrap();
        assert!(sm.phase().is_terminal());
        assert_eq!(
            sm.visited(),
            &[
                CapturePhase::Idle,
                CapturePhase::PreDumping,
                CapturePhase::Dumping,
                CapturePhase::Done
            ]
        );
    }

    #[test]
    fn test_no_dump_after_failure() {
        let mut sm = CaptureStateMachine::new();
        sm.transition_to(CapturePhase::PreDumping).unwrap();
        sm.transition_to(CapturePhase::Failed).unwrap();
        assert!(sm.transition_to(CapturePhase::Dumping).is_err());
        assert_eq!(sm.phase(), CapturePhase::Failed);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = CaptureStateMachine::new();
        assert!(sm.transition_to(CapturePhase::Done).is_err());
        assert!(sm.transition_to(CapturePhase::Failed).is_err());
        sm.transition_to(CapturePhase::Dumping).unwrap();
        assert!(sm.transition_to(CapturePhase::PreDumping).is_err());
    }
}
