//! Interaction state machine
//!
//! The machine is owned by the detection loop. Every transition is a method
//! that either returns the new state or a [`TransitionError`] naming the
//! illegal move, so callers can never silently land in an unexpected phase.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Phase of the interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum InteractionState {
    /// No object steadily present
    #[default]
    Idle,
    /// An object is detected and sonified
    Tracking,
    /// Capture triggered, "Stop" cue playing
    PreCapturing,
    /// Snapshot submitted for description
    Capturing,
    /// Description being spoken
    Speaking,
    /// Escalated after unanswered nudges, waiting for resume
    Paused,
}

impl InteractionState {
    /// Detection results only drive the machine in these states
    pub fn accepts_detections(&self) -> bool {
        matches!(self, InteractionState::Idle | InteractionState::Tracking)
    }

    /// True while a capture cycle is outstanding
    pub fn is_capture_cycle(&self) -> bool {
        matches!(
            self,
            InteractionState::PreCapturing | InteractionState::Capturing | InteractionState::Speaking
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Tracking => "tracking",
            InteractionState::PreCapturing => "pre-capturing",
            InteractionState::Capturing => "capturing",
            InteractionState::Speaking => "speaking",
            InteractionState::Paused => "paused",
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal transition attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {event} while {from}")]
pub struct TransitionError {
    pub from: InteractionState,
    pub event: &'static str,
}

/// The single interaction state instance
#[derive(Debug, Default)]
pub struct InteractionMachine {
    state: InteractionState,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    fn transition(
        &mut self,
        event: &'static str,
        allowed: &[InteractionState],
        to: InteractionState,
    ) -> Result<InteractionState, TransitionError> {
        if !allowed.contains(&self.state) {
            return Err(TransitionError { from: self.state, event });
        }
        self.state = to;
        Ok(to)
    }

    /// A detection arrived
    pub fn observe_object(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("observe an object", &[Idle, Tracking], Tracking)
    }

    /// A tick with no detection
    pub fn observe_nothing(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("observe nothing", &[Idle, Tracking], Idle)
    }

    /// Capture trigger fired
    pub fn trigger_capture(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("trigger a capture", &[Tracking], PreCapturing)
    }

    /// "Stop" cue done, snapshot taken
    pub fn begin_capture(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("begin capturing", &[PreCapturing], Capturing)
    }

    /// Description received
    pub fn begin_speaking(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("begin speaking", &[Capturing], Speaking)
    }

    /// Result speech finished
    pub fn finish(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("finish speaking", &[Speaking], Idle)
    }

    /// Capture cycle failed at any stage
    pub fn fail(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("fail a capture", &[PreCapturing, Capturing, Speaking], Idle)
    }

    /// Nudges escalated
    pub fn pause(&mut self) -> Result<InteractionState, TransitionError> {
        use InteractionState::*;
        self.transition("pause", &[Idle, Tracking], Paused)
    }

    /// Unconditional return to `Idle`, used on session start and stop
    pub fn reset(&mut self) -> InteractionState {
        self.state = InteractionState::Idle;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_capture_cycle() {
        let mut machine = InteractionMachine::new();
        assert_eq!(machine.state(), InteractionState::Idle);
        assert_eq!(machine.observe_object().unwrap(), InteractionState::Tracking);
        assert_eq!(machine.trigger_capture().unwrap(), InteractionState::PreCapturing);
        assert_eq!(machine.begin_capture().unwrap(), InteractionState::Capturing);
        assert_eq!(machine.begin_speaking().unwrap(), InteractionState::Speaking);
        assert_eq!(machine.finish().unwrap(), InteractionState::Idle);
    }

    #[test]
    fn test_capture_requires_tracking() {
        let mut machine = InteractionMachine::new();
        let err = machine.trigger_capture().unwrap_err();
        assert_eq!(err.from, InteractionState::Idle);
        assert_eq!(machine.state(), InteractionState::Idle);
    }

    #[test]
    fn test_detections_ignored_during_capture_cycle() {
        let mut machine = InteractionMachine::new();
        machine.observe_object().unwrap();
        machine.trigger_capture().unwrap();
        assert!(!machine.state().accepts_detections());
        assert!(machine.observe_object().is_err());
        assert!(machine.trigger_capture().is_err());
        assert_eq!(machine.state(), InteractionState::PreCapturing);
    }

    #[test]
    fn test_fail_from_every_capture_phase() {
        for steps in 1..=3 {
            let mut machine = InteractionMachine::new();
            machine.observe_object().unwrap();
            machine.trigger_capture().unwrap();
            if steps >= 2 {
                machine.begin_capture().unwrap();
            }
            if steps >= 3 {
                machine.begin_speaking().unwrap();
            }
            assert!(machine.state().is_capture_cycle());
            assert_eq!(machine.fail().unwrap(), InteractionState::Idle);
        }
    }

    #[test]
    fn test_pause_and_reset() {
        let mut machine = InteractionMachine::new();
        assert_eq!(machine.pause().unwrap(), InteractionState::Paused);
        assert!(machine.observe_object().is_err());
        assert!(machine.fail().is_err());
        assert_eq!(machine.reset(), InteractionState::Idle);
    }

    #[test]
    fn test_transition_error_message() {
        let err = TransitionError {
            from: InteractionState::Speaking,
            event: "trigger a capture",
        };
        assert_eq!(err.to_string(), "cannot trigger a capture while speaking");
    }
}
