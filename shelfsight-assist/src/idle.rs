//! Idle / move-prompt monitor
//!
//! Tracks how long no object has been seen. Once the configured delay has
//! passed the prompt activates and a spoken nudge is due; further nudges are
//! due on a fixed interval until the count reaches the escalation limit.
//! The monitor only decides; the detection loop speaks, shows and pauses.

use std::time::Duration;
use tokio::time::Instant;

/// What the loop should do after consulting the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    None,
    /// Speak the move prompt; `count` is the 1-based nudge number
    Nudge { count: u32 },
    /// Nudge limit reached: stop the session and pause
    Escalate { count: u32 },
}

#[derive(Debug)]
pub struct IdleMonitor {
    no_object_since: Option<Instant>,
    active: bool,
    nudges: u32,
    next_nudge_at: Option<Instant>,
    interval: Duration,
    max_nudges: u32,
}

impl IdleMonitor {
    pub fn new(interval: Duration, max_nudges: u32) -> Self {
        Self {
            no_object_since: None,
            active: false,
            nudges: 0,
            next_nudge_at: None,
            interval,
            max_nudges: max_nudges.max(1),
        }
    }

    /// Prompt currently shown
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Nudges spoken since activation
    pub fn nudges(&self) -> u32 {
        self.nudges
    }

    /// Start of the current no-object stretch
    pub fn no_object_since(&self) -> Option<Instant> {
        self.no_object_since
    }

    /// A detection appeared. Returns true when an active prompt was cancelled.
    pub fn on_object_seen(&mut self) -> bool {
        let was_active = self.active;
        self.reset();
        was_active
    }

    /// A tick without detections. The first call of a stretch records `now`.
    pub fn on_no_object(&mut self, now: Instant, delay: Duration, enabled: bool) -> IdleAction {
        if self.no_object_since.is_none() {
            self.no_object_since = Some(now);
        }
        self.poll(now, delay, enabled)
    }

    /// Evaluate without recording a new observation, used by timer wakeups
    pub fn poll(&mut self, now: Instant, delay: Duration, enabled: bool) -> IdleAction {
        let Some(since) = self.no_object_since else {
            return IdleAction::None;
        };
        if !enabled {
            return IdleAction::None;
        }

        if !self.active {
            if now.saturating_duration_since(since) < delay {
                return IdleAction::None;
            }
            self.active = true;
            self.nudges = 1;
            self.next_nudge_at = Some(now + self.interval);
            return self.action_for(self.nudges);
        }

        match self.next_nudge_at {
            Some(at) if now >= at => {
                self.nudges += 1;
                self.next_nudge_at = Some(at + self.interval);
                self.action_for(self.nudges)
            }
            _ => IdleAction::None,
        }
    }

    /// Next instant at which [`poll`](Self::poll) could produce an action
    pub fn next_deadline(&self, delay: Duration, enabled: bool) -> Option<Instant> {
        if !enabled {
            return None;
        }
        let since = self.no_object_since?;
        if self.active {
            self.next_nudge_at
        } else {
            Some(since + delay)
        }
    }

    /// Hide the prompt and cancel scheduled repeats, keeping the stretch start
    pub fn deactivate(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.nudges = 0;
        self.next_nudge_at = None;
        was_active
    }

    /// Forget the stretch entirely; the next empty tick starts a fresh count
    pub fn reset(&mut self) {
        self.deactivate();
        self.no_object_since = None;
    }

    fn action_for(&self, count: u32) -> IdleAction {
        if count >= self.max_nudges {
            IdleAction::Escalate { count }
        } else {
            IdleAction::Nudge { count }
        }
    }
}
