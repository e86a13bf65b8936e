//! shelfsight-assist: the interaction core
//!
//! One actor task (the detection loop) owns every piece of mutable
//! interaction state: the [`InteractionMachine`], the idle monitor, the
//! sonifier and the session's timers. Shells talk to it through an
//! [`AssistantHandle`] and observe it through [`AssistantEvent`]s.
//!
//! At most one capture cycle runs at a time. That is enforced by the
//! state machine: a capture can only be triggered from `Tracking`, and the
//! machine does not return to `Idle` until the cycle reports back.

pub mod error;
pub mod config;
pub mod phrases;
pub mod state;
pub mod idle;
pub mod events;
pub mod capture;
pub mod controller;
pub mod handle;

pub use error::AssistError;
pub use config::AssistantConfig;
pub use state::{InteractionMachine, InteractionState, TransitionError};
pub use idle::{IdleAction, IdleMonitor};
pub use events::{AssistantEvent, AssistantStatus, OverlayKind};
pub use controller::{Assistant, Collaborators};
pub use handle::AssistantHandle;
