//! Events published to the shell and the status snapshot

use crate::state::InteractionState;
use serde::{Deserialize, Serialize};
use shelfsight_core::FacingMode;

/// Surface that suspends the camera while open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Settings,
    Tutorial,
}

/// Event published by the detection loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AssistantEvent {
    ModelLoaded { detector: String },
    SessionStarted { facing: FacingMode },
    SessionStopped,
    CameraUnavailable { message: String },
    StateChanged { from: InteractionState, to: InteractionState },
    MovePromptShown { nudges: u32 },
    MovePromptHidden,
    CaptureStarted,
    Description { text: String, uninformative: bool },
    CaptureFailed { message: String },
    Paused,
    OverlayOpened { overlay: OverlayKind },
    OverlayClosed { overlay: OverlayKind },
    FacingChanged { facing: FacingMode },
    Error { message: String },
}

/// Snapshot of the loop, republished on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantStatus {
    pub state: InteractionState,
    pub model_loaded: bool,
    pub session_active: bool,
    pub facing: FacingMode,
    pub move_prompt_visible: bool,
    pub nudges: u32,
    pub overlay: Option<OverlayKind>,
    /// Capture cycles started since launch
    pub captures: u64,
    /// Last spoken description
    pub last_description: Option<String>,
}

impl Default for AssistantStatus {
    fn default() -> Self {
        Self {
            state: InteractionState::Idle,
            model_loaded: false,
            session_active: false,
            facing: FacingMode::User,
            move_prompt_visible: false,
            nudges: 0,
            overlay: None,
            captures: 0,
            last_description: None,
        }
    }
}
