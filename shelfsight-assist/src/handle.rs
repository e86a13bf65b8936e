//! Shell-facing handle to the running assistant

use crate::error::AssistError;
use crate::events::{AssistantEvent, AssistantStatus, OverlayKind};
use crate::state::InteractionState;
use shelfsight_core::Settings;
use tokio::sync::{broadcast, mpsc, watch};

/// Session lifecycle commands consumed by the detection loop
#[derive(Debug, Clone)]
pub(crate) enum Command {
    StartSession,
    StopSession,
    SwitchFacing,
    OpenOverlay(OverlayKind),
    CloseOverlay,
    UpdateSettings(Settings),
    Resume,
    Shutdown,
}

/// Cloneable handle; every method is a message to the loop
#[derive(Clone)]
pub struct AssistantHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<AssistantStatus>,
    events: broadcast::Sender<AssistantEvent>,
}

impl AssistantHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        status: watch::Receiver<AssistantStatus>,
        events: broadcast::Sender<AssistantEvent>,
    ) -> Self {
        Self {
            commands,
            status,
            events,
        }
    }

    async fn send(&self, command: Command) -> Result<(), AssistError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AssistError::Closed)
    }

    pub async fn start_session(&self) -> Result<(), AssistError> {
        self.send(Command::StartSession).await
    }

    pub async fn stop_session(&self) -> Result<(), AssistError> {
        self.send(Command::StopSession).await
    }

    /// Toggle user/environment camera; a running session restarts after a delay
    pub async fn switch_facing(&self) -> Result<(), AssistError> {
        self.send(Command::SwitchFacing).await
    }

    /// Open the settings or tutorial surface, stopping the session
    pub async fn open_overlay(&self, overlay: OverlayKind) -> Result<(), AssistError> {
        self.send(Command::OpenOverlay(overlay)).await
    }

    /// Close the open surface; the session restarts after the grace delay
    pub async fn close_overlay(&self) -> Result<(), AssistError> {
        self.send(Command::CloseOverlay).await
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<(), AssistError> {
        self.send(Command::UpdateSettings(settings)).await
    }

    /// Leave `Paused` by starting a new session
    pub async fn resume(&self) -> Result<(), AssistError> {
        self.send(Command::Resume).await
    }

    pub async fn shutdown(&self) -> Result<(), AssistError> {
        self.send(Command::Shutdown).await
    }

    pub fn status(&self) -> AssistantStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> InteractionState {
        self.status.borrow().state
    }

    /// Status receiver that wakes on every change
    pub fn watch_status(&self) -> watch::Receiver<AssistantStatus> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
