//! Detection loop controller
//!
//! The assistant runs as one actor task. Each loop iteration waits for the
//! first of: a shell command, a capture progress report, or the next timer
//! (frame tick, idle deadline, pending session start). Commands are polled
//! first so a stop always lands before the next tick.

use crate::capture::{CaptureEvent, CaptureJob, CaptureOutcome, CaptureStage};
use crate::config::AssistantConfig;
use crate::error::AssistError;
use crate::events::{AssistantEvent, AssistantStatus, OverlayKind};
use crate::handle::{AssistantHandle, Command};
use crate::idle::{IdleAction, IdleMonitor};
use crate::phrases::{MODEL_LOADED, MOVE_PROMPT};
use crate::state::{InteractionMachine, InteractionState, TransitionError};
use shelfsight_core::{centeredness, select_primary, Detection, FacingMode, Settings};
use shelfsight_eye::{
    CameraManager, CameraStream, DetectorAdapter, Frame, OverlayScene, OverlaySurface, VisionError,
};
use shelfsight_llm::DescriptionClient;
use shelfsight_sc::{CuePlayer, LoadingChime, Sonifier, ToneOutput};
use shelfsight_spk::SpeechChannel;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// External collaborators driven by the loop
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<CameraManager>,
    pub detector: Arc<DetectorAdapter>,
    pub overlay: Arc<dyn OverlaySurface>,
    pub speech: Arc<SpeechChannel>,
    pub tone_output: Arc<dyn ToneOutput>,
    pub cues: Arc<dyn CuePlayer>,
    pub describer: DescriptionClient,
}

struct ActiveCapture {
    id: u64,
    task: JoinHandle<()>,
}

/// The detection loop and everything it owns
pub struct Assistant {
    config: AssistantConfig,
    settings: Settings,
    parts: Collaborators,
    machine: InteractionMachine,
    idle: IdleMonitor,
    sonifier: Sonifier,
    facing: FacingMode,
    model_loaded: bool,
    session_active: bool,
    overlay: Option<OverlayKind>,
    next_tick: Option<Instant>,
    pending_start: Option<Instant>,
    last_capture_at: Option<Instant>,
    capture: Option<ActiveCapture>,
    capture_seq: u64,
    last_description: Option<String>,
    capture_tx: mpsc::UnboundedSender<CaptureEvent>,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<AssistantEvent>,
    status: watch::Sender<AssistantStatus>,
}

impl Assistant {
    /// Validate the configuration and spawn the loop
    pub fn spawn(
        config: AssistantConfig,
        parts: Collaborators,
    ) -> Result<(JoinHandle<()>, AssistantHandle), AssistError> {
        config.validate().map_err(AssistError::Config)?;

        let (command_tx, commands) = mpsc::channel(config.command_buffer);
        let (events, _) = broadcast::channel(config.event_buffer);
        let (status, status_rx) = watch::channel(AssistantStatus {
            facing: config.facing,
            ..AssistantStatus::default()
        });
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();

        let handle = AssistantHandle::new(command_tx, status_rx, events.clone());
        let assistant = Self {
            settings: config.settings.sanitized(),
            machine: InteractionMachine::new(),
            idle: IdleMonitor::new(config.timing.nudge_interval(), config.timing.max_nudges),
            sonifier: Sonifier::new(parts.tone_output.clone(), config.timing.tone_teardown()),
            facing: config.facing,
            model_loaded: false,
            session_active: false,
            overlay: None,
            next_tick: None,
            pending_start: None,
            last_capture_at: None,
            capture: None,
            capture_seq: 0,
            last_description: None,
            capture_tx,
            capture_rx,
            commands,
            events,
            status,
            config,
            parts,
        };

        let task = tokio::spawn(assistant.run());
        Ok((task, handle))
    }

    async fn run(mut self) {
        info!("Assistant starting (detector: {}, describer: {})",
            self.parts.detector.name(),
            self.parts.describer.backend_name()
        );
        self.boot().await;
        self.publish_status();

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.capture_rx.recv() => self.on_capture_event(event),
                _ = sleep_until(deadline) => self.on_timer().await,
            }
            self.publish_status();
        }

        self.stop_session();
        self.publish_status();
        info!("Assistant stopped");
    }

    /// Load the detector behind the loading chime, then schedule the first session
    async fn boot(&mut self) {
        let chime = if self.settings.sounds_enabled {
            LoadingChime::start(
                self.parts.tone_output.as_ref(),
                &self.config.audio,
                self.config.timing.tone_teardown(),
            )
            .unwrap_or_else(|e| {
                warn!("Loading chime unavailable: {}", e);
                LoadingChime::silent()
            })
        } else {
            LoadingChime::silent()
        };

        let loaded = self.parts.detector.load().await;
        chime.stop().await;

        match loaded {
            Ok(()) => {
                self.model_loaded = true;
                info!("Object detection model loaded ({})", self.parts.detector.name());
                let _ = self.parts.speech.say(MODEL_LOADED);
                self.emit(AssistantEvent::ModelLoaded {
                    detector: self.parts.detector.name().to_string(),
                });
                if self.config.auto_start {
                    self.pending_start = Some(Instant::now() + self.config.timing.startup_delay());
                }
            }
            Err(e) => {
                error!("Failed to load object detection model: {}", e);
                self.emit(AssistantEvent::Error {
                    message: format!("Failed to load object detection model: {}", e),
                });
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        let idle = if self.session_active && self.machine.state() == InteractionState::Idle {
            self.idle.next_deadline(
                self.settings.move_prompt_delay(),
                self.settings.move_prompt_enabled,
            )
        } else {
            None
        };

        [self.next_tick, self.pending_start, idle]
            .into_iter()
            .flatten()
            .min()
    }

    async fn on_timer(&mut self) {
        let now = Instant::now();

        if self.pending_start.is_some_and(|at| now >= at) {
            self.pending_start = None;
            self.start_session().await;
            return;
        }

        if self.next_tick.is_some_and(|at| now >= at) {
            self.tick().await;
            return;
        }

        if self.session_active && self.machine.state() == InteractionState::Idle {
            let action = self.idle.poll(
                now,
                self.settings.move_prompt_delay(),
                self.settings.move_prompt_enabled,
            );
            self.apply_idle_action(action);
        }
    }

    async fn handle_command(&mut self, command: Command) {
        debug!("Command: {:?}", command);
        match command {
            Command::StartSession => {
                self.pending_start = None;
                self.start_session().await;
            }
            Command::StopSession => {
                self.pending_start = None;
                self.stop_session();
                self.set_state(|m| Ok(m.reset()));
            }
            Command::Resume => {
                if self.machine.state() == InteractionState::Paused || !self.session_active {
                    info!("Resuming");
                    self.pending_start = None;
                    self.start_session().await;
                }
            }
            Command::SwitchFacing => {
                self.facing = self.facing.toggled();
                info!("Camera facing switched to {}", self.facing.as_str());
                self.emit(AssistantEvent::FacingChanged { facing: self.facing });
                if self.session_active {
                    self.stop_session();
                    self.pending_start =
                        Some(Instant::now() + self.config.timing.facing_switch_delay());
                }
            }
            Command::OpenOverlay(kind) => {
                self.pending_start = None;
                self.stop_session();
                self.overlay = Some(kind);
                self.emit(AssistantEvent::OverlayOpened { overlay: kind });
                if kind == OverlayKind::Tutorial {
                    let _ = self.parts.speech.say_all(self.config.tutorial.clone());
                }
            }
            Command::CloseOverlay => {
                let Some(kind) = self.overlay.take() else {
                    return;
                };
                if kind == OverlayKind::Tutorial {
                    self.parts.speech.cancel();
                }
                self.emit(AssistantEvent::OverlayClosed { overlay: kind });
                self.pending_start = Some(Instant::now() + self.config.timing.restart_grace());
            }
            Command::UpdateSettings(settings) => {
                self.apply_settings(settings);
            }
            Command::Shutdown => {}
        }
    }

    fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        info!("Settings updated");

        if !self.settings.sounds_enabled {
            self.sonifier.mute();
        }
        if !self.settings.move_prompt_enabled && self.idle.deactivate() {
            self.parts.speech.cancel();
            self.emit(AssistantEvent::MovePromptHidden);
        }
    }

    async fn start_session(&mut self) {
        if self.overlay.is_some() {
            debug!("Overlay open, session start skipped");
            return;
        }
        if !self.model_loaded {
            warn!("Object detection model not loaded, session start skipped");
            return;
        }
        if self.session_active {
            self.stop_session();
        }

        match self.parts.camera.start(self.facing).await {
            Ok(stream) => {
                let (width, height) = stream.dimensions();
                info!("Camera session started ({}, {}x{})", self.facing.as_str(), width, height);
            }
            Err(e) => {
                warn!("Camera unavailable: {}", e);
                self.emit(AssistantEvent::CameraUnavailable {
                    message: e.to_string(),
                });
                return;
            }
        }

        if let Err(e) = self.sonifier.start(&self.settings) {
            warn!("Tone generator unavailable: {}", e);
        }
        self.set_state(|m| Ok(m.reset()));
        self.idle.reset();
        self.last_capture_at = None;
        self.session_active = true;
        self.next_tick = Some(Instant::now());
        self.emit(AssistantEvent::SessionStarted { facing: self.facing });
    }

    /// Tear down everything the session owns; no tick runs after this
    fn stop_session(&mut self) {
        if let Some(capture) = self.capture.take() {
            debug!("Aborting capture {}", capture.id);
            capture.task.abort();
        }
        self.parts.speech.cancel();
        self.parts.cues.stop_all();
        self.sonifier.dispose();
        self.parts.camera.stop();
        self.parts.overlay.clear();
        if self.idle.deactivate() {
            self.emit(AssistantEvent::MovePromptHidden);
        }
        self.idle.reset();
        self.next_tick = None;

        if self.machine.state() != InteractionState::Paused {
            self.set_state(|m| Ok(m.reset()));
        }

        if self.session_active {
            self.session_active = false;
            info!("Camera session stopped");
            self.emit(AssistantEvent::SessionStopped);
        }
    }

    async fn tick(&mut self) {
        self.next_tick = None;

        let result = self.detect_once().await;
        let delay = match result {
            Ok(()) => self.config.timing.frame_interval(),
            Err(e) => {
                let backoff = self.config.timing.tick_backoff();
                warn!("Detection tick failed: {}; retrying in {:?}", e, backoff);
                backoff
            }
        };

        if self.session_active {
            self.next_tick = Some(Instant::now() + delay);
        }
    }

    async fn detect_once(&mut self) -> Result<(), AssistError> {
        let stream = self
            .parts
            .camera
            .current()
            .ok_or_else(|| VisionError::Camera("No active camera stream".to_string()))?;
        let frame = stream.current_frame().await?;
        self.parts.overlay.clear();
        let detections = self.parts.detector.detect(&frame).await?;

        if !self.session_active || !self.machine.state().accepts_detections() {
            return Ok(());
        }

        let now = Instant::now();
        match select_primary(&detections) {
            Some(primary) => {
                let primary = primary.clone();
                self.on_object(primary, frame, now)
            }
            None => self.on_nothing(now),
        }
    }

    fn on_object(&mut self, primary: Detection, frame: Frame, now: Instant) -> Result<(), AssistError> {
        if self.idle.on_object_seen() {
            debug!("Object back in view, move prompt cancelled");
            self.parts.speech.cancel();
            self.emit(AssistantEvent::MovePromptHidden);
        }
        self.try_set_state(|m| m.observe_object())?;

        let score = centeredness(&primary.bbox, frame.width as f32);
        self.parts.overlay.draw(&OverlayScene {
            bbox: primary.bbox,
            label: primary.label.clone(),
            confidence: primary.confidence,
            frame_width: frame.width,
            frame_height: frame.height,
        });
        self.sonifier.set_centeredness(score, &self.settings);

        let cooled_down = self
            .last_capture_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.settings.capture_delay());
        if score * 100.0 >= self.settings.center_threshold_percent && cooled_down {
            debug!(
                "Capture trigger: {} centered at {:.2}",
                primary.label, score
            );
            self.trigger_capture(frame, now)?;
        }
        Ok(())
    }

    fn on_nothing(&mut self, now: Instant) -> Result<(), AssistError> {
        self.try_set_state(|m| m.observe_nothing())?;
        self.sonifier.mute();

        let action = self.idle.on_no_object(
            now,
            self.settings.move_prompt_delay(),
            self.settings.move_prompt_enabled,
        );
        self.apply_idle_action(action);
        Ok(())
    }

    fn apply_idle_action(&mut self, action: IdleAction) {
        match action {
            IdleAction::None => {}
            IdleAction::Nudge { count } => {
                info!("No object in view, move prompt {}", count);
                let _ = self.parts.speech.say(MOVE_PROMPT);
                self.emit(AssistantEvent::MovePromptShown { nudges: count });
            }
            IdleAction::Escalate { count } => {
                warn!("No object after {} prompts, pausing", count);
                self.pending_start = None;
                self.stop_session();
                self.set_state(|m| m.pause());
                self.emit(AssistantEvent::Paused);
                let _ = self.parts.speech.say(MOVE_PROMPT);
            }
        }
    }

    fn trigger_capture(&mut self, frame: Frame, now: Instant) -> Result<(), AssistError> {
        self.try_set_state(|m| m.trigger_capture())?;
        self.last_capture_at = Some(now);
        self.sonifier.suspend();
        self.idle.reset();

        self.capture_seq += 1;
        let id = self.capture_seq;
        let job = CaptureJob {
            id,
            frame,
            speech: self.parts.speech.clone(),
            cues: self.parts.cues.clone(),
            describer: self.parts.describer.clone(),
            settings: self.settings.clone(),
            jpeg_quality: self.config.jpeg_quality,
            settle_delay: self.config.timing.settle_delay(),
        };
        let task = job.spawn(self.capture_tx.clone());
        self.capture = Some(ActiveCapture { id, task });

        info!("Capture {} started", id);
        self.emit(AssistantEvent::CaptureStarted);
        Ok(())
    }

    fn on_capture_event(&mut self, event: CaptureEvent) {
        if self.capture.as_ref().map(|c| c.id) != Some(event.id) {
            debug!("Ignoring stale report from capture {}", event.id);
            return;
        }

        match event.stage {
            CaptureStage::Capturing => self.set_state(|m| m.begin_capture()),
            CaptureStage::Speaking {
                description,
                uninformative,
            } => {
                self.set_state(|m| m.begin_speaking());
                self.last_description = Some(description.clone());
                self.emit(AssistantEvent::Description {
                    text: description,
                    uninformative,
                });
            }
            CaptureStage::Finished(outcome) => {
                self.capture = None;
                match outcome {
                    CaptureOutcome::Completed => {
                        info!("Capture {} completed", event.id);
                        self.set_state(|m| m.finish());
                    }
                    CaptureOutcome::Failed(message) => {
                        warn!("Capture {} failed: {}", event.id, message);
                        self.set_state(|m| m.fail());
                        self.emit(AssistantEvent::CaptureFailed { message });
                    }
                    CaptureOutcome::Aborted => {
                        warn!("Capture {} ended without reporting", event.id);
                        self.set_state(|m| m.fail());
                    }
                }
                self.sonifier.resume();
                self.idle.reset();
            }
        }
    }

    /// Apply a transition, propagating an illegal move to the caller
    fn try_set_state(
        &mut self,
        transition: impl FnOnce(&mut InteractionMachine) -> Result<InteractionState, TransitionError>,
    ) -> Result<(), AssistError> {
        let from = self.machine.state();
        let to = transition(&mut self.machine)?;
        if from != to {
            debug!("State {} -> {}", from, to);
            self.emit(AssistantEvent::StateChanged { from, to });
        }
        Ok(())
    }

    /// Apply a transition; an illegal move forces the machine back to Idle
    fn set_state(
        &mut self,
        transition: impl FnOnce(&mut InteractionMachine) -> Result<InteractionState, TransitionError>,
    ) {
        let from = self.machine.state();
        if let Err(e) = self.try_set_state(transition) {
            error!("{}; resetting to idle", e);
            self.machine.reset();
            if from != InteractionState::Idle {
                self.emit(AssistantEvent::StateChanged {
                    from,
                    to: InteractionState::Idle,
                });
            }
        }
    }

    fn emit(&self, event: AssistantEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish_status(&self) {
        let status = AssistantStatus {
            state: self.machine.state(),
            model_loaded: self.model_loaded,
            session_active: self.session_active,
            facing: self.facing,
            move_prompt_visible: self.idle.is_active(),
            nudges: self.idle.nudges(),
            overlay: self.overlay,
            captures: self.capture_seq,
            last_description: self.last_description.clone(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
