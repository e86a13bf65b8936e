//! Capture pipeline
//!
//! One run per trigger: "Stop" cue, shutter, snapshot, describe, speak.
//! The snapshot is the frame the trigger fired on, not a later camera read.
//! The run executes on its own task and reports each stage back to the
//! detection loop, which owns the state machine. The loop guarantees a
//! single run at a time; the pipeline itself does not.

use crate::phrases::{ROTATE_CUE, STOP_CUE};
use shelfsight_core::{is_uninformative, EncodedImage, Settings};
use shelfsight_eye::{Frame, VisionError};
use shelfsight_llm::DescriptionClient;
use shelfsight_sc::{CuePlayer, SoundCue};
use shelfsight_spk::SpeechChannel;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Description spoken and the settle delay elapsed
    Completed,
    /// Snapshot or description failed
    Failed(String),
    /// The task ended without reporting (cancelled or panicked)
    Aborted,
}

/// Stage reached by a run
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStage {
    /// "Stop" cue finished, snapshot being taken and described
    Capturing,
    /// Description received and about to be spoken
    Speaking { description: String, uninformative: bool },
    Finished(CaptureOutcome),
}

/// Progress report tagged with the run id
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureEvent {
    pub id: u64,
    pub stage: CaptureStage,
}

/// Everything one run needs, cloned out of the loop at trigger time
pub struct CaptureJob {
    pub id: u64,
    /// The frame the trigger fired on; this is what gets described
    pub frame: Frame,
    pub speech: Arc<SpeechChannel>,
    pub cues: Arc<dyn CuePlayer>,
    pub describer: DescriptionClient,
    pub settings: Settings,
    pub jpeg_quality: u8,
    pub settle_delay: Duration,
}

/// Reports `Aborted` if the run is dropped before finishing
struct Reporter {
    id: u64,
    tx: mpsc::UnboundedSender<CaptureEvent>,
    finished: bool,
}

impl Reporter {
    fn stage(&self, stage: CaptureStage) {
        let _ = self.tx.send(CaptureEvent { id: self.id, stage });
    }

    fn finish(mut self, outcome: CaptureOutcome) {
        self.finished = true;
        self.stage(CaptureStage::Finished(outcome));
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if !self.finished {
            self.stage(CaptureStage::Finished(CaptureOutcome::Aborted));
        }
    }
}

impl CaptureJob {
    /// Spawn the run; its events arrive on `tx`
    pub fn spawn(self, tx: mpsc::UnboundedSender<CaptureEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let reporter = Reporter {
                id: self.id,
                tx,
                finished: false,
            };
            let outcome = self.run(&reporter).await;
            reporter.finish(outcome);
        })
    }

    async fn run(&self, reporter: &Reporter) -> CaptureOutcome {
        let sounds = self.settings.sounds_enabled;

        if self.settings.stop_alert_enabled {
            let outcome = self.speech.say(STOP_CUE).await;
            debug!("Stop cue ended: {:?}", outcome);
        }
        reporter.stage(CaptureStage::Capturing);

        if sounds {
            self.cues.play(SoundCue::Shutter);
        }

        let image = match self.snapshot().await {
            Ok(image) => image,
            Err(e) => {
                warn!("Capture {} snapshot failed: {}", self.id, e);
                return CaptureOutcome::Failed(e.to_string());
            }
        };
        debug!(
            "Capture {} snapshot: {}x{}, {} bytes",
            self.id,
            image.width,
            image.height,
            image.bytes.len()
        );

        if sounds {
            self.cues.play(SoundCue::Processing);
        }
        let result = self.describer.describe(&image, &self.settings.fields).await;
        self.cues.stop(SoundCue::Processing);

        let description = match result {
            Ok(description) => description,
            Err(e) => return CaptureOutcome::Failed(e.to_string()),
        };

        if sounds {
            self.cues.play(SoundCue::Complete);
        }

        let uninformative = is_uninformative(&description);
        reporter.stage(CaptureStage::Speaking {
            description: description.clone(),
            uninformative,
        });

        let outcome = self.speech.say(description).await;
        debug!("Description speech ended: {:?}", outcome);
        if uninformative {
            info!("Capture {} was uninformative, asking for a rotation", self.id);
            let outcome = self.speech.say(ROTATE_CUE).await;
            debug!("Rotate cue ended: {:?}", outcome);
        }

        tokio::time::sleep(self.settle_delay).await;
        CaptureOutcome::Completed
    }

    async fn snapshot(&self) -> Result<EncodedImage, VisionError> {
        let frame = self.frame.clone();
        let quality = self.jpeg_quality;
        tokio::task::spawn_blocking(move || frame.encode_jpeg(quality))
            .await
            .map_err(|e| VisionError::Encoding(format!("Snapshot task failed: {}", e)))?
    }
}
