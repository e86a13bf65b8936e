//! Recording doubles and a rig wiring them into a running assistant

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use shelfsight_assist::{Assistant, AssistantConfig, AssistantEvent, AssistantHandle, Collaborators};
use shelfsight_core::{BoundingBox, Detection, EncodedImage, FacingMode, FieldSelection};
use shelfsight_eye::{
    CameraManager, CameraSource, CameraStream, DetectorAdapter, DetectorConfig, Frame,
    ObjectDetector, OverlayScene, OverlaySurface, VisionError,
};
use shelfsight_llm::{DescribeError, DescriptionBackend, DescriptionClient};
use shelfsight_sc::{NullCuePlayer, NullToneOutput};
use shelfsight_spk::{SpeechChannel, SpeechEngine, SpeechError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

/// Detection whose box center sits at `score` centeredness, left of center
pub fn detection_at(label: &str, score: f32) -> Detection {
    let half = FRAME_WIDTH as f32 / 2.0;
    let center_x = half - (1.0 - score) * half;
    let width = 60.0;
    Detection::new(
        label,
        0.9,
        BoundingBox::new(center_x - width / 2.0, 100.0, width, 120.0),
    )
}

// ---------------------------------------------------------------- camera

/// Frame filled with a gray level derived from its sequence number
pub fn shaded_frame(sequence: u64) -> Result<Frame, VisionError> {
    let shade = (sequence % 251) as u8;
    let len = FRAME_WIDTH as usize * FRAME_HEIGHT as usize * 3;
    Frame::new(FRAME_WIDTH, FRAME_HEIGHT, Bytes::from(vec![shade; len]), sequence)
}

pub struct TestCamera {
    pub opens: Mutex<Vec<(FacingMode, Instant)>>,
    pub stops: AtomicUsize,
    pub frames: AtomicUsize,
    pub unavailable: AtomicBool,
}

impl TestCamera {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            opens: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            frames: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

struct TestStream {
    camera: Arc<TestCamera>,
    facing: FacingMode,
    live: AtomicBool,
}

/// Source side of [`TestCamera`]
pub struct TestCameraSource(pub Arc<TestCamera>);

#[async_trait]
impl CameraSource for TestCameraSource {
    async fn open(&self, facing: FacingMode) -> Result<Arc<dyn CameraStream>, VisionError> {
        let camera = &self.0;
        if camera.unavailable.load(Ordering::SeqCst) {
            return Err(VisionError::Camera("permission denied".to_string()));
        }
        camera.opens.lock().push((facing, Instant::now()));
        Ok(Arc::new(TestStream {
            camera: camera.clone(),
            facing,
            live: AtomicBool::new(true),
        }))
    }

    fn name(&self) -> &str {
        "test"
    }
}

#[async_trait]
impl CameraStream for TestStream {
    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn dimensions(&self) -> (u32, u32) {
        (FRAME_WIDTH, FRAME_HEIGHT)
    }

    async fn current_frame(&self) -> Result<Frame, VisionError> {
        let n = self.camera.frames.fetch_add(1, Ordering::SeqCst);
        shaded_frame(n as u64)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.camera.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

// -------------------------------------------------------------- detector

/// Detector reporting whatever scene the test currently shows
pub struct SceneDetector {
    scene: Mutex<Vec<Detection>>,
    failures: AtomicUsize,
    pub calls: Mutex<Vec<Instant>>,
    pub frames: Mutex<Vec<Frame>>,
    pub load_time: Duration,
}

impl SceneDetector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scene: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            frames: Mutex::new(Vec::new()),
            load_time: Duration::ZERO,
        })
    }

    pub fn show(&self, detections: Vec<Detection>) {
        *self.scene.lock() = detections;
    }

    pub fn clear(&self) {
        self.scene.lock().clear();
    }

    /// Fail the next `n` calls
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn calls_between(&self, from: Instant, to: Instant) -> usize {
        self.calls.lock().iter().filter(|t| **t >= from && **t < to).count()
    }
}

#[async_trait]
impl ObjectDetector for SceneDetector {
    async fn load(&self) -> Result<(), VisionError> {
        tokio::time::sleep(self.load_time).await;
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        self.calls.lock().push(Instant::now());
        self.frames.lock().push(frame.clone());
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(VisionError::Detection("inference failed".to_string()));
        }
        Ok(self.scene.lock().clone())
    }

    fn name(&self) -> &str {
        "scene"
    }
}

// ---------------------------------------------------------------- speech

/// Records every utterance; each takes `duration` to speak
pub struct RecordingSpeech {
    pub spoken: Mutex<Vec<(String, Instant)>>,
    pub duration: Mutex<Duration>,
}

impl RecordingSpeech {
    pub fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            duration: Mutex::new(duration),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn times_of(&self, text: &str) -> Vec<Instant> {
        self.spoken
            .lock()
            .iter()
            .filter(|(t, _)| t == text)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl SpeechEngine for RecordingSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().push((text.to_string(), Instant::now()));
        let duration = *self.duration.lock();
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ----------------------------------------------------------- description

/// Answers from a queue (falling back to `default`), after `latency`
pub struct ScriptedBackend {
    answers: Mutex<VecDeque<Result<String, String>>>,
    default: String,
    latency: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: Mutex<Vec<(FieldSelection, Instant)>>,
    pub uploads: Mutex<Vec<EncodedImage>>,
}

impl ScriptedBackend {
    pub fn new(default: &str, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(VecDeque::new()),
            default: default.to_string(),
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn push_answer(&self, answer: &str) {
        self.answers.lock().push_back(Ok(answer.to_string()));
    }

    pub fn push_failure(&self, message: &str) {
        self.answers.lock().push_back(Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl DescriptionBackend for ScriptedBackend {
    async fn describe_raw(
        &self,
        image: &EncodedImage,
        fields: &FieldSelection,
    ) -> shelfsight_llm::Result<String> {
        self.calls.lock().push((*fields, Instant::now()));
        self.uploads.lock().push(image.clone());
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.answers.lock().pop_front();
        match next.unwrap_or_else(|| Ok(self.default.clone())) {
            Ok(answer) => Ok(answer),
            Err(message) => Err(DescribeError::Status {
                status: 502,
                message,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// --------------------------------------------------------------- overlay

#[derive(Default)]
pub struct RecordingOverlay {
    pub clears: AtomicUsize,
    pub scenes: Mutex<Vec<OverlayScene>>,
}

impl OverlaySurface for RecordingOverlay {
    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn draw(&self, scene: &OverlayScene) {
        self.scenes.lock().push(scene.clone());
    }
}

// ------------------------------------------------------------------- rig

pub struct Rig {
    pub camera: Arc<TestCamera>,
    pub detector: Arc<SceneDetector>,
    pub speech: Arc<RecordingSpeech>,
    pub backend: Arc<ScriptedBackend>,
    pub overlay: Arc<RecordingOverlay>,
    pub handle: AssistantHandle,
    pub events: broadcast::Receiver<AssistantEvent>,
    pub task: JoinHandle<()>,
}

/// Test configuration: short delays, instant speech unless overridden
pub fn test_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.timing.startup_delay_ms = 0;
    config.timing.settle_delay_ms = 0;
    config.settings.sounds_enabled = false;
    config
}

pub struct RigBuilder {
    pub config: AssistantConfig,
    pub speech_duration: Duration,
    pub answer: String,
    pub latency: Duration,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            speech_duration: Duration::ZERO,
            answer: "Milk, 1-2 months".to_string(),
            latency: Duration::ZERO,
        }
    }

    pub fn config(mut self, f: impl FnOnce(&mut AssistantConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn speech_duration(mut self, duration: Duration) -> Self {
        self.speech_duration = duration;
        self
    }

    pub fn answer(mut self, answer: &str, latency: Duration) -> Self {
        self.answer = answer.to_string();
        self.latency = latency;
        self
    }

    pub fn spawn(self) -> Rig {
        self.spawn_with(TestCamera::new(), SceneDetector::new())
    }

    pub fn spawn_with(self, camera: Arc<TestCamera>, detector: Arc<SceneDetector>) -> Rig {
        let speech = RecordingSpeech::new(self.speech_duration);
        let backend = ScriptedBackend::new(&self.answer, self.latency);
        let overlay = Arc::new(RecordingOverlay::default());

        let parts = Collaborators {
            camera: Arc::new(CameraManager::new(Arc::new(TestCameraSource(camera.clone())))),
            detector: Arc::new(DetectorAdapter::new(detector.clone(), &DetectorConfig::default())),
            overlay: overlay.clone(),
            speech: Arc::new(SpeechChannel::new(speech.clone())),
            tone_output: Arc::new(NullToneOutput),
            cues: Arc::new(NullCuePlayer),
            describer: DescriptionClient::new(backend.clone()),
        };

        let (task, handle) = Assistant::spawn(self.config, parts).expect("valid test config");
        let events = handle.subscribe();
        Rig {
            camera,
            detector,
            speech,
            backend,
            overlay,
            handle,
            events,
            task,
        }
    }
}

impl Rig {
    /// Next event matching `pred`, with the instant it was observed
    pub async fn wait_for(
        &mut self,
        within: Duration,
        pred: impl Fn(&AssistantEvent) -> bool,
    ) -> Option<(AssistantEvent, Instant)> {
        let deadline = Instant::now() + within;
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv()).await.ok()?.ok()?;
            if pred(&event) {
                return Some((event, Instant::now()));
            }
        }
    }

    /// Wait for the first session to start; returns its start instant
    pub async fn session_started(&mut self) -> Instant {
        self.wait_for(Duration::from_secs(10), |e| {
            matches!(e, AssistantEvent::SessionStarted { .. })
        })
        .await
        .expect("session started")
        .1
    }

    /// Every event up to `until`
    pub async fn collect_until(&mut self, until: Instant) -> Vec<(AssistantEvent, Instant)> {
        let mut out = Vec::new();
        while let Ok(Ok(event)) = tokio::time::timeout_at(until, self.events.recv()).await {
            out.push((event, Instant::now()));
        }
        out
    }

    pub async fn shutdown(self) {
        let _ = self.handle.shutdown().await;
        let _ = self.task.await;
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
