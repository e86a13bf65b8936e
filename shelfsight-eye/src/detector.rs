//! Detector adapter around a black-box object detection model

use crate::config::DetectorConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use async_trait::async_trait;
use shelfsight_core::Detection;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// COCO class names (80 classes), the label set of the bundled model family
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Object detection model
///
/// Output order is unspecified; callers impose their own ordering.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Prepare the model (download, warm-up); called once before the first frame
    async fn load(&self) -> Result<(), VisionError> {
        Ok(())
    }

    /// Detect objects in a frame
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError>;

    /// Model name for logs
    fn name(&self) -> &str;
}

/// Filters raw model output into usable candidates
pub struct DetectorAdapter {
    detector: Arc<dyn ObjectDetector>,
    min_confidence: f32,
    max_detections: usize,
}

impl DetectorAdapter {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: &DetectorConfig) -> Self {
        Self {
            detector,
            min_confidence: config.min_confidence,
            max_detections: config.max_detections,
        }
    }

    pub async fn load(&self) -> Result<(), VisionError> {
        info!("Loading detection model '{}'", self.detector.name());
        self.detector.load().await?;
        info!("Detection model '{}' ready", self.detector.name());
        Ok(())
    }

    /// Run the model on a frame and drop unusable candidates
    pub async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        let raw = self.detector.detect(frame).await?;
        let total = raw.len();

        let mut detections: Vec<Detection> = raw
            .into_iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= self.min_confidence)
            .filter(|d| {
                let b = &d.bbox;
                b.x.is_finite() && b.y.is_finite() && b.width > 0.0 && b.height > 0.0
            })
            .collect();

        // model order carries no meaning; keep the largest boxes, ties in model order
        detections.sort_by(|a, b| b.bbox.area().total_cmp(&a.bbox.area()));
        detections.truncate(self.max_detections);

        debug!("Detected {} objects ({} raw)", detections.len(), total);
        Ok(detections)
    }

    pub fn name(&self) -> &str {
        self.detector.name()
    }
}

/// Detector replaying a fixed script of per-frame detections
pub struct ScriptedDetector {
    script: Vec<Vec<Detection>>,
    cursor: AtomicUsize,
    looping: bool,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Detection>>, looping: bool) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            looping,
        }
    }

    /// Load a script: a JSON array with one array of detections per frame
    pub fn from_path(path: &Path) -> Result<Self, VisionError> {
        let contents = std::fs::read_to_string(path)?;
        let script: Vec<Vec<Detection>> = serde_json::from_str(&contents)
            .map_err(|e| VisionError::Config(format!("Invalid detection script {}: {}", path.display(), e)))?;
        info!("Loaded detection script with {} frames", script.len());
        Ok(Self::new(script, true))
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

#[async_trait]
impl ObjectDetector for ScriptedDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let entry = if self.looping {
            self.script.get(index % self.script.len())
        } else {
            self.script.get(index)
        };
        Ok(entry.cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
