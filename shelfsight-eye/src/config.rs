//! Configuration for shelfsight-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Directory of still images replayed as the camera feed.
    /// `user/` and `environment/` subdirectories are used per facing mode when present.
    pub image_dir: PathBuf,

    /// JPEG quality for uploaded snapshots (1-100)
    pub jpeg_quality: u8,

    /// Maximum frame width; larger images are downscaled
    pub max_width: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./frames"),
            jpeg_quality: 85,
            max_width: 1280,
        }
    }
}

impl CameraConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.max_width == 0 || self.max_width > 7680 {
            return Err("Max width must be between 1 and 7680".to_string());
        }

        if self.image_dir.as_os_str().is_empty() {
            return Err("Image directory cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Which detection model backs the detector adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetectorBackendKind {
    /// Detections replayed from a JSON script, one entry per frame
    Scripted { path: PathBuf },
    /// YOLO-style ONNX model (requires the `backend-tract` feature)
    Onnx { model_path: PathBuf, input_size: u32 },
}

/// Detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: DetectorBackendKind,

    /// Candidates below this confidence are dropped
    pub min_confidence: f32,

    /// Upper bound on candidates kept per frame
    pub max_detections: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackendKind::Scripted {
                path: PathBuf::from("./detections.json"),
            },
            min_confidence: 0.5,
            max_detections: 100,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("Min confidence must be between 0.0 and 1.0".to_string());
        }

        if self.max_detections == 0 || self.max_detections > 1000 {
            return Err("Max detections must be between 1 and 1000".to_string());
        }

        if let DetectorBackendKind::Onnx { input_size, .. } = &self.backend {
            if *input_size == 0 || *input_size > 2048 || input_size % 32 != 0 {
                return Err("ONNX input size must be a multiple of 32 up to 2048".to_string());
            }
        }

        Ok(())
    }
}
