//! Detector backends and the factory that picks one from configuration

pub mod yolo;
#[cfg(feature = "backend-tract")]
pub mod tract;

use crate::config::{DetectorBackendKind, DetectorConfig};
use crate::detector::{ObjectDetector, ScriptedDetector};
use crate::error::VisionError;
use std::sync::Arc;
use tracing::info;

/// Build the configured detector
pub fn build_detector(config: &DetectorConfig) -> Result<Arc<dyn ObjectDetector>, VisionError> {
    config.validate().map_err(VisionError::Config)?;

    match &config.backend {
        DetectorBackendKind::Scripted { path } => {
            info!("Using scripted detector from {}", path.display());
            Ok(Arc::new(ScriptedDetector::from_path(path)?))
        }
        #[cfg(feature = "backend-tract")]
        DetectorBackendKind::Onnx { model_path, input_size } => {
            info!("Using ONNX detector from {}", model_path.display());
            Ok(Arc::new(tract::TractDetector::new(
                model_path.clone(),
                *input_size,
                config.min_confidence,
            )))
        }
        #[cfg(not(feature = "backend-tract"))]
        DetectorBackendKind::Onnx { .. } => Err(VisionError::Config(
            "ONNX detector requires the 'backend-tract' feature".to_string(),
        )),
    }
}
