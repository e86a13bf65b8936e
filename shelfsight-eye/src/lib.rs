//! shelfsight-eye: vision side of the shelfsight assistant
//!
//! Provides:
//! - frames and JPEG snapshot encoding
//! - camera sources with exclusive, release-before-acquire sessions
//! - the detector adapter wrapping a black-box object detection model
//! - the operator overlay (bounding box, label and centering guides)

pub mod error;
pub mod config;
pub mod frame;
pub mod camera;
pub mod detector;
pub mod overlay;
pub mod backends;

pub use error::VisionError;
pub use config::{CameraConfig, DetectorConfig, DetectorBackendKind};
pub use frame::Frame;
pub use camera::{CameraManager, CameraSource, CameraStream, StillImageCamera};
pub use detector::{DetectorAdapter, ObjectDetector, ScriptedDetector};
pub use overlay::{NullOverlay, OverlayScene, OverlaySurface, RasterOverlay};
pub use backends::build_detector;
