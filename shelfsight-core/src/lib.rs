//! shelfsight-core: shared building blocks for the shelfsight assistant
//!
//! Holds the pieces every other crate agrees on:
//! - the workspace error type
//! - user settings and timing configuration
//! - the per-frame data model (detections, bounding boxes, encoded images)
//! - centeredness scoring and tracked-object selection

pub mod error;
pub mod config;
pub mod types;
pub mod geometry;
pub mod description;

pub use error::{Error, Result};
pub use config::{Settings, FieldSelection, DescriptionField, TimingConfig};
pub use types::{BoundingBox, Detection, EncodedImage, FacingMode};
pub use geometry::{centeredness, select_primary};
pub use description::{is_uninformative, UNINFORMATIVE_MARKERS};
