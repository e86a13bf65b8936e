//! Per-frame data model

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel space: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Area in square pixels; degenerate or non-finite boxes have area 0
    pub fn area(&self) -> f32 {
        let area = self.width.max(0.0) * self.height.max(0.0);
        if area.is_finite() {
            area
        } else {
            0.0
        }
    }

    /// Horizontal center in pixels
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical center in pixels
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One labeled candidate produced by the detector for a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bbox,
        }
    }
}

/// Which camera the session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    #[default]
    User,
    /// Back camera
    Environment,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// Snapshot encoded for upload
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn jpeg(bytes: Bytes, width: u32, height: u32) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg",
            width,
            height,
        }
    }

    /// File name used for multipart uploads
    pub fn file_name(&self) -> &'static str {
        match self.mime_type {
            "image/png" => "capture.png",
            _ => "capture.jpg",
        }
    }
}
