//! Centeredness scoring and tracked-object selection

use crate::types::{BoundingBox, Detection};

/// Normalized horizontal centeredness of a box within a frame
///
/// 1.0 when the box center sits on the frame's vertical midline, 0.0 at
/// either horizontal edge, linear in between.
pub fn centeredness(bbox: &BoundingBox, frame_width: f32) -> f32 {
    if !(frame_width > 0.0) || !frame_width.is_finite() {
        return 0.0;
    }

    let half = frame_width / 2.0;
    let score = 1.0 - (bbox.center_x() - half).abs() / half;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Pick the single detection to track: largest area, first one wins ties
pub fn select_primary(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        match best {
            Some(current) if detection.bbox.area() <= current.bbox.area() => {}
            _ => best = Some(detection),
        }
    }
    best
}
