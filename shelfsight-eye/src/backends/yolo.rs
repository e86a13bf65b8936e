//! YOLOv8 output decoding
//!
//! The model emits a `[1, 4 + classes, anchors]` tensor: per anchor a box
//! center, size and one score per class, all in model input pixels.

use crate::detector::COCO_CLASSES;
use shelfsight_core::{BoundingBox, Detection};

/// Overlap above which the weaker of two same-class boxes is dropped
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Decode a flat `[4 + classes, anchors]` tensor into frame-space detections
///
/// `scale_x`/`scale_y` map model input pixels back to frame pixels.
pub fn decode_output(
    data: &[f32],
    anchors: usize,
    min_confidence: f32,
    scale_x: f32,
    scale_y: f32,
) -> Vec<Detection> {
    if anchors == 0 || data.len() % anchors != 0 {
        return Vec::new();
    }
    let rows = data.len() / anchors;
    if rows <= 4 {
        return Vec::new();
    }
    let classes = rows - 4;
    let at = |row: usize, anchor: usize| data[row * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (0..classes)
            .map(|c| (c, at(4 + c, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if !score.is_finite() || score < min_confidence {
            continue;
        }

        let cx = at(0, anchor) * scale_x;
        let cy = at(1, anchor) * scale_y;
        let w = at(2, anchor) * scale_x;
        let h = at(3, anchor) * scale_y;
        let label = COCO_CLASSES
            .get(class_id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("class_{}", class_id));

        candidates.push(Detection::new(
            label,
            score,
            BoundingBox::new(cx - w / 2.0, cy - h / 2.0, w, h),
        ));
    }

    non_max_suppression(candidates, NMS_IOU_THRESHOLD)
}

/// Greedy per-label non-maximum suppression
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.label == candidate.label && iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection over union of two boxes
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = (a.x + a.width).min(b.x + b.width);
    let y1 = (a.y + a.height).min(b.y + b.height);
    let inter = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}
