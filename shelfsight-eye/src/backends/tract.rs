//! YOLOv8 ONNX detector running on tract

use super::yolo::decode_output;
use crate::detector::ObjectDetector;
use crate::error::VisionError;
use crate::frame::Frame;
use async_trait::async_trait;
use image::imageops::FilterType;
use parking_lot::RwLock;
use shelfsight_core::Detection;
use std::path::PathBuf;
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::{debug, info};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>>;

/// ONNX detector; the model is loaded on `load()`
pub struct TractDetector {
    model_path: PathBuf,
    input_size: u32,
    min_confidence: f32,
    plan: RwLock<Option<Arc<Plan>>>,
}

impl TractDetector {
    pub fn new(model_path: PathBuf, input_size: u32, min_confidence: f32) -> Self {
        Self {
            model_path,
            input_size,
            min_confidence,
            plan: RwLock::new(None),
        }
    }

    fn build_plan(model_path: &PathBuf, size: usize) -> Result<Plan, VisionError> {
        tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| VisionError::Model(format!("Failed to load {}: {}", model_path.display(), e)))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)))
            .map_err(|e| VisionError::Model(format!("Failed to set input fact: {}", e)))?
            .into_optimized()
            .map_err(|e| VisionError::Model(format!("Failed to optimize model: {}", e)))?
            .into_runnable()
            .map_err(|e| VisionError::Model(format!("Failed to build runnable model: {}", e)))
    }

    fn build_input(frame: &Frame, size: u32) -> Result<Tensor, VisionError> {
        let resized = image::imageops::resize(&frame.to_rgb_image()?, size, size, FilterType::Triangle);
        let side = size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }

    fn infer(plan: &Plan, frame: &Frame, size: u32, min_confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let input = Self::build_input(frame, size)?;
        let outputs = plan
            .run(tvec!(input.into()))
            .map_err(|e| VisionError::Detection(format!("ONNX inference failed: {}", e)))?;
        let output = outputs
            .first()
            .ok_or_else(|| VisionError::Detection("Model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| VisionError::Detection(format!("Output tensor was not f32: {}", e)))?;

        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(VisionError::Detection(format!("Unexpected output shape {:?}", shape)));
        }
        let anchors = shape[2];
        let data: Vec<f32> = view.iter().copied().collect();

        let scale_x = frame.width as f32 / size as f32;
        let scale_y = frame.height as f32 / size as f32;
        Ok(decode_output(&data, anchors, min_confidence, scale_x, scale_y))
    }
}

#[async_trait]
impl ObjectDetector for TractDetector {
    async fn load(&self) -> Result<(), VisionError> {
        if self.plan.read().is_some() {
            return Ok(());
        }
        let path = self.model_path.clone();
        let size = self.input_size as usize;
        let plan = tokio::task::spawn_blocking(move || Self::build_plan(&path, size))
            .await
            .map_err(|e| VisionError::Model(format!("Model loading task failed: {}", e)))??;
        *self.plan.write() = Some(Arc::new(plan));
        info!("ONNX model loaded from {}", self.model_path.display());
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        let plan = self
            .plan
            .read()
            .clone()
            .ok_or_else(|| VisionError::Model("Model not loaded".to_string()))?;
        let frame = frame.clone();
        let size = self.input_size;
        let min_confidence = self.min_confidence;
        let detections = tokio::task::spawn_blocking(move || Self::infer(&plan, &frame, size, min_confidence))
            .await
            .map_err(|e| VisionError::Detection(format!("Inference task failed: {}", e)))??;
        debug!("ONNX detector produced {} detections", detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "yolov8-onnx"
    }
}
