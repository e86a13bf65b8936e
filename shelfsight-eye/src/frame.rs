//! Video frames and snapshot encoding

use crate::error::VisionError;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, RgbImage};
use shelfsight_core::EncodedImage;
use std::path::Path;

/// One RGB8 video frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB8 pixels, row-major
    pub pixels: Bytes,
    /// Monotonic frame counter within a session
    pub sequence: u64,
}

impl Frame {
    /// Create a frame, checking the pixel buffer matches the dimensions
    pub fn new(width: u32, height: u32, pixels: Bytes, sequence: u64) -> Result<Self, VisionError> {
        if width == 0 || height == 0 {
            return Err(VisionError::Camera("Frame dimensions must be non-zero".to_string()));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| VisionError::Camera("Frame dimensions overflow".to_string()))?;

        if pixels.len() != expected {
            return Err(VisionError::Camera(format!(
                "Expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
            sequence,
        })
    }

    /// Solid black frame
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        let len = width as usize * height as usize * 3;
        Self {
            width,
            height,
            pixels: Bytes::from(vec![0u8; len]),
            sequence,
        }
    }

    pub fn from_rgb_image(image: RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: Bytes::from(image.into_raw()),
            sequence,
        }
    }

    /// Load an image file as a frame, downscaling to at most `max_width`
    pub fn load(path: &Path, max_width: u32, sequence: u64) -> Result<Self, VisionError> {
        let mut rgb = image::open(path)?.to_rgb8();
        if rgb.width() > max_width && max_width > 0 {
            let scale = max_width as f32 / rgb.width() as f32;
            let height = ((rgb.height() as f32 * scale).round() as u32).max(1);
            rgb = image::imageops::resize(&rgb, max_width, height, FilterType::Triangle);
        }
        Ok(Self::from_rgb_image(rgb, sequence))
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage, VisionError> {
        RgbImage::from_raw(self.width, self.height, self.pixels.to_vec())
            .ok_or_else(|| VisionError::Encoding("Pixel buffer does not match frame size".to_string()))
    }

    /// Encode the frame as JPEG for upload
    pub fn encode_jpeg(&self, quality: u8) -> Result<EncodedImage, VisionError> {
        let quality = quality.clamp(1, 100);
        let mut buffer = Vec::with_capacity(self.pixels.len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder
            .encode(&self.pixels, self.width, self.height, ColorType::Rgb8)
            .map_err(|e| VisionError::Encoding(format!("JPEG encoding failed: {}", e)))?;

        Ok(EncodedImage::jpeg(Bytes::from(buffer), self.width, self.height))
    }
}
