//! Camera sources and exclusive session management

use crate::config::CameraConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use async_trait::async_trait;
use parking_lot::RwLock;
use shelfsight_core::FacingMode;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something that can open a camera stream for a facing mode
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Acquire a stream; resolves once the stream is ready to deliver frames
    async fn open(&self, facing: FacingMode) -> Result<Arc<dyn CameraStream>, VisionError>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// A live camera stream
#[async_trait]
pub trait CameraStream: Send + Sync {
    fn facing(&self) -> FacingMode;

    /// Frame size (width, height) in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Most recent frame
    async fn current_frame(&self) -> Result<Frame, VisionError>;

    /// Release the underlying tracks; later frame reads fail
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// Owns the single active camera stream
///
/// Starting a new stream always releases the previous one first, so two
/// streams never coexist.
pub struct CameraManager {
    source: Arc<dyn CameraSource>,
    active: RwLock<Option<Arc<dyn CameraStream>>>,
}

impl CameraManager {
    pub fn new(source: Arc<dyn CameraSource>) -> Self {
        Self {
            source,
            active: RwLock::new(None),
        }
    }

    /// Release any active stream, then acquire a new one
    pub async fn start(&self, facing: FacingMode) -> Result<Arc<dyn CameraStream>, VisionError> {
        self.release();

        let stream = self.source.open(facing).await?;
        let (width, height) = stream.dimensions();
        *self.active.write() = Some(stream.clone());
        info!(
            "Camera '{}' started ({} facing, {}x{})",
            self.source.name(),
            facing.as_str(),
            width,
            height
        );
        Ok(stream)
    }

    /// Stop and release the active stream, if any
    pub fn stop(&self) {
        if self.release() {
            info!("Camera '{}' stopped", self.source.name());
        }
    }

    fn release(&self) -> bool {
        let previous = self.active.write().take();
        match previous {
            Some(stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }

    /// Currently active stream
    pub fn current(&self) -> Option<Arc<dyn CameraStream>> {
        self.active.read().clone()
    }

    /// Check if a stream is active
    pub fn is_running(&self) -> bool {
        self.active.read().as_ref().map(|s| s.is_live()).unwrap_or(false)
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

/// Camera replaying still images from a directory
///
/// Frames are served round-robin, one per read.
pub struct StillImageCamera {
    config: Arc<CameraConfig>,
}

impl StillImageCamera {
    pub fn new(config: CameraConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    fn directory_for(&self, facing: FacingMode) -> PathBuf {
        let specific = self.config.image_dir.join(facing.as_str());
        if specific.is_dir() {
            specific
        } else {
            self.config.image_dir.clone()
        }
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, VisionError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| VisionError::Camera(format!("Cannot read {}: {}", dir.display(), e)))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[async_trait]
impl CameraSource for StillImageCamera {
    async fn open(&self, facing: FacingMode) -> Result<Arc<dyn CameraStream>, VisionError> {
        let dir = self.directory_for(facing);
        let max_width = self.config.max_width;

        let frames = tokio::task::spawn_blocking(move || -> Result<Vec<Frame>, VisionError> {
            let paths = list_images(&dir)?;
            if paths.is_empty() {
                return Err(VisionError::Camera(format!("No images found in {}", dir.display())));
            }

            let mut frames = Vec::with_capacity(paths.len());
            for (i, path) in paths.iter().enumerate() {
                match Frame::load(path, max_width, i as u64) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
                }
            }
            if frames.is_empty() {
                return Err(VisionError::Camera("No readable images".to_string()));
            }
            Ok(frames)
        })
        .await
        .map_err(|e| VisionError::Camera(format!("Frame loading task failed: {}", e)))??;

        debug!("Loaded {} still frames", frames.len());
        Ok(Arc::new(StillImageStream {
            facing,
            frames,
            cursor: AtomicU64::new(0),
            live: AtomicBool::new(true),
        }))
    }

    fn name(&self) -> &str {
        "still-images"
    }
}

struct StillImageStream {
    facing: FacingMode,
    frames: Vec<Frame>,
    cursor: AtomicU64,
    live: AtomicBool,
}

#[async_trait]
impl CameraStream for StillImageStream {
    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    async fn current_frame(&self) -> Result<Frame, VisionError> {
        if !self.is_live() {
            return Err(VisionError::Camera("Camera stream stopped".to_string()));
        }

        let sequence = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = (sequence % self.frames.len() as u64) as usize;
        let mut frame = self.frames[index].clone();
        frame.sequence = sequence;
        Ok(frame)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::Relaxed);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }
}
