//! Overlay that writes every drawn frame to a PNG file

use shelfsight_eye::{OverlayScene, OverlaySurface, RasterOverlay, VisionError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub struct PngOverlay {
    raster: RasterOverlay,
    dir: PathBuf,
    written: AtomicU64,
}

impl PngOverlay {
    pub fn new(dir: PathBuf) -> Result<Self, VisionError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            raster: RasterOverlay::new(1, 1),
            dir,
            written: AtomicU64::new(0),
        })
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

impl OverlaySurface for PngOverlay {
    fn clear(&self) {
        self.raster.clear();
    }

    fn draw(&self, scene: &OverlayScene) {
        self.raster.draw(scene);
        let n = self.written.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("overlay-{:06}.png", n));
        if let Err(e) = self.raster.save_png(&path) {
            warn!("Failed to write overlay {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfsight_core::BoundingBox;

    #[test]
    fn test_each_draw_writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = PngOverlay::new(dir.path().join("overlays")).unwrap();
        let scene = OverlayScene {
            bbox: BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            label: "cup".to_string(),
            confidence: 0.9,
            frame_width: 64,
            frame_height: 48,
        };

        overlay.clear();
        overlay.draw(&scene);
        overlay.draw(&scene);

        assert_eq!(overlay.written(), 2);
        let first = dir.path().join("overlays").join("overlay-000000.png");
        let image = image_dimensions(&first);
        assert_eq!(image, (64, 48));
    }

    fn image_dimensions(path: &std::path::Path) -> (u32, u32) {
        let bytes = std::fs::read(path).unwrap();
        // PNG IHDR: width and height are big-endian u32 at offsets 16 and 20
        let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        (width, height)
    }
}
