//! Operator overlay: bounding box, label and centering guides
//!
//! The overlay is a presentation surface. It never affects detection,
//! sonification or capture decisions.

use crate::error::VisionError;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use shelfsight_core::BoundingBox;
use std::path::Path;

const BOX_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const OBJECT_GUIDE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const FRAME_GUIDE_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const LABEL_TAB_COLOR: Rgba<u8> = Rgba([0, 255, 0, 160]);
const LABEL_TAB_HEIGHT: u32 = 12;

/// Everything drawn for the primary object of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayScene {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl OverlayScene {
    /// Caption shown next to the box, e.g. "bottle (87%)"
    pub fn caption(&self) -> String {
        format!("{} ({:.0}%)", self.label, self.confidence * 100.0)
    }

    pub fn object_center_x(&self) -> f32 {
        self.bbox.center_x()
    }

    pub fn frame_center_x(&self) -> f32 {
        self.frame_width as f32 / 2.0
    }
}

/// Drawing surface the detection loop paints on every tick
pub trait OverlaySurface: Send + Sync {
    /// Erase everything drawn so far
    fn clear(&self);

    /// Draw the primary object with its guides
    fn draw(&self, scene: &OverlayScene);
}

/// Overlay that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl OverlaySurface for NullOverlay {
    fn clear(&self) {}

    fn draw(&self, _scene: &OverlayScene) {}
}

struct RasterState {
    canvas: RgbaImage,
    caption: Option<String>,
}

/// Overlay rendered into an in-memory RGBA canvas
pub struct RasterOverlay {
    state: Mutex<RasterState>,
}

impl RasterOverlay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Mutex::new(RasterState {
                canvas: RgbaImage::new(width.max(1), height.max(1)),
                caption: None,
            }),
        }
    }

    /// Copy of the current canvas
    pub fn snapshot(&self) -> RgbaImage {
        self.state.lock().canvas.clone()
    }

    /// Caption of the last drawn scene, if the canvas is not clear
    pub fn caption(&self) -> Option<String> {
        self.state.lock().caption.clone()
    }

    pub fn is_clear(&self) -> bool {
        let state = self.state.lock();
        state.caption.is_none() && state.canvas.pixels().all(|p| p[3] == 0)
    }

    /// Write the canvas as PNG
    pub fn save_png(&self, path: &Path) -> Result<(), VisionError> {
        self.snapshot().save(path)?;
        Ok(())
    }
}

impl OverlaySurface for RasterOverlay {
    fn clear(&self) {
        let mut state = self.state.lock();
        for pixel in state.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        state.caption = None;
    }

    fn draw(&self, scene: &OverlayScene) {
        let mut state = self.state.lock();
        let (w, h) = state.canvas.dimensions();
        if w != scene.frame_width.max(1) || h != scene.frame_height.max(1) {
            state.canvas = RgbaImage::new(scene.frame_width.max(1), scene.frame_height.max(1));
        }

        let canvas = &mut state.canvas;
        if let Some(rect) = pixel_rect(&scene.bbox, canvas.dimensions()) {
            draw_rect(canvas, rect, BOX_COLOR, 2);
            let [x0, y0, x1, _] = rect;
            fill_rect(canvas, [x0, y0.saturating_sub(LABEL_TAB_HEIGHT), x1, y0], LABEL_TAB_COLOR);
        }
        draw_vertical_line(canvas, scene.object_center_x(), OBJECT_GUIDE_COLOR);
        draw_vertical_line(canvas, scene.frame_center_x(), FRAME_GUIDE_COLOR);
        state.caption = Some(scene.caption());
    }
}

/// Clamp a pixel-space box to the canvas; None when nothing is visible
fn pixel_rect(bbox: &BoundingBox, dims: (u32, u32)) -> Option<[u32; 4]> {
    let (w, h) = dims;
    if w == 0 || h == 0 || !bbox.x.is_finite() || !bbox.y.is_finite() || bbox.area() <= 0.0 {
        return None;
    }
    let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min((max - 1) as f32) as u32 };
    let x0 = clamp(bbox.x, w);
    let y0 = clamp(bbox.y, h);
    let x1 = clamp(bbox.x + bbox.width, w);
    let y1 = clamp(bbox.y + bbox.height, h);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some([x0, y0, x1, y1])
}

fn draw_rect(img: &mut RgbaImage, rect: [u32; 4], color: Rgba<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    let [x0, y0, x1, y1] = rect;
    for t in 0..thickness {
        let xx0 = x0.saturating_add(t);
        let yy0 = y0.saturating_add(t);
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 >= w || yy0 >= h || xx1 >= w || yy1 >= h || xx0 > xx1 || yy0 > yy1 {
            continue;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}

fn fill_rect(img: &mut RgbaImage, rect: [u32; 4], color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    let [x0, y0, x1, y1] = rect;
    for y in y0..y1.min(h) {
        for x in x0..=x1.min(w.saturating_sub(1)) {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_vertical_line(img: &mut RgbaImage, x: f32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if !x.is_finite() || x < 0.0 || x >= w as f32 {
        return;
    }
    let x = x as u32;
    for y in 0..h {
        img.put_pixel(x, y, color);
    }
}
