//! Freehand signature capture.
//!
//! Placing a signature is a two-step workflow: the pointer-down records a
//! [`PendingSignature`] and opens a pad, then the pad's raster is either saved
//! into an annotation or thrown away. The pad itself sits behind
//! [`SignaturePad`] so hosts can plug in their own drawing surface.

use doc_model::{Color, PagePoint};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const PAD_WIDTH_PX: u32 = 500;
pub const PAD_HEIGHT_PX: u32 = 200;
pub const PEN_WIDTH_PX: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("failed to encode signature raster: {0}")]
    Encode(#[from] image::ImageError),
}

/// Drawing surface that produces a signature raster.
pub trait SignaturePad {
    fn is_empty(&self) -> bool;
    /// PNG bytes of the current drawing, `None` when there is nothing to save.
    fn to_raster(&self) -> Option<Vec<u8>>;
    fn clear(&mut self);
}

/// Where the signature will land once the pad is saved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSignature {
    pub page: u32,
    pub anchor: PagePoint,
}

/// In-memory pad that rasterizes strokes onto a transparent canvas.
#[derive(Debug, Clone)]
pub struct StrokePad {
    canvas: RgbaImage,
    pen: Color,
    strokes: usize,
    last_point: Option<(f32, f32)>,
}

impl Default for StrokePad {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl StrokePad {
    pub fn new(pen: Color) -> Self {
        let canvas = RgbaImage::new(PAD_WIDTH_PX, PAD_HEIGHT_PX);
        Self { canvas, pen, strokes: 0, last_point: None }
    }

    pub fn pen(&self) -> Color {
        self.pen
    }

    pub fn set_pen(&mut self, pen: Color) {
        self.pen = pen;
    }

    pub fn begin_stroke(&mut self, x: f32, y: f32) {
        self.strokes += 1;
        self.stamp(x, y);
        self.last_point = Some((x, y));
    }

    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        let Some((from_x, from_y)) = self.last_point else {
            self.begin_stroke(x, y);
            return;
        };

        self.last_point = Some((x, y));
        let Some(((start_x, start_y), (end_x, end_y))) = clip_to_pad((from_x, from_y), (x, y))
        else {
            return;
        };

        let distance = ((end_x - start_x).powi(2) + (end_y - start_y).powi(2)).sqrt();
        let steps = (distance * 2.0).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.stamp(start_x + (end_x - start_x) * t, start_y + (end_y - start_y) * t);
        }
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    /// Draws a whole stroke through `points` in pad pixels.
    pub fn draw_stroke(&mut self, points: &[(f32, f32)]) {
        let Some((&(x, y), rest)) = points.split_first() else {
            return;
        };

        self.begin_stroke(x, y);
        for &(x, y) in rest {
            self.extend_stroke(x, y);
        }
        self.end_stroke();
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, SignatureError> {
        let mut bytes = Vec::new();
        self.canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn stamp(&mut self, cx: f32, cy: f32) {
        let radius = PEN_WIDTH_PX / 2.0;
        let ink = Rgba([self.pen.r, self.pen.g, self.pen.b, 255]);

        let min_x = (cx - radius).floor().max(0.0) as u32;
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_x = ((cx + radius).ceil().max(0.0) as u32).min(PAD_WIDTH_PX.saturating_sub(1));
        let max_y = ((cy + radius).ceil().max(0.0) as u32).min(PAD_HEIGHT_PX.saturating_sub(1));

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.canvas.put_pixel(px, py, ink);
                }
            }
        }
    }
}

/// Part of the segment that can leave ink on the pad, pen width included.
fn clip_to_pad(from: (f32, f32), to: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
    let margin = PEN_WIDTH_PX;
    let (min_x, min_y) = (-margin, -margin);
    let (max_x, max_y) = (PAD_WIDTH_PX as f32 + margin, PAD_HEIGHT_PX as f32 + margin);
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);

    let mut enter = 0.0_f32;
    let mut leave = 1.0_f32;
    for (direction, room) in
        [(-dx, from.0 - min_x), (dx, max_x - from.0), (-dy, from.1 - min_y), (dy, max_y - from.1)]
    {
        if direction == 0.0 {
            if room < 0.0 {
                return None;
            }
            continue;
        }

        let t = room / direction;
        if direction < 0.0 {
            enter = enter.max(t);
        } else {
            leave = leave.min(t);
        }
        if enter > leave {
            return None;
        }
    }

    Some(((from.0 + dx * enter, from.1 + dy * enter), (from.0 + dx * leave, from.1 + dy * leave)))
}

impl SignaturePad for StrokePad {
    fn is_empty(&self) -> bool {
        self.strokes == 0
    }

    fn to_raster(&self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }

        match self.encode_png() {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    fn clear(&mut self) {
        self.canvas = RgbaImage::new(PAD_WIDTH_PX, PAD_HEIGHT_PX);
        self.strokes = 0;
        self.last_point = None;
    }
}
