//! Coordinate spaces shared by capture, overlay and export.
//!
//! Three spaces are in play:
//! - screen: pointer pixels, top-left origin, scaled by the current zoom
//! - page: unscaled units relative to the page's top-left corner, y down
//! - export: unscaled units relative to the page's bottom-left corner, y up
//!
//! Every stored annotation coordinate is in page space. Rendering at another
//! zoom or exporting only ever needs a forward transform from it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page space. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width: width.max(0.0), height: height.max(0.0) }
    }

    /// Zero-size rectangle sitting on `point`.
    pub fn at(point: PagePoint) -> Self {
        Self { x: point.x, y: point.y, width: 0.0, height: 0.0 }
    }

    /// Rectangle spanned by two corners in any order.
    pub fn spanning(a: PagePoint, b: PagePoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Zero width or zero height means the rectangle would be invisible.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, point: PagePoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Screen-space position of the rendered page surface and its zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSurface {
    pub page: u32,
    pub origin: ScreenPoint,
    pub scale: f32,
}

impl PageSurface {
    pub fn new(page: u32, origin: ScreenPoint, scale: f32) -> Self {
        Self { page, origin, scale }
    }

    pub fn to_page_space(&self, pointer: ScreenPoint) -> PagePoint {
        to_page_space(pointer, self.origin, self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPoint {
    pub x: f32,
    pub y: f32,
}

/// Rectangle in export space. `x`/`y` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn to_page_space(pointer: ScreenPoint, page_origin: ScreenPoint, scale: f32) -> PagePoint {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    PagePoint { x: (pointer.x - page_origin.x) / scale, y: (pointer.y - page_origin.y) / scale }
}

pub fn to_export_point(point: PagePoint, page_height: f32) -> ExportPoint {
    ExportPoint { x: point.x, y: page_height - point.y }
}

/// Flips a page-space rectangle so its top edge stays where it was drawn.
pub fn to_export_rect(rect: PageRect, page_height: f32) -> ExportRect {
    ExportRect {
        x: rect.x,
        y: page_height - rect.y - rect.height,
        width: rect.width,
        height: rect.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_space_removes_origin_then_scale() {
        let origin = ScreenPoint::new(50.0, 40.0);
        let point = to_page_space(ScreenPoint::new(250.0, 140.0), origin, 2.0);
        assert_eq!(point, PagePoint::new(100.0, 50.0));
    }

    #[test]
    fn page_space_is_zoom_invariant() {
        let origin = ScreenPoint::new(10.0, 20.0);
        let at_half = to_page_space(ScreenPoint::new(60.0, 45.0), origin, 0.5);
        let at_double = to_page_space(ScreenPoint::new(210.0, 120.0), origin, 2.0);
        assert_eq!(at_half, at_double);
    }

    #[test]
    fn non_positive_scale_falls_back_to_identity() {
        let point = to_page_space(ScreenPoint::new(30.0, 30.0), ScreenPoint::default(), 0.0);
        assert_eq!(point, PagePoint::new(30.0, 30.0));
    }

    #[test]
    fn export_point_flips_y_axis() {
        let exported = to_export_point(PagePoint::new(100.0, 50.0), 800.0);
        assert_eq!(exported, ExportPoint { x: 100.0, y: 750.0 });
    }

    #[test]
    fn export_rect_keeps_top_edge_anchored() {
        let exported = to_export_rect(PageRect::new(50.0, 50.0, 100.0, 40.0), 800.0);
        assert_eq!(exported, ExportRect { x: 50.0, y: 710.0, width: 100.0, height: 40.0 });
        assert_eq!(exported.y + exported.height, 800.0 - 50.0);
    }

    #[test]
    fn spanning_normalizes_corner_order() {
        let rect = PageRect::spanning(PagePoint::new(150.0, 90.0), PagePoint::new(50.0, 50.0));
        assert_eq!(rect, PageRect::new(50.0, 50.0, 100.0, 40.0));
    }

    #[test]
    fn zero_width_or_height_has_no_area() {
        assert!(!PageRect::new(0.0, 0.0, 10.0, 0.0).has_area());
        assert!(!PageRect::new(0.0, 0.0, 0.0, 10.0).has_area());
        assert!(PageRect::new(0.0, 0.0, 0.5, 0.5).has_area());
    }

    #[test]
    fn negative_sizes_are_clamped() {
        let rect = PageRect::new(5.0, 5.0, -3.0, -1.0);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
    }
}
