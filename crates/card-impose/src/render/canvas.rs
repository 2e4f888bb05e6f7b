//! Pixel-space helpers for the sheet canvas

use crate::layout::Rect;
use image::{Rgb, RgbImage};

/// A rectangle snapped to the pixel grid
///
/// Edges are rounded independently so neighbouring rectangles that share a
/// physical edge also share a pixel edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn from_rect(rect: &Rect, dpi: u32) -> Self {
        let x = rect.left().to_pixels(dpi);
        let y = rect.top().to_pixels(dpi);
        Self {
            x,
            y,
            width: rect.right().to_pixels(dpi).saturating_sub(x),
            height: rect.bottom().to_pixels(dpi).saturating_sub(y),
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// The same rectangle reflected about the vertical centre line
    pub fn mirrored(self, canvas_width: u32) -> Self {
        Self {
            x: canvas_width.saturating_sub(self.right()),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Fill `[x0, x1) x [y0, y1)`, clipped to the canvas
pub fn fill(canvas: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
    let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

pub fn fill_rect(canvas: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    fill(
        canvas,
        rect.x as i64,
        rect.y as i64,
        rect.right() as i64,
        rect.bottom() as i64,
        color,
    );
}

/// Outline drawn inside the rectangle
pub fn stroke_rect(canvas: &mut RgbImage, rect: PixelRect, stroke: u32, color: Rgb<u8>) {
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    let (x1, y1) = (rect.right() as i64, rect.bottom() as i64);
    let s = stroke as i64;
    fill(canvas, x0, y0, x1, y0 + s, color);
    fill(canvas, x0, y1 - s, x1, y1, color);
    fill(canvas, x0, y0, x0 + s, y1, color);
    fill(canvas, x1 - s, y0, x1, y1, color);
}

/// Circle outline centred on `(cx, cy)`
pub fn stroke_circle(
    canvas: &mut RgbImage,
    (cx, cy): (i64, i64),
    radius: i64,
    stroke: u32,
    color: Rgb<u8>,
) {
    let outer = radius * radius;
    let inner = (radius - stroke as i64).max(0).pow(2);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d = dx * dx + dy * dy;
            if d <= outer && d >= inner {
                fill(canvas, cx + dx, cy + dy, cx + dx + 1, cy + dy + 1, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Length;

    #[test]
    fn test_shared_edges_snap_together() {
        let mm = Length::from_mm;
        let a = PixelRect::from_rect(&Rect::new(mm(0.0), mm(0.0), mm(10.1), mm(5.0)), 300);
        let b = PixelRect::from_rect(&Rect::new(mm(10.1), mm(0.0), mm(10.1), mm(5.0)), 300);
        assert_eq!(a.right(), b.x);
    }

    #[test]
    fn test_fill_is_clipped() {
        let mut canvas = RgbImage::new(4, 4);
        fill(&mut canvas, -2, -2, 2, 2, Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_mirrored() {
        let r = PixelRect { x: 10, y: 5, width: 20, height: 8 };
        assert_eq!(r.mirrored(100).x, 70);
    }
}
