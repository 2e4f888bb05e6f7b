//! Printer's marks drawn onto rendered sheets
//!
//! Marks are rasterized straight into the sheet canvas: crop marks at each
//! card's trim corners, registration targets in the sheet margins and an
//! optional outline around every bleed box.

use crate::constants::{
    CROP_MARK_GAP_MM, CROP_MARK_LENGTH_MM, DEFAULT_DPI, MARK_STROKE_PX,
    REGISTRATION_MARK_RADIUS_MM, mm_to_px,
};
use crate::layout::Sheet;
use crate::render::{PixelRect, fill, stroke_circle, stroke_rect};
use crate::types::{SheetMarks, SheetSide};
use image::{Rgb, RgbImage};

/// Registration colour: every ink at full strength
const REGISTRATION: Rgb<u8> = Rgb([0, 0, 0]);

/// Outline colour for bleed boxes
const OUTLINE: Rgb<u8> = Rgb([0, 0, 255]);

/// Stroke width scaled to the render resolution
pub fn stroke_width(dpi: u32) -> u32 {
    (MARK_STROKE_PX * dpi / DEFAULT_DPI).max(1)
}

/// Draw the requested marks for one side of a sheet
///
/// Back sides only carry registration marks, mirrored with the artwork.
pub fn draw_marks(
    canvas: &mut RgbImage,
    sheet: &Sheet,
    marks: &SheetMarks,
    dpi: u32,
    side: SheetSide,
) {
    let stroke = stroke_width(dpi);

    if side == SheetSide::Front {
        if marks.reference_outline {
            for card in &sheet.cards {
                let rect = PixelRect::from_rect(&card.bounds(), dpi);
                stroke_rect(canvas, rect, stroke, OUTLINE);
            }
        }
        if marks.crop_marks {
            for card in &sheet.cards {
                draw_crop_marks(canvas, PixelRect::from_rect(&card.trim_box(), dpi), dpi, stroke);
            }
        }
    }

    if marks.registration_marks {
        draw_registration_marks(canvas, sheet, dpi, stroke, side == SheetSide::Back);
    }
}

/// L-shaped marks pointing away from each trim corner
fn draw_crop_marks(canvas: &mut RgbImage, trim: PixelRect, dpi: u32, stroke: u32) {
    let gap = mm_to_px(CROP_MARK_GAP_MM, dpi).round() as i64;
    let len = mm_to_px(CROP_MARK_LENGTH_MM, dpi).round() as i64;
    let s = stroke as i64;
    let half = s / 2;

    let (left, top) = (trim.x as i64, trim.y as i64);
    let (right, bottom) = (trim.right() as i64, trim.bottom() as i64);

    for &y in &[top, bottom] {
        // Horizontal ticks continuing the top and bottom trim lines
        fill(canvas, left - gap - len, y - half, left - gap, y - half + s, REGISTRATION);
        fill(canvas, right + gap, y - half, right + gap + len, y - half + s, REGISTRATION);
    }
    for &x in &[left, right] {
        // Vertical ticks continuing the left and right trim lines
        fill(canvas, x - half, top - gap - len, x - half + s, top - gap, REGISTRATION);
        fill(canvas, x - half, bottom + gap, x - half + s, bottom + gap + len, REGISTRATION);
    }
}

/// Cross-hair targets centred in each of the four margins
fn draw_registration_marks(
    canvas: &mut RgbImage,
    sheet: &Sheet,
    dpi: u32,
    stroke: u32,
    mirror: bool,
) {
    let width = canvas.width() as i64;
    let printable = PixelRect::from_rect(&sheet.printable, dpi);
    let radius = mm_to_px(REGISTRATION_MARK_RADIUS_MM, dpi).round() as i64;
    let (cx, cy) = (
        (printable.x + printable.width / 2) as i64,
        (printable.y + printable.height / 2) as i64,
    );

    let height = canvas.height() as i64;
    let (top, bottom) = (printable.y as i64, printable.bottom() as i64);
    let (left, right) = (printable.x as i64, printable.right() as i64);

    // (centre, width of the margin the mark sits in)
    let marks = [
        ((cx, top / 2), top),
        ((cx, (bottom + height) / 2), height - bottom),
        ((left / 2, cy), left),
        (((right + width) / 2, cy), width - right),
    ];

    let s = stroke as i64;
    for ((x, y), margin) in marks {
        // Keep a stroke's width of paper between the mark and the printable area
        let reach = (radius + radius / 2).min(margin / 2 - s);
        if reach <= s {
            continue;
        }
        let radius = radius.min(reach);
        let x = if mirror { width - 1 - x } else { x };
        stroke_circle(canvas, (x, y), radius, stroke, REGISTRATION);
        fill(canvas, x - reach, y - s / 2, x + reach + 1, y - s / 2 + s, REGISTRATION);
        fill(canvas, x - s / 2, y - reach, x - s / 2 + s, y + reach + 1, REGISTRATION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Length, PlacedCard, Point, Rect, Shelf, Size};
    use crate::types::CardId;

    fn sheet() -> Sheet {
        let mm = Length::from_mm;
        Sheet {
            index: 0,
            size: Size::new(mm(50.8), mm(50.8)),
            printable: Rect::new(mm(8.0), mm(8.0), mm(34.8), mm(34.8)),
            gutter: Length::ZERO,
            shelves: vec![Shelf { top: mm(10.0), height: mm(20.0) }],
            cards: vec![PlacedCard {
                card_id: CardId::new("a"),
                origin: Point::new(mm(10.0), mm(10.0)),
                rotated: false,
                size: Size::new(mm(20.0), mm(20.0)),
                bleed: mm(2.0),
                shelf: 0,
            }],
        }
    }

    fn inked(canvas: &RgbImage) -> usize {
        canvas.pixels().filter(|p| p.0 != [255, 255, 255]).count()
    }

    #[test]
    fn test_no_marks_leaves_canvas_untouched() {
        let mut canvas = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
        draw_marks(&mut canvas, &sheet(), &SheetMarks::default(), 300, SheetSide::Front);
        assert_eq!(inked(&canvas), 0);
    }

    #[test]
    fn test_crop_marks_stay_outside_trim() {
        let mut canvas = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
        let marks = SheetMarks {
            crop_marks: true,
            ..SheetMarks::default()
        };
        draw_marks(&mut canvas, &sheet(), &marks, 300, SheetSide::Front);
        assert!(inked(&canvas) > 0);

        let trim = PixelRect::from_rect(&sheet().cards[0].trim_box(), 300);
        for y in trim.y + 2..trim.bottom() - 2 {
            for x in trim.x + 2..trim.right() - 2 {
                assert_eq!(canvas.get_pixel(x, y).0, [255, 255, 255]);
            }
        }
    }

    #[test]
    fn test_back_side_skips_card_marks() {
        let mut canvas = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
        let marks = SheetMarks {
            crop_marks: true,
            reference_outline: true,
            registration_marks: false,
        };
        draw_marks(&mut canvas, &sheet(), &marks, 300, SheetSide::Back);
        assert_eq!(inked(&canvas), 0);
    }

    fn narrow_margin_sheet(margin_mm: f64) -> Sheet {
        let mm = Length::from_mm;
        Sheet {
            printable: Rect::new(
                mm(margin_mm),
                mm(margin_mm),
                mm(50.8 - 2.0 * margin_mm),
                mm(50.8 - 2.0 * margin_mm),
            ),
            ..sheet()
        }
    }

    #[test]
    fn test_registration_marks_stay_in_the_margin() {
        let marks = SheetMarks {
            registration_marks: true,
            ..SheetMarks::default()
        };
        // 5mm margins are narrower than a full-size crosshair
        for side in [SheetSide::Front, SheetSide::Back] {
            let sheet = narrow_margin_sheet(5.0);
            let mut canvas = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
            draw_marks(&mut canvas, &sheet, &marks, 300, side);
            assert!(inked(&canvas) > 0);

            let printable = PixelRect::from_rect(&sheet.printable, 300);
            for y in printable.y..printable.bottom() {
                for x in printable.x..printable.right() {
                    assert_eq!(canvas.get_pixel(x, y).0, [255, 255, 255]);
                }
            }
        }

        let mut canvas = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
        draw_marks(&mut canvas, &narrow_margin_sheet(0.2), &marks, 300, SheetSide::Front);
        assert_eq!(inked(&canvas), 0);
    }
}
