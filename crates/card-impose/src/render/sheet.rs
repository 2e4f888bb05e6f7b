//! Sheet compositing
//!
//! Each placed card's artwork is scaled to fill its box, centre-cropped and
//! pasted at its pixel position. Rotated cards are turned 90 degrees
//! clockwise. Back sheets are mirrored left to right so that fronts and
//! backs line up after a long-edge flip.

use super::canvas::{PixelRect, fill_rect};
use crate::cancel::CancelToken;
use crate::layout::{PlacedCard, PlacementPlan, Sheet};
use crate::marks::draw_marks;
use crate::options::RenderOptions;
use crate::types::*;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;

/// Decoded artwork of one card design
#[derive(Debug, Clone)]
pub struct CardArt {
    pub front: DynamicImage,
    pub back: Option<DynamicImage>,
    /// Dimensions promised by the manifest
    pub expected: (u32, u32),
}

impl CardArt {
    pub fn new(front: DynamicImage, expected: (u32, u32)) -> Self {
        Self {
            front,
            back: None,
            expected,
        }
    }

    pub fn with_back(mut self, back: DynamicImage) -> Self {
        self.back = Some(back);
        self
    }

    /// Check the decoded front image against the manifest
    pub fn check(&self, card_id: &CardId) -> Result<()> {
        let actual = (self.front.width(), self.front.height());
        if actual != self.expected {
            return Err(ImposeError::AssetMissing {
                card_id: card_id.clone(),
                reason: format!(
                    "image is {}x{} px, manifest says {}x{} px",
                    actual.0, actual.1, self.expected.0, self.expected.1
                ),
            });
        }
        Ok(())
    }
}

/// Artwork by card, shared read-only between sheet tasks
pub type AssetMap = HashMap<CardId, CardArt>;

/// One rendered side of a sheet
#[derive(Debug, Clone)]
pub struct SheetImage {
    pub sheet_index: usize,
    pub side: SheetSide,
    pub dpi: u32,
    pub image: RgbImage,
    /// Cards whose slot was left blank
    pub skipped: Vec<CardId>,
}

/// Renders sheets with a fixed asset map, options and failure policy
#[derive(Debug, Clone)]
pub struct SheetRenderer<'a> {
    assets: &'a AssetMap,
    options: &'a RenderOptions,
    policy: FailurePolicy,
    cancel: CancelToken,
}

impl<'a> SheetRenderer<'a> {
    pub fn new(assets: &'a AssetMap, options: &'a RenderOptions) -> Self {
        Self {
            assets,
            options,
            policy: FailurePolicy::Abort,
            cancel: CancelToken::new(),
        }
    }

    /// What to do with cards whose artwork is missing or wrong
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Render one side of a sheet
    pub fn render(&self, sheet: &Sheet, side: SheetSide) -> Result<SheetImage> {
        let dpi = self.options.dpi;
        let width = sheet.size.width.to_pixels(dpi);
        let height = sheet.size.height.to_pixels(dpi);
        if width == 0 || height == 0 {
            return Err(ImposeError::Render(format!(
                "Sheet {} has no pixels at {} DPI",
                sheet.index + 1,
                dpi
            )));
        }

        let mut canvas = RgbImage::from_pixel(width, height, Rgb(self.options.background));
        let mut skipped = Vec::new();

        for card in &sheet.cards {
            self.cancel.checkpoint()?;
            match self.composite(&mut canvas, card, side) {
                Ok(()) => {}
                Err(e @ ImposeError::AssetMissing { .. }) if self.policy == FailurePolicy::Skip => {
                    log::warn!("Sheet {}: {}", sheet.index + 1, e);
                    skipped.push(card.card_id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        if self.options.marks.any() {
            draw_marks(&mut canvas, sheet, &self.options.marks, dpi, side);
        }

        log::debug!(
            "Rendered sheet {} ({:?}) at {}x{} px",
            sheet.index + 1,
            side,
            width,
            height
        );

        Ok(SheetImage {
            sheet_index: sheet.index,
            side,
            dpi,
            image: canvas,
            skipped,
        })
    }

    /// Render fronts, and backs when duplex is enabled, in sheet order
    pub fn render_plan(&self, plan: &PlacementPlan) -> Result<Vec<SheetImage>> {
        let mut images = Vec::new();
        for sheet in &plan.sheets {
            self.cancel.checkpoint()?;
            images.push(self.render(sheet, SheetSide::Front)?);
            if self.options.duplex {
                images.push(self.render(sheet, SheetSide::Back)?);
            }
        }
        Ok(images)
    }

    fn composite(&self, canvas: &mut RgbImage, card: &PlacedCard, side: SheetSide) -> Result<()> {
        let art = self
            .assets
            .get(&card.card_id)
            .ok_or_else(|| ImposeError::AssetMissing {
                card_id: card.card_id.clone(),
                reason: "no artwork was resolved".to_string(),
            })?;
        art.check(&card.card_id)?;

        let source = match side {
            SheetSide::Front => &art.front,
            SheetSide::Back => match &art.back {
                Some(back) => back,
                // Plain back: leave the paper showing
                None => return Ok(()),
            },
        };

        let dpi = self.options.dpi;
        let canvas_width = canvas.width();
        let place = |rect: PixelRect| match side {
            SheetSide::Front => rect,
            SheetSide::Back => rect.mirrored(canvas_width),
        };

        let bleed_box = place(PixelRect::from_rect(&card.bounds(), dpi));
        let target = match self.options.bleed_source {
            BleedSource::Included => bleed_box,
            BleedSource::Generated => {
                fill_rect(canvas, bleed_box, Rgb(self.options.bleed_color));
                place(PixelRect::from_rect(&card.trim_box(), dpi))
            }
        };
        if target.is_empty() {
            return Err(ImposeError::Render(format!(
                "Card {} is smaller than one pixel at {} DPI",
                card.card_id, dpi
            )));
        }

        let tile = fit_artwork(source, target, card.rotated, side);
        imageops::overlay(canvas, &tile, target.x as i64, target.y as i64);
        Ok(())
    }
}

/// Scale to fill, centre-crop and orient artwork for a target box
fn fit_artwork(source: &DynamicImage, target: PixelRect, rotated: bool, side: SheetSide) -> RgbImage {
    if !rotated {
        return source
            .resize_to_fill(target.width, target.height, FilterType::Lanczos3)
            .to_rgb8();
    }
    // Fill the unrotated box, then turn it into place
    let upright = source.resize_to_fill(target.height, target.width, FilterType::Lanczos3);
    match side {
        SheetSide::Front => upright.rotate90().to_rgb8(),
        // Mirroring a clockwise turn gives a counter-clockwise one
        SheetSide::Back => upright.rotate270().to_rgb8(),
    }
}

/// Render the front of one sheet, failing on any missing artwork
pub fn render_sheet(sheet: &Sheet, assets: &AssetMap, options: &RenderOptions) -> Result<SheetImage> {
    SheetRenderer::new(assets, options).render(sheet, SheetSide::Front)
}

/// Render every sheet of a plan, failing on any missing artwork
pub fn render_plan(
    plan: &PlacementPlan,
    assets: &AssetMap,
    options: &RenderOptions,
) -> Result<Vec<SheetImage>> {
    SheetRenderer::new(assets, options).render_plan(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Length, Point, Rect, Shelf, Size};

    fn mm(v: f64) -> Length {
        Length::from_mm(v)
    }

    // 25.4mm at 100 DPI is 100 px, which keeps the pixel maths readable
    fn sheet(rotated: bool) -> Sheet {
        let size = if rotated {
            Size::new(mm(12.7), mm(7.62))
        } else {
            Size::new(mm(7.62), mm(12.7))
        };
        Sheet {
            index: 0,
            size: Size::new(mm(25.4), mm(25.4)),
            printable: Rect::new(mm(2.54), mm(2.54), mm(20.32), mm(20.32)),
            gutter: Length::ZERO,
            shelves: vec![Shelf { top: mm(2.54), height: size.height }],
            cards: vec![PlacedCard {
                card_id: CardId::new("a"),
                origin: Point::new(mm(2.54), mm(2.54)),
                rotated,
                size,
                bleed: mm(1.27),
                shelf: 0,
            }],
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            dpi: 100,
            ..RenderOptions::default()
        }
    }

    fn red_art() -> CardArt {
        let img = RgbImage::from_pixel(30, 50, Rgb([255, 0, 0]));
        CardArt::new(DynamicImage::ImageRgb8(img), (30, 50))
    }

    #[test]
    fn test_card_fills_its_bleed_box() {
        let assets = AssetMap::from([(CardId::new("a"), red_art())]);
        let image = render_sheet(&sheet(false), &assets, &options()).unwrap();

        assert_eq!(image.image.dimensions(), (100, 100));
        // bleed box spans x 10..40, y 10..60
        assert_eq!(image.image.get_pixel(10, 10).0, [255, 0, 0]);
        assert_eq!(image.image.get_pixel(39, 59).0, [255, 0, 0]);
        assert_eq!(image.image.get_pixel(40, 10).0, [255, 255, 255]);
        assert_eq!(image.image.get_pixel(10, 60).0, [255, 255, 255]);
    }

    #[test]
    fn test_rotated_card_is_turned() {
        let assets = AssetMap::from([(CardId::new("a"), red_art())]);
        let image = render_sheet(&sheet(true), &assets, &options()).unwrap();
        // bleed box spans x 10..60, y 10..40
        assert_eq!(image.image.get_pixel(59, 39).0, [255, 0, 0]);
        assert_eq!(image.image.get_pixel(10, 45).0, [255, 255, 255]);
    }

    #[test]
    fn test_generated_bleed_uses_bleed_colour() {
        let assets = AssetMap::from([(CardId::new("a"), red_art())]);
        let options = RenderOptions {
            bleed_source: BleedSource::Generated,
            ..options()
        };
        let image = render_sheet(&sheet(false), &assets, &options).unwrap();
        assert_eq!(image.image.get_pixel(11, 11).0, [0, 0, 0]);
        assert_eq!(image.image.get_pixel(25, 30).0, [255, 0, 0]);
    }

    #[test]
    fn test_back_is_mirrored() {
        let back = RgbImage::from_pixel(30, 50, Rgb([0, 0, 255]));
        let art = red_art().with_back(DynamicImage::ImageRgb8(back));
        let assets = AssetMap::from([(CardId::new("a"), art)]);
        let image = SheetRenderer::new(&assets, &options())
            .render(&sheet(false), SheetSide::Back)
            .unwrap();
        // front box x 10..40 mirrors to x 60..90
        assert_eq!(image.image.get_pixel(60, 10).0, [0, 0, 255]);
        assert_eq!(image.image.get_pixel(20, 20).0, [255, 255, 255]);
    }

    #[test]
    fn test_missing_asset_follows_policy() {
        let assets = AssetMap::new();
        let err = render_sheet(&sheet(false), &assets, &options()).unwrap_err();
        assert!(matches!(err, ImposeError::AssetMissing { .. }));

        let image = SheetRenderer::new(&assets, &options())
            .policy(FailurePolicy::Skip)
            .render(&sheet(false), SheetSide::Front)
            .unwrap();
        assert_eq!(image.skipped, vec![CardId::new("a")]);
        assert_eq!(image.image.get_pixel(20, 20).0, [255, 255, 255]);
    }

    #[test]
    fn test_dimension_mismatch_is_missing_asset() {
        let mut art = red_art();
        art.expected = (31, 50);
        let assets = AssetMap::from([(CardId::new("a"), art)]);
        let err = render_sheet(&sheet(false), &assets, &options()).unwrap_err();
        assert!(matches!(err, ImposeError::AssetMissing { .. }));
    }

    #[test]
    fn test_cancelled_render_stops() {
        let assets = AssetMap::from([(CardId::new("a"), red_art())]);
        let options = options();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = SheetRenderer::new(&assets, &options)
            .cancel_token(cancel)
            .render(&sheet(false), SheetSide::Front)
            .unwrap_err();
        assert!(matches!(err, ImposeError::Cancelled));
    }
}
