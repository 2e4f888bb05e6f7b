//! Placement plan produced by the packer
//!
//! A plan is created once per job and then only read: the renderer and the
//! cut extractor both consume it through shared references.

use super::{Length, Point, Rect, Size};
use crate::types::{CardId, ImposeError, Result};

/// A horizontal band of cards on a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shelf {
    /// Top edge of the band (sheet coordinates)
    pub top: Length,
    /// Height of the tallest box placed on the band
    pub height: Length,
}

impl Shelf {
    pub fn bottom(&self) -> Length {
        self.top + self.height
    }
}

/// One copy of a card placed on a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCard {
    pub card_id: CardId,
    /// Top-left corner of the bleed box
    pub origin: Point,
    /// Turned 90 degrees clockwise relative to the source artwork
    pub rotated: bool,
    /// Bleed-inclusive size as placed (already swapped when rotated)
    pub size: Size,
    pub bleed: Length,
    /// Index into [`Sheet::shelves`]
    pub shelf: usize,
}

impl PlacedCard {
    /// Bleed-inclusive bounding box
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// The finished card after the bleed is cut away
    pub fn trim_box(&self) -> Rect {
        self.bounds().deflate(self.bleed)
    }
}

/// One output sheet and everything placed on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// Zero-based position within the plan
    pub index: usize,
    /// Physical sheet size as laid out
    pub size: Size,
    /// Area inside the outer margins
    pub printable: Rect,
    /// Minimum spacing between neighbouring boxes
    pub gutter: Length,
    pub shelves: Vec<Shelf>,
    /// Cards in placement order
    pub cards: Vec<PlacedCard>,
}

impl Sheet {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Cards sitting on the given shelf, left to right
    pub fn cards_on_shelf(&self, shelf: usize) -> Vec<&PlacedCard> {
        let mut cards: Vec<&PlacedCard> = self.cards.iter().filter(|c| c.shelf == shelf).collect();
        cards.sort_by_key(|c| c.origin.x);
        cards
    }

    /// Fraction of the printable area covered by bleed boxes
    pub fn utilization(&self) -> f64 {
        let printable = self.printable.size.area_mm2();
        if printable <= 0.0 {
            return 0.0;
        }
        self.cards.iter().map(|c| c.size.area_mm2()).sum::<f64>() / printable
    }

    /// Check the containment and spacing invariants of this sheet
    pub fn verify(&self) -> Result<()> {
        for (i, card) in self.cards.iter().enumerate() {
            let bounds = card.bounds();
            if !self.printable.contains(&bounds) {
                return Err(ImposeError::Validation(format!(
                    "Sheet {}: card {} at {:?} leaves the printable area",
                    self.index, card.card_id, card.origin
                )));
            }
            for other in &self.cards[i + 1..] {
                if !bounds.separated_by(&other.bounds(), self.gutter) {
                    return Err(ImposeError::Validation(format!(
                        "Sheet {}: cards {} and {} overlap",
                        self.index, card.card_id, other.card_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// All sheets of a job in output order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlacementPlan {
    pub sheets: Vec<Sheet>,
    /// The sheet was laid out in the opposite orientation to the one requested
    pub sheet_rotated: bool,
}

impl PlacementPlan {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn card_count(&self) -> usize {
        self.sheets.iter().map(Sheet::card_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Check every sheet's invariants
    pub fn verify(&self) -> Result<()> {
        self.sheets.iter().try_for_each(Sheet::verify)
    }
}
