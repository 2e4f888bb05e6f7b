//! Cut-path extraction
//!
//! Shelf packing leaves cards on axis-aligned bands, so a sheet can be cut
//! apart with guillotine cuts in two passes:
//! - pass 0: full-length horizontal cuts at every shelf band boundary
//! - pass 1: vertical cuts at every card boundary, bounded to their band
//!
//! After both passes every card sits alone in its own cell. The trim
//! contours of the individual cards are listed alongside the cuts.

use crate::layout::{Length, PlacedCard, Rect, Sheet, Size};
use crate::types::CardId;
use std::collections::BTreeSet;

/// Pass index of the full-length horizontal cuts
pub const HORIZONTAL_PASS: usize = 0;

/// Pass index of the lane-bounded vertical cuts
pub const VERTICAL_PASS: usize = 1;

/// Direction of a cut line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutAxis {
    /// Runs left to right at a fixed y
    Horizontal,
    /// Runs top to bottom at a fixed x
    Vertical,
}

/// Whether a cut separates cards or only removes outer waste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutKind {
    /// Outermost cut of its pass or band (sheet trim)
    Edge,
    /// Cut between cards
    Internal,
}

/// One straight cut in sheet coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutSegment {
    /// Position in the sheet's cut sequence
    pub order: usize,
    /// Depth of the guillotine pass
    pub pass: usize,
    pub axis: CutAxis,
    /// y for horizontal cuts, x for vertical cuts
    pub position: Length,
    /// Extent along the cut line
    pub start: Length,
    pub end: Length,
    /// Shelf band a vertical cut is bounded to
    pub band: Option<usize>,
    pub kind: CutKind,
}

impl CutSegment {
    pub fn length(&self) -> Length {
        self.end - self.start
    }
}

/// Finished outline of one placed card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimContour {
    pub card_id: CardId,
    pub rect: Rect,
}

/// Cut geometry of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutGeometry {
    pub sheet_index: usize,
    pub sheet_size: Size,
    pub cuts: Vec<CutSegment>,
    pub trims: Vec<TrimContour>,
}

impl CutGeometry {
    pub fn cut_count(&self) -> usize {
        self.cuts.len()
    }

    pub fn internal_cuts(&self) -> impl Iterator<Item = &CutSegment> {
        self.cuts.iter().filter(|c| c.kind == CutKind::Internal)
    }

    /// Positions of the horizontal pass, top to bottom
    pub fn horizontal_positions(&self) -> Vec<Length> {
        self.cuts
            .iter()
            .filter(|c| c.axis == CutAxis::Horizontal)
            .map(|c| c.position)
            .collect()
    }

    /// Positions of the vertical cuts inside one band, left to right
    pub fn vertical_positions(&self, band: usize) -> Vec<Length> {
        self.cuts
            .iter()
            .filter(|c| c.axis == CutAxis::Vertical && c.band == Some(band))
            .map(|c| c.position)
            .collect()
    }

    /// Total length of all cut lines
    pub fn total_cut_length(&self) -> Length {
        self.cuts.iter().map(CutSegment::length).sum()
    }
}

/// Derive the guillotine cut sequence for one sheet
pub fn extract_cuts(sheet: &Sheet) -> CutGeometry {
    let mut cuts = Vec::new();

    // Shelves are created top to bottom, but sort anyway so the order only
    // depends on geometry.
    let mut bands: Vec<usize> = (0..sheet.shelves.len())
        .filter(|&idx| sheet.cards.iter().any(|c| c.shelf == idx))
        .collect();
    bands.sort_by_key(|&idx| (sheet.shelves[idx].top, idx));

    let horizontal: BTreeSet<Length> = bands
        .iter()
        .flat_map(|&idx| {
            let shelf = &sheet.shelves[idx];
            [shelf.top, shelf.bottom()]
        })
        .collect();
    push_pass(
        &mut cuts,
        HORIZONTAL_PASS,
        CutAxis::Horizontal,
        &horizontal,
        (Length::ZERO, sheet.size.width),
        None,
    );

    for &idx in &bands {
        let shelf = &sheet.shelves[idx];
        let vertical: BTreeSet<Length> = sheet
            .cards
            .iter()
            .filter(|c| c.shelf == idx)
            .flat_map(|c| [c.bounds().left(), c.bounds().right()])
            .collect();
        push_pass(
            &mut cuts,
            VERTICAL_PASS,
            CutAxis::Vertical,
            &vertical,
            (shelf.top, shelf.bottom()),
            Some(idx),
        );
    }

    CutGeometry {
        sheet_index: sheet.index,
        sheet_size: sheet.size,
        cuts,
        trims: sheet.cards.iter().map(trim_contour).collect(),
    }
}

fn push_pass(
    cuts: &mut Vec<CutSegment>,
    pass: usize,
    axis: CutAxis,
    positions: &BTreeSet<Length>,
    (start, end): (Length, Length),
    band: Option<usize>,
) {
    let first = positions.first().copied();
    let last = positions.last().copied();
    for &position in positions {
        let kind = if Some(position) == first || Some(position) == last {
            CutKind::Edge
        } else {
            CutKind::Internal
        };
        cuts.push(CutSegment {
            order: cuts.len(),
            pass,
            axis,
            position,
            start,
            end,
            band,
            kind,
        });
    }
}

fn trim_contour(card: &PlacedCard) -> TrimContour {
    TrimContour {
        card_id: card.card_id.clone(),
        rect: card.trim_box(),
    }
}
