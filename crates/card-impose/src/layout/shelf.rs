//! Shelf packing session
//!
//! Cards are packed into horizontal bands ("shelves") on each sheet. All
//! packing state lives in a [`ShelfPacker`] value that is created per job and
//! consumed when packing finishes.
//!
//! Gutters are handled by advancing the shelf cursor by `box + gutter`. A box
//! fits when the cursor plus its own width stays inside the printable area,
//! so neighbouring boxes are exactly one gutter apart and no gutter is charged
//! after the last box on a shelf or below the last shelf.

use super::{Length, PlacedCard, Point, Rect, Shelf, Sheet, Size};
use crate::types::CardId;

/// Physical frame every sheet of the job shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SheetFrame {
    pub size: Size,
    pub printable: Rect,
    pub gutter: Length,
}

/// One copy of a card waiting to be placed
#[derive(Debug, Clone)]
pub(crate) struct PlacementRequest {
    /// Position in the expanded input order, used as the final sort key
    pub sequence: usize,
    pub card_id: CardId,
    /// Bleed-inclusive size in the artwork's own orientation
    pub footprint: Size,
    pub bleed: Length,
    pub allow_rotation: bool,
}

impl PlacementRequest {
    /// Sort key: tallest first, then widest, then input order
    fn sort_key(&self) -> (std::cmp::Reverse<Length>, std::cmp::Reverse<Length>, usize) {
        (
            std::cmp::Reverse(self.footprint.height),
            std::cmp::Reverse(self.footprint.width),
            self.sequence,
        )
    }
}

/// Order requests largest-first; stable for identical input
pub(crate) fn sort_requests(requests: &mut [PlacementRequest]) {
    requests.sort_by_key(PlacementRequest::sort_key);
}

/// Why a request could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unplaced {
    /// Larger than the printable area in every allowed orientation
    Oversized,
    /// The job reached its maximum number of sheets
    SheetLimit,
}

/// Result of a finished packing session
#[derive(Debug)]
pub(crate) struct PackOutcome {
    pub sheets: Vec<Sheet>,
    pub unplaced: Vec<(PlacementRequest, Unplaced)>,
}

/// Shelf state of the sheet currently being filled
struct OpenSheet {
    sheet: Sheet,
    /// Consumed width per shelf, measured in pitch (box + gutter)
    used: Vec<Length>,
    /// Consumed height, measured in pitch (shelf + gutter)
    next_top: Length,
}

impl OpenSheet {
    fn new(index: usize, frame: &SheetFrame) -> Self {
        Self {
            sheet: Sheet {
                index,
                size: frame.size,
                printable: frame.printable,
                gutter: frame.gutter,
                shelves: Vec::new(),
                cards: Vec::new(),
            },
            used: Vec::new(),
            next_top: Length::ZERO,
        }
    }

    /// Best-fit shelf: the one with the least remaining width that still fits
    fn best_shelf(&self, frame: &SheetFrame, size: Size) -> Option<usize> {
        let extent = frame.printable.width();
        self.sheet
            .shelves
            .iter()
            .zip(&self.used)
            .enumerate()
            .filter(|(_, (shelf, used))| {
                size.height <= shelf.height && **used + size.width <= extent
            })
            .min_by_key(|(idx, (_, used))| (extent - **used, *idx))
            .map(|(idx, _)| idx)
    }

    fn can_open_shelf(&self, frame: &SheetFrame, size: Size) -> bool {
        size.width <= frame.printable.width()
            && self.next_top + size.height <= frame.printable.height()
    }

    fn open_shelf(&mut self, frame: &SheetFrame, height: Length) -> usize {
        self.sheet.shelves.push(Shelf {
            top: frame.printable.top() + self.next_top,
            height,
        });
        self.used.push(Length::ZERO);
        self.next_top += height + frame.gutter;
        self.sheet.shelves.len() - 1
    }

    fn place(&mut self, frame: &SheetFrame, shelf: usize, request: &PlacementRequest, rotated: bool) {
        let size = if rotated {
            request.footprint.rotated()
        } else {
            request.footprint
        };
        let origin = Point::new(
            frame.printable.left() + self.used[shelf],
            self.sheet.shelves[shelf].top,
        );
        self.used[shelf] += size.width + frame.gutter;
        self.sheet.cards.push(PlacedCard {
            card_id: request.card_id.clone(),
            origin,
            rotated,
            size,
            bleed: request.bleed,
            shelf,
        });
    }

    /// Try existing shelves, then a new shelf, rotating only where the
    /// unrotated footprint does not fit. Returns false when the sheet is full.
    fn try_place(&mut self, frame: &SheetFrame, request: &PlacementRequest, can_rotate: bool) -> bool {
        let upright = request.footprint;
        let turned = upright.rotated();

        if let Some(shelf) = self.best_shelf(frame, upright) {
            self.place(frame, shelf, request, false);
            return true;
        }
        if can_rotate {
            if let Some(shelf) = self.best_shelf(frame, turned) {
                self.place(frame, shelf, request, true);
                return true;
            }
        }
        if self.can_open_shelf(frame, upright) {
            let shelf = self.open_shelf(frame, upright.height);
            self.place(frame, shelf, request, false);
            return true;
        }
        if can_rotate && self.can_open_shelf(frame, turned) {
            let shelf = self.open_shelf(frame, turned.height);
            self.place(frame, shelf, request, true);
            return true;
        }
        false
    }
}

/// Packs requests onto sheets of one frame
pub(crate) struct ShelfPacker {
    frame: SheetFrame,
    rotate_cards: bool,
    max_sheets: Option<usize>,
    closed: Vec<Sheet>,
    current: Option<OpenSheet>,
}

impl ShelfPacker {
    pub fn new(frame: SheetFrame, rotate_cards: bool, max_sheets: Option<usize>) -> Self {
        Self {
            frame,
            rotate_cards,
            max_sheets,
            closed: Vec::new(),
            current: None,
        }
    }

    fn can_rotate(&self, request: &PlacementRequest) -> bool {
        self.rotate_cards && request.allow_rotation
    }

    /// Whether the footprint fits an empty sheet in some allowed orientation
    fn fits_empty_sheet(&self, request: &PlacementRequest) -> bool {
        let area = self.frame.printable.size;
        request.footprint.fits_within(area)
            || (self.can_rotate(request) && request.footprint.rotated().fits_within(area))
    }

    fn sheet_count(&self) -> usize {
        self.closed.len() + usize::from(self.current.is_some())
    }

    fn open_sheet(&mut self) -> bool {
        if self.max_sheets.is_some_and(|max| self.sheet_count() >= max) {
            return false;
        }
        if let Some(open) = self.current.take() {
            self.closed.push(open.sheet);
        }
        self.current = Some(OpenSheet::new(self.closed.len(), &self.frame));
        true
    }

    /// Pack already-sorted requests
    pub fn pack(mut self, requests: Vec<PlacementRequest>) -> PackOutcome {
        let mut unplaced = Vec::new();
        let mut pending = requests.into_iter();

        while let Some(request) = pending.next() {
            if !self.fits_empty_sheet(&request) {
                unplaced.push((request, Unplaced::Oversized));
                continue;
            }

            let can_rotate = self.can_rotate(&request);
            let frame = self.frame;
            let placed = self
                .current
                .as_mut()
                .is_some_and(|open| open.try_place(&frame, &request, can_rotate));
            if placed {
                continue;
            }

            if !self.open_sheet() {
                unplaced.push((request, Unplaced::SheetLimit));
                unplaced.extend(pending.by_ref().map(|r| {
                    let reason = if self.fits_empty_sheet(&r) {
                        Unplaced::SheetLimit
                    } else {
                        Unplaced::Oversized
                    };
                    (r, reason)
                }));
                break;
            }

            if let Some(open) = self.current.as_mut() {
                let fitted = open.try_place(&frame, &request, can_rotate);
                debug_assert!(fitted, "request that fits an empty sheet must fit a new sheet");
            }
        }

        let mut sheets = self.closed;
        if let Some(open) = self.current {
            sheets.push(open.sheet);
        }
        PackOutcome { sheets, unplaced }
    }
}
