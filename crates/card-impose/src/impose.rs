//! Card imposition - arranging card copies onto press sheets
//!
//! This module drives the packing pass:
//! 1. Validate the sheet and the card list
//! 2. Expand each card into one placement request per copy
//! 3. Sort requests largest-first (stable on input order)
//! 4. Shelf-pack onto as many sheets as needed (or allowed)
//! 5. Record every copy that could not be placed in the job report

use crate::layout::{
    PackOutcome, PlacementPlan, PlacementRequest, SheetFrame, ShelfPacker, Unplaced, sort_requests,
};
use crate::manifest::CardAsset;
use crate::options::SheetSpec;
use crate::report::{JobReport, SkipReason};
use crate::types::*;
use std::collections::HashSet;

/// Pack cards onto sheets.
///
/// Copies that cannot be placed are left out of the plan and listed in the
/// returned report as capacity failures. Identical input always produces an
/// identical plan.
pub fn impose(cards: &[CardAsset], spec: &SheetSpec) -> Result<(PlacementPlan, JobReport)> {
    spec.validate()?;
    validate_cards(cards)?;

    let mut requests = expand_requests(cards);
    sort_requests(&mut requests);

    let as_given = pack(spec, requests.clone());
    let (outcome, sheet_rotated) = if spec.orientation.allows_sheet_rotation() {
        let turned = pack(&spec.rotated(), requests);
        if prefer(&turned, &as_given) {
            (turned, true)
        } else {
            (as_given, false)
        }
    } else {
        (as_given, false)
    };

    let requested = cards.iter().map(|c| c.quantity).sum();
    let mut report = JobReport::new(requested);
    for (request, reason) in &outcome.unplaced {
        let reason = match reason {
            Unplaced::Oversized => SkipReason::Oversized,
            Unplaced::SheetLimit => SkipReason::SheetLimit,
        };
        report.record_skip(&request.card_id, reason, 1);
    }

    let plan = PlacementPlan {
        sheets: outcome.sheets,
        sheet_rotated,
    };
    report.placed = plan.card_count();
    report.sheets_used = plan.sheet_count();

    log::debug!(
        "Imposed {} of {} cards on {} sheet(s){}",
        report.placed,
        report.requested,
        report.sheets_used,
        if sheet_rotated { " (sheet turned)" } else { "" }
    );

    Ok((plan, report))
}

fn validate_cards(cards: &[CardAsset]) -> Result<()> {
    if cards.is_empty() {
        return Err(ImposeError::Validation("No cards to impose".to_string()));
    }
    let mut seen = HashSet::new();
    for card in cards {
        card.validate()?;
        if !seen.insert(&card.id) {
            return Err(ImposeError::Validation(format!(
                "Duplicate card id {}",
                card.id
            )));
        }
    }
    Ok(())
}

/// One request per requested copy, numbered in input order
fn expand_requests(cards: &[CardAsset]) -> Vec<PlacementRequest> {
    cards
        .iter()
        .flat_map(|card| std::iter::repeat_n(card, card.quantity))
        .enumerate()
        .map(|(sequence, card)| PlacementRequest {
            sequence,
            card_id: card.id.clone(),
            footprint: card.bleed_size(),
            bleed: card.bleed,
            allow_rotation: card.allow_rotation,
        })
        .collect()
}

fn pack(spec: &SheetSpec, requests: Vec<PlacementRequest>) -> PackOutcome {
    let frame = SheetFrame {
        size: spec.size,
        printable: spec.printable_area(),
        gutter: spec.gutter,
    };
    ShelfPacker::new(
        frame,
        spec.orientation.allows_card_rotation(),
        spec.max_sheets,
    )
    .pack(requests)
}

/// More cards placed wins, then fewer sheets; ties keep the given orientation
fn prefer(candidate: &PackOutcome, current: &PackOutcome) -> bool {
    let placed = |o: &PackOutcome| o.sheets.iter().map(|s| s.cards.len()).sum::<usize>();
    (placed(candidate), std::cmp::Reverse(candidate.sheets.len()))
        > (placed(current), std::cmp::Reverse(current.sheets.len()))
}
