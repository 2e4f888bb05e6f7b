//! Job report: what was requested, placed and left out, and why

use crate::types::CardId;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why copies of a card were left out of the job
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "detail"))]
pub enum SkipReason {
    /// Footprint larger than the printable area in every allowed orientation
    Oversized,
    /// The job reached its maximum sheet count
    SheetLimit,
    /// Image unavailable or not matching the manifest
    AssetMissing(String),
}

impl SkipReason {
    /// Capacity failures (oversized card or sheet limit)
    pub fn is_capacity(&self) -> bool {
        matches!(self, SkipReason::Oversized | SkipReason::SheetLimit)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Oversized => {
                write!(f, "CapacityError: footprint exceeds the printable area")
            }
            SkipReason::SheetLimit => write!(f, "CapacityError: maximum sheet count reached"),
            SkipReason::AssetMissing(detail) => write!(f, "AssetMissingError: {}", detail),
        }
    }
}

/// Copies of one card that were not placed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkippedCard {
    pub card_id: CardId,
    pub reason: SkipReason,
    /// Number of copies affected
    pub count: usize,
}

/// Summary of a job, produced even when the job fails part way
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobReport {
    /// Copies requested by the manifest
    pub requested: usize,
    /// Copies present in the final plan
    pub placed: usize,
    pub skipped: Vec<SkippedCard>,
    pub sheets_used: usize,
}

impl JobReport {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    /// Record skipped copies, merging with an existing entry for the same
    /// card and reason
    pub fn record_skip(&mut self, card_id: &CardId, reason: SkipReason, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(entry) = self
            .skipped
            .iter_mut()
            .find(|s| &s.card_id == card_id && s.reason == reason)
        {
            entry.count += count;
        } else {
            self.skipped.push(SkippedCard {
                card_id: card_id.clone(),
                reason,
                count,
            });
        }
    }

    /// Total copies that were skipped for any reason
    pub fn skipped_count(&self) -> usize {
        self.skipped.iter().map(|s| s.count).sum()
    }

    /// Whether any card was left out because the sheet limit was reached
    pub fn hit_sheet_limit(&self) -> bool {
        self.skipped.iter().any(|s| s.reason == SkipReason::SheetLimit)
    }

    pub fn is_skipped(&self, card_id: &CardId) -> bool {
        self.skipped.iter().any(|s| &s.card_id == card_id)
    }

    /// Write the report as pretty JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::ImposeError::Config(format!("Failed to serialize report: {}", e))
        })
    }
}
