use crate::cuts::extract_cuts;
use crate::impose::impose;
use crate::manifest::CardManifest;
use crate::options::SheetSpec;
use crate::types::*;

/// Yield estimate for a manifest on a sheet, computed without rendering
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpositionStatistics {
    /// Distinct card designs
    pub designs: usize,
    pub requested: usize,
    pub placed: usize,
    pub skipped: usize,
    pub sheets: usize,
    pub cards_per_sheet: Vec<usize>,
    pub cuts_per_sheet: Vec<usize>,
    /// Total cut line length across all sheets (mm)
    pub cut_length_mm: f64,
    /// Mean fraction of the printable area covered by cards
    pub utilization: f64,
    /// The sheet was turned to fit more cards
    pub sheet_rotated: bool,
}

impl ImpositionStatistics {
    /// Cards on a full sheet (the first one)
    pub fn yield_per_sheet(&self) -> usize {
        self.cards_per_sheet.first().copied().unwrap_or(0)
    }
}

/// Calculate statistics for imposing `manifest` on `spec`
pub fn calculate_statistics(
    manifest: &CardManifest,
    spec: &SheetSpec,
) -> Result<ImpositionStatistics> {
    manifest.validate()?;
    let (plan, report) = impose(&manifest.cards, spec)?;

    let cuts: Vec<_> = plan.sheets.iter().map(extract_cuts).collect();
    let utilization = if plan.is_empty() {
        0.0
    } else {
        plan.sheets.iter().map(|s| s.utilization()).sum::<f64>() / plan.sheet_count() as f64
    };

    Ok(ImpositionStatistics {
        designs: manifest.cards.len(),
        requested: report.requested,
        placed: report.placed,
        skipped: report.skipped_count(),
        sheets: plan.sheet_count(),
        cards_per_sheet: plan.sheets.iter().map(|s| s.card_count()).collect(),
        cuts_per_sheet: cuts.iter().map(|c| c.cut_count()).collect(),
        cut_length_mm: cuts.iter().map(|c| c.total_cut_length().to_mm()).sum(),
        utilization,
        sheet_rotated: plan.sheet_rotated,
    })
}
