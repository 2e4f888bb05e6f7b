//! Shared constants for card imposition
//!
//! This module centralizes magic numbers used by layout, rendering and
//! cut-file encoding.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Micrometres per millimetre (internal length resolution)
pub const MICROMETRES_PER_MM: f64 = 1000.0;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// PostScript points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert millimetres to pixels at the given resolution
#[inline]
pub fn mm_to_px(mm: f64, dpi: u32) -> f64 {
    mm * dpi as f64 / MM_PER_INCH
}

/// Convert pixels at the given resolution to millimetres
#[inline]
pub fn px_to_mm(px: u32, dpi: u32) -> f64 {
    px as f64 * MM_PER_INCH / dpi as f64
}

// =============================================================================
// Defaults
// =============================================================================

/// Default raster resolution for sheet artwork
pub const DEFAULT_DPI: u32 = 300;

/// Default bleed around each card (mm)
pub const DEFAULT_BLEED_MM: f64 = 3.0;

/// Default outer sheet margin (mm)
pub const DEFAULT_SHEET_MARGIN_MM: f64 = 5.0;

/// Default gutter between cards (mm)
pub const DEFAULT_GUTTER_MM: f64 = 2.0;

/// Longest physical length accepted anywhere in a job (mm)
///
/// Keeps every micrometre sum the packer forms far inside `i64`.
pub const MAX_LENGTH_MM: f64 = 100_000.0;

/// Largest canvas edge the renderer will allocate, in pixels
pub const MAX_CANVAS_EDGE_PX: u32 = 20_000;

// =============================================================================
// Printer's Marks (raster)
// =============================================================================

/// Length of crop marks (mm)
pub const CROP_MARK_LENGTH_MM: f64 = 3.0;

/// Gap between a crop mark and the trim corner (mm)
pub const CROP_MARK_GAP_MM: f64 = 1.0;

/// Radius of registration targets (mm)
pub const REGISTRATION_MARK_RADIUS_MM: f64 = 2.0;

/// Stroke width of marks (px, before DPI scaling at 300 DPI)
pub const MARK_STROKE_PX: u32 = 2;

// =============================================================================
// Cut File
// =============================================================================

/// JDF schema version written to the document
pub const JDF_VERSION: &str = "1.3";

/// Resource ID of the media element
pub const MEDIA_RESOURCE_ID: &str = "Media_001";

/// Resource ID of the cutting parameters element
pub const CUTTING_PARAMS_RESOURCE_ID: &str = "CuttingParams_001";
