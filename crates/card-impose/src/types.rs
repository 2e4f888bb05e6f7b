use crate::layout::{Length, Size};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImposeError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Card {card_id} cannot be placed: {reason}")]
    Capacity { card_id: CardId, reason: String },
    #[error("Sheet limit of {max_sheets} reached with {unplaced} card(s) unplaced")]
    SheetLimitExceeded { max_sheets: usize, unplaced: usize },
    #[error("Asset for card {card_id} unavailable: {reason}")]
    AssetMissing { card_id: CardId, reason: String },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Job cancelled")]
    Cancelled,
}

impl ImposeError {
    /// Capacity failures, both per card and for the whole job
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            ImposeError::Capacity { .. } | ImposeError::SheetLimitExceeded { .. }
        )
    }
}

impl From<quick_xml::Error> for ImposeError {
    fn from(e: quick_xml::Error) -> Self {
        ImposeError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImposeError>;

/// Identifier of a card design within a manifest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height > width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard press sheet sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperSize {
    A3,
    /// A3+ / Super B, the usual card-printing stock
    A3Plus,
    A4,
    Sra3,
    Letter,
    Tabloid,
    Custom { width_mm: f64, height_mm: f64 },
}

impl PaperSize {
    /// Get base dimensions (always portrait for standard sizes)
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A3Plus => (329.0, 483.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Sra3 => (320.0, 450.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get the sheet size with orientation applied
    pub fn size_with_orientation(self, orientation: Orientation) -> Size {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => Size::from_mm(w, h),
            Orientation::Landscape => Size::from_mm(h, w),
        }
    }
}

/// Which 90-degree rotations the packer may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrientationPolicy {
    /// Neither cards nor the sheet are rotated
    Fixed,
    /// Cards that allow it may be turned on the sheet
    #[default]
    RotateCards,
    /// The whole sheet may be turned; cards keep their orientation
    RotateSheet,
    /// Both cards and the sheet may be turned
    Any,
}

impl OrientationPolicy {
    pub fn allows_card_rotation(self) -> bool {
        matches!(self, OrientationPolicy::RotateCards | OrientationPolicy::Any)
    }

    pub fn allows_sheet_rotation(self) -> bool {
        matches!(self, OrientationPolicy::RotateSheet | OrientationPolicy::Any)
    }
}

/// What to do when a card cannot be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Fail the whole job
    #[default]
    Abort,
    /// Leave the card out and record it in the job report
    Skip,
}

/// Where the bleed area of a placed card gets its pixels from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BleedSource {
    /// The source image already includes bleed and covers the whole box
    #[default]
    Included,
    /// The source image is trim-only art; bleed is filled with a solid colour
    Generated,
}

/// Sheet margins - printer-safe area around the whole sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetMargins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Default for SheetMargins {
    fn default() -> Self {
        Self::uniform(Length::from_mm(crate::constants::DEFAULT_SHEET_MARGIN_MM))
    }
}

impl SheetMargins {
    /// Create uniform margins on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Margins for the sheet turned 90 degrees clockwise
    pub fn rotated(self) -> Self {
        Self {
            top: self.left,
            right: self.top,
            bottom: self.right,
            left: self.bottom,
        }
    }

    pub fn horizontal(&self) -> Length {
        self.left + self.right
    }

    pub fn vertical(&self) -> Length {
        self.top + self.bottom
    }
}

/// Printer's marks drawn onto rendered sheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetMarks {
    /// L-shaped marks outside each card's trim corners
    pub crop_marks: bool,
    /// Registration targets centred in the sheet margins
    pub registration_marks: bool,
    /// Thin outline around each card's bleed box
    pub reference_outline: bool,
}

impl SheetMarks {
    pub fn any(&self) -> bool {
        self.crop_marks || self.registration_marks || self.reference_outline
    }
}

/// Which physical side of the printed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetSide {
    Front,
    Back,
}
