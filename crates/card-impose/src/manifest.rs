//! Card manifest: the list of card designs submitted to a job
//!
//! A manifest can be read from CSV (one row per design, header row required)
//! or from JSON when the `serde` feature is enabled.

use crate::constants::{DEFAULT_BLEED_MM, MAX_LENGTH_MM, px_to_mm};
use crate::layout::{Length, Size};
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;

/// One card design with its requested print quantity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardAsset {
    pub id: CardId,
    /// Reference handed to the [`ImageSource`](crate::ImageSource)
    pub image: String,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub dpi: u32,
    /// Finished (trimmed) card size
    pub trim: Size,
    /// Extra artwork around the trim on every side
    pub bleed: Length,
    pub quantity: usize,
    pub allow_rotation: bool,
    /// Optional back face, printed on the reverse sheet in duplex jobs
    #[cfg_attr(feature = "serde", serde(default))]
    pub back_image: Option<String>,
}

impl CardAsset {
    /// Card whose trim size is derived from its pixel dimensions and DPI
    pub fn from_pixels(
        id: impl Into<String>,
        image: impl Into<String>,
        pixel_width: u32,
        pixel_height: u32,
        dpi: u32,
        quantity: usize,
    ) -> Self {
        let trim = if dpi > 0 {
            Size::from_mm(px_to_mm(pixel_width, dpi), px_to_mm(pixel_height, dpi))
        } else {
            Size::default()
        };
        Self {
            id: CardId::new(id),
            image: image.into(),
            pixel_width,
            pixel_height,
            dpi,
            trim,
            bleed: Length::from_mm(DEFAULT_BLEED_MM),
            quantity,
            allow_rotation: true,
            back_image: None,
        }
    }

    /// Trim size plus bleed on every side
    pub fn bleed_size(&self) -> Size {
        self.trim.inflate(self.bleed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(ImposeError::Validation("Card with empty id".to_string()));
        }
        if self.trim.is_empty() {
            return Err(ImposeError::Validation(format!(
                "Card {} has no trim size",
                self.id
            )));
        }
        if self.bleed.is_negative() {
            return Err(ImposeError::Validation(format!(
                "Card {} has negative bleed",
                self.id
            )));
        }
        if !self.trim.is_within_limit() || !self.bleed.is_within_limit() {
            return Err(ImposeError::Validation(format!(
                "Card {} is larger than {} mm",
                self.id, MAX_LENGTH_MM
            )));
        }
        if self.pixel_width == 0 || self.pixel_height == 0 || self.dpi == 0 {
            return Err(ImposeError::Validation(format!(
                "Card {} has invalid pixel dimensions or DPI",
                self.id
            )));
        }
        Ok(())
    }
}

/// Ordered list of card designs
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardManifest {
    pub cards: Vec<CardAsset>,
}

impl CardManifest {
    pub fn new(cards: Vec<CardAsset>) -> Self {
        Self { cards }
    }

    /// Total number of copies requested across all designs
    pub fn total_requested(&self) -> usize {
        self.cards.iter().map(|c| c.quantity).sum()
    }

    pub fn get(&self, id: &CardId) -> Option<&CardAsset> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Reject empty manifests, duplicate ids and malformed cards
    pub fn validate(&self) -> Result<()> {
        if self.cards.is_empty() {
            return Err(ImposeError::Validation("Manifest is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for card in &self.cards {
            card.validate()?;
            if !seen.insert(&card.id) {
                return Err(ImposeError::Validation(format!(
                    "Duplicate card id {}",
                    card.id
                )));
            }
        }
        if self.total_requested() == 0 {
            return Err(ImposeError::Validation(
                "Manifest requests no cards".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a manifest, choosing the parser from the file extension
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let contents = tokio::fs::read_to_string(&path).await?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        tokio::task::spawn_blocking(move || {
            if is_json {
                Self::from_json_str(&contents)
            } else {
                Self::from_csv_str(&contents)
            }
        })
        .await?
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| ImposeError::Config(format!("Failed to parse manifest: {}", e)))
    }

    #[cfg(not(feature = "serde"))]
    pub fn from_json_str(_contents: &str) -> Result<Self> {
        Err(ImposeError::Config(
            "JSON manifests require the serde feature".to_string(),
        ))
    }

    /// Parse a CSV manifest.
    ///
    /// Required columns: `card_id`, `image`, `pixel_width`, `pixel_height`,
    /// `dpi`, `quantity`. Optional: `trim_width_mm`, `trim_height_mm`,
    /// `bleed_mm`, `allow_rotation`, `back_image`.
    pub fn from_csv_str(contents: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());
        let columns = CsvColumns::from_headers(reader.headers()?)?;

        let mut cards = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            cards.push(columns.parse_record(&record, row + 2)?);
        }
        Ok(Self { cards })
    }
}

/// Column positions resolved from the CSV header row
struct CsvColumns {
    card_id: usize,
    image: usize,
    pixel_width: usize,
    pixel_height: usize,
    dpi: usize,
    quantity: usize,
    trim_width_mm: Option<usize>,
    trim_height_mm: Option<usize>,
    bleed_mm: Option<usize>,
    allow_rotation: Option<usize>,
    back_image: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                ImposeError::Validation(format!("Manifest is missing column '{}'", name))
            })
        };

        Ok(Self {
            card_id: require("card_id")?,
            image: require("image")?,
            pixel_width: require("pixel_width")?,
            pixel_height: require("pixel_height")?,
            dpi: require("dpi")?,
            quantity: require("quantity")?,
            trim_width_mm: find("trim_width_mm"),
            trim_height_mm: find("trim_height_mm"),
            bleed_mm: find("bleed_mm"),
            allow_rotation: find("allow_rotation"),
            back_image: find("back_image"),
        })
    }

    fn parse_record(&self, record: &csv::StringRecord, line: usize) -> Result<CardAsset> {
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.map(field).filter(|s| !s.is_empty());

        let mut card = CardAsset::from_pixels(
            field(self.card_id),
            field(self.image),
            parse_number(field(self.pixel_width), "pixel_width", line)?,
            parse_number(field(self.pixel_height), "pixel_height", line)?,
            parse_number(field(self.dpi), "dpi", line)?,
            parse_number(field(self.quantity), "quantity", line)?,
        );

        if let (Some(w), Some(h)) = (optional(self.trim_width_mm), optional(self.trim_height_mm)) {
            card.trim = Size::from_mm(
                parse_mm(w, "trim_width_mm", line)?,
                parse_mm(h, "trim_height_mm", line)?,
            );
        }
        if let Some(bleed) = optional(self.bleed_mm) {
            card.bleed = Length::from_mm(parse_mm(bleed, "bleed_mm", line)?);
        }
        if let Some(flag) = optional(self.allow_rotation) {
            card.allow_rotation = parse_flag(flag, line)?;
        }
        card.back_image = optional(self.back_image).map(str::to_string);

        Ok(card)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, column: &str, line: usize) -> Result<T> {
    value.parse().map_err(|_| {
        ImposeError::Validation(format!(
            "Line {}: invalid value '{}' for {}",
            line, value, column
        ))
    })
}

/// A millimetre value; `inf` and `NaN` parse as floats but are not lengths
fn parse_mm(value: &str, column: &str, line: usize) -> Result<f64> {
    let mm: f64 = parse_number(value, column, line)?;
    if !mm.is_finite() {
        return Err(ImposeError::Validation(format!(
            "Line {}: invalid value '{}' for {}",
            line, value, column
        )));
    }
    Ok(mm)
}

fn parse_flag(value: &str, line: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "y" => Ok(true),
        "false" | "no" | "0" | "n" => Ok(false),
        _ => Err(ImposeError::Validation(format!(
            "Line {}: invalid value '{}' for allow_rotation",
            line, value
        ))),
    }
}
