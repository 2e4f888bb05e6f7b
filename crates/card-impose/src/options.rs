use crate::constants::{DEFAULT_DPI, DEFAULT_GUTTER_MM, MAX_CANVAS_EDGE_PX, MAX_LENGTH_MM};
use crate::jdf::OutputProfile;
use crate::layout::{Length, Rect, Size};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical description of the press sheet
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetSpec {
    pub size: Size,
    pub margins: SheetMargins,
    /// Spacing between neighbouring cards
    pub gutter: Length,
    /// Upper bound on sheets per job (`None` = unbounded)
    pub max_sheets: Option<usize>,
    pub orientation: OrientationPolicy,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self::from_paper(PaperSize::A3Plus, Orientation::Portrait)
    }
}

impl SheetSpec {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            margins: SheetMargins::default(),
            gutter: Length::from_mm(DEFAULT_GUTTER_MM),
            max_sheets: None,
            orientation: OrientationPolicy::default(),
        }
    }

    pub fn from_paper(paper: PaperSize, orientation: Orientation) -> Self {
        Self::new(paper.size_with_orientation(orientation))
    }

    /// Area inside the outer margins
    pub fn printable_area(&self) -> Rect {
        Rect::new(
            self.margins.left,
            self.margins.top,
            self.size.width - self.margins.horizontal(),
            self.size.height - self.margins.vertical(),
        )
    }

    /// The same sheet turned 90 degrees
    pub fn rotated(&self) -> Self {
        Self {
            size: self.size.rotated(),
            margins: self.margins.rotated(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.is_empty() {
            return Err(ImposeError::Validation(
                "Sheet width and height must be positive".to_string(),
            ));
        }
        let margins = [
            self.margins.top,
            self.margins.bottom,
            self.margins.left,
            self.margins.right,
        ];
        if margins.iter().any(|m| m.is_negative()) || self.gutter.is_negative() {
            return Err(ImposeError::Validation(
                "Margins and gutter must not be negative".to_string(),
            ));
        }
        if !self.size.is_within_limit() || !self.gutter.is_within_limit() {
            return Err(ImposeError::Validation(format!(
                "Sheet dimensions and gutter must not exceed {} mm",
                MAX_LENGTH_MM
            )));
        }
        if margins.iter().any(|m| *m > self.size.width.max(self.size.height)) {
            return Err(ImposeError::Validation(
                "Margins are larger than the sheet".to_string(),
            ));
        }
        if self.gutter > self.size.width.max(self.size.height) {
            return Err(ImposeError::Validation(
                "Gutter is larger than the sheet".to_string(),
            ));
        }
        if self.printable_area().size.is_empty() {
            return Err(ImposeError::Validation(
                "Margins leave no printable area".to_string(),
            ));
        }
        if self.max_sheets == Some(0) {
            return Err(ImposeError::Validation(
                "Maximum sheet count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How sheets are rasterized
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderOptions {
    pub dpi: u32,
    pub marks: SheetMarks,
    pub bleed_source: BleedSource,
    /// Fill colour for generated bleed
    pub bleed_color: [u8; 3],
    /// Paper colour behind the cards
    pub background: [u8; 3],
    /// Also render mirrored back sheets from each card's back image
    pub duplex: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            marks: SheetMarks::default(),
            bleed_source: BleedSource::default(),
            bleed_color: [0, 0, 0],
            background: [255, 255, 255],
            duplex: false,
        }
    }
}

/// Failure handling chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobPolicy {
    /// Image unavailable or not matching the manifest dimensions
    pub missing_asset: FailurePolicy,
    /// Card larger than the printable area in every allowed orientation
    pub oversized_card: FailurePolicy,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            missing_asset: FailurePolicy::Abort,
            oversized_card: FailurePolicy::Skip,
        }
    }
}

/// Comprehensive job configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobOptions {
    pub sheet: SheetSpec,
    pub render: RenderOptions,
    pub policy: JobPolicy,
    pub profile: OutputProfile,
}

impl JobOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ImposeError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ImposeError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        self.sheet.validate()?;

        if self.render.dpi == 0 {
            return Err(ImposeError::Validation("DPI must be positive".to_string()));
        }
        let largest_edge = self.sheet.size.width.max(self.sheet.size.height);
        if largest_edge.to_pixels(self.render.dpi) > MAX_CANVAS_EDGE_PX {
            return Err(ImposeError::Validation(format!(
                "{} DPI makes a {} sheet larger than {} pixels",
                self.render.dpi, largest_edge, MAX_CANVAS_EDGE_PX
            )));
        }

        self.profile.validate()
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::{Deserialize, Serialize};

    // Lengths are written as millimetres so config files stay readable
    impl Serialize for Length {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_f64(self.to_mm())
        }
    }

    impl<'de> Deserialize<'de> for Length {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mm = f64::deserialize(deserializer)?;
            if !mm.is_finite() {
                return Err(serde::de::Error::custom("length must be a finite number"));
            }
            Ok(Length::from_mm(mm))
        }
    }

    impl Serialize for Size {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            use serde::ser::SerializeStruct;
            let mut s = serializer.serialize_struct("Size", 2)?;
            s.serialize_field("width_mm", &self.width)?;
            s.serialize_field("height_mm", &self.height)?;
            s.end()
        }
    }

    impl<'de> Deserialize<'de> for Size {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            #[derive(Deserialize)]
            struct SizeMm {
                width_mm: Length,
                height_mm: Length,
            }

            let size = SizeMm::deserialize(deserializer)?;
            Ok(Size::new(size.width_mm, size.height_mm))
        }
    }

    impl Serialize for SheetMargins {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            use serde::ser::SerializeStruct;
            let mut s = serializer.serialize_struct("SheetMargins", 4)?;
            s.serialize_field("top_mm", &self.top)?;
            s.serialize_field("bottom_mm", &self.bottom)?;
            s.serialize_field("left_mm", &self.left)?;
            s.serialize_field("right_mm", &self.right)?;
            s.end()
        }
    }

    impl<'de> Deserialize<'de> for SheetMargins {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            use serde::de::{self, MapAccess, Visitor};
            use std::fmt;

            struct SheetMarginsVisitor;

            impl<'de> Visitor<'de> for SheetMarginsVisitor {
                type Value = SheetMargins;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a uniform margin in mm or a map of side margins")
                }

                fn visit_f64<E>(self, value: f64) -> std::result::Result<SheetMargins, E>
                where
                    E: de::Error,
                {
                    Ok(SheetMargins::uniform(Length::from_mm(value)))
                }

                fn visit_u64<E>(self, value: u64) -> std::result::Result<SheetMargins, E>
                where
                    E: de::Error,
                {
                    self.visit_f64(value as f64)
                }

                fn visit_map<M>(self, mut map: M) -> std::result::Result<SheetMargins, M::Error>
                where
                    M: MapAccess<'de>,
                {
                    let mut margins = SheetMargins::uniform(Length::ZERO);
                    while let Some(key) = map.next_key::<String>()? {
                        match key.as_str() {
                            "top_mm" => margins.top = map.next_value()?,
                            "bottom_mm" => margins.bottom = map.next_value()?,
                            "left_mm" => margins.left = map.next_value()?,
                            "right_mm" => margins.right = map.next_value()?,
                            _ => {
                                let _: serde::de::IgnoredAny = map.next_value()?;
                            }
                        }
                    }
                    Ok(margins)
                }
            }

            deserializer.deserialize_any(SheetMarginsVisitor)
        }
    }
} // end of serde_impls module
