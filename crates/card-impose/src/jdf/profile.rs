//! Per-device output profiles
//!
//! Geometry is computed in micrometres with a top-left origin. A profile
//! decides how those values look in the cut file: which unit, which corner
//! is the origin and how many decimals are written.

use crate::constants::JDF_VERSION;
use crate::layout::Length;
use crate::types::{ImposeError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unit written to the cut file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Unit {
    #[default]
    Millimetre,
    Point,
    Inch,
}

impl Unit {
    /// Attribute value used in the document
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Millimetre => "mm",
            Unit::Point => "pt",
            Unit::Inch => "in",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Unit> {
        match symbol {
            "mm" => Some(Unit::Millimetre),
            "pt" => Some(Unit::Point),
            "in" => Some(Unit::Inch),
            _ => None,
        }
    }

    pub fn convert(self, length: Length) -> f64 {
        match self {
            Unit::Millimetre => length.to_mm(),
            Unit::Point => length.to_points(),
            Unit::Inch => length.to_inches(),
        }
    }
}

/// Corner of the sheet that coordinates are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoordinateOrigin {
    TopLeft,
    /// PDF/JDF convention, y grows upwards
    #[default]
    BottomLeft,
}

impl CoordinateOrigin {
    pub fn name(self) -> &'static str {
        match self {
            CoordinateOrigin::TopLeft => "TopLeft",
            CoordinateOrigin::BottomLeft => "BottomLeft",
        }
    }

    pub fn from_name(name: &str) -> Option<CoordinateOrigin> {
        match name {
            "TopLeft" => Some(CoordinateOrigin::TopLeft),
            "BottomLeft" => Some(CoordinateOrigin::BottomLeft),
            _ => None,
        }
    }
}

/// Unit and coordinate conventions of one cutting device family
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputProfile {
    pub name: String,
    pub unit: Unit,
    pub origin: CoordinateOrigin,
    /// Decimal places written for every coordinate
    pub precision: usize,
    /// JDF `Version` attribute, `1.x`
    #[cfg_attr(feature = "serde", serde(default = "default_schema_version"))]
    pub schema_version: String,
}

fn default_schema_version() -> String {
    JDF_VERSION.to_string()
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self::millimetres()
    }
}

impl OutputProfile {
    /// Millimetres from the bottom-left corner
    pub fn millimetres() -> Self {
        Self {
            name: "generic-mm".to_string(),
            unit: Unit::Millimetre,
            origin: CoordinateOrigin::BottomLeft,
            precision: 3,
            schema_version: default_schema_version(),
        }
    }

    /// PostScript points from the bottom-left corner, the JDF default unit
    pub fn points() -> Self {
        Self {
            name: "jdf-pt".to_string(),
            unit: Unit::Point,
            origin: CoordinateOrigin::BottomLeft,
            precision: 3,
            schema_version: default_schema_version(),
        }
    }

    /// Millimetres from the top-left corner, as flatbed cutters with a
    /// front-left home position expect
    pub fn flatbed() -> Self {
        Self {
            name: "flatbed-mm".to_string(),
            unit: Unit::Millimetre,
            origin: CoordinateOrigin::TopLeft,
            precision: 2,
            schema_version: default_schema_version(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        [Self::millimetres(), Self::points(), Self::flatbed()]
            .into_iter()
            .find(|p| p.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ImposeError::Config("Output profile needs a name".to_string()));
        }
        if self.precision > 6 {
            return Err(ImposeError::Config(
                "Output precision above 6 decimals exceeds micrometre resolution".to_string(),
            ));
        }
        if !is_jdf_1x(&self.schema_version) {
            return Err(ImposeError::Config(format!(
                "Unsupported JDF version '{}', expected 1.x",
                self.schema_version
            )));
        }
        Ok(())
    }

    /// A length (width, height, x coordinate) in the profile's unit
    pub fn length(&self, length: Length) -> f64 {
        self.round(self.unit.convert(length))
    }

    /// A y coordinate in the profile's unit and origin convention
    pub fn y(&self, y: Length, sheet_height: Length) -> f64 {
        match self.origin {
            CoordinateOrigin::TopLeft => self.length(y),
            CoordinateOrigin::BottomLeft => self.length(sheet_height - y),
        }
    }

    /// Largest difference two written values of the same length may have
    pub fn tolerance(&self) -> f64 {
        10f64.powi(-(self.precision as i32))
    }

    pub fn format(&self, value: f64) -> String {
        let text = format!("{:.*}", self.precision, value);
        // Avoid "-0.000"
        if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            text.trim_start_matches('-').to_string()
        } else {
            text
        }
    }

    fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.precision as i32);
        (value * scale).round() / scale
    }
}

/// `1.<minor>`
fn is_jdf_1x(version: &str) -> bool {
    version
        .strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_left_flips_y() {
        let profile = OutputProfile::millimetres();
        let height = Length::from_mm(480.0);
        assert_eq!(profile.y(Length::from_mm(5.0), height), 475.0);

        let flatbed = OutputProfile::flatbed();
        assert_eq!(flatbed.y(Length::from_mm(5.0), height), 5.0);
    }

    #[test]
    fn test_point_conversion() {
        let profile = OutputProfile::points();
        assert_eq!(profile.length(Length::from_mm(25.4)), 72.0);
        assert_eq!(profile.format(72.0), "72.000");
    }

    #[test]
    fn test_format_negative_zero() {
        let profile = OutputProfile::millimetres();
        assert_eq!(profile.format(-0.0), "0.000");
        assert_eq!(profile.format(-1.5), "-1.500");
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(OutputProfile::by_name("jdf-pt"), Some(OutputProfile::points()));
        assert!(OutputProfile::by_name("plotter").is_none());
    }

    #[test]
    fn test_schema_version() {
        let mut profile = OutputProfile::points();
        assert_eq!(profile.schema_version, "1.3");

        profile.schema_version = "1.4".to_string();
        profile.validate().unwrap();

        for bad in ["", "2.0", "1.", "1.x", "abc", "1.3.1"] {
            profile.schema_version = bad.to_string();
            assert!(matches!(profile.validate(), Err(ImposeError::Config(_))), "{}", bad);
        }
    }
}
