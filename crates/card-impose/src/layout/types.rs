//! Geometry value types shared by the packer, renderer and cut extractor
//!
//! All physical measurements are held as integer micrometres so that packing
//! and cut derivation are exact. Conversion to millimetres, points, inches or
//! pixels happens only at the edges (rendering and encoding).

use crate::constants::{MAX_LENGTH_MM, MICROMETRES_PER_MM, MM_PER_INCH, POINTS_PER_INCH};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// A physical length in micrometres
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length(i64);

impl Length {
    pub const ZERO: Length = Length(0);

    pub const fn from_micrometres(um: i64) -> Self {
        Self(um)
    }

    /// Convert from millimetres, rounding to the nearest micrometre
    pub fn from_mm(mm: f64) -> Self {
        Self((mm * MICROMETRES_PER_MM).round() as i64)
    }

    pub const fn micrometres(self) -> i64 {
        self.0
    }

    pub fn to_mm(self) -> f64 {
        self.0 as f64 / MICROMETRES_PER_MM
    }

    pub fn to_inches(self) -> f64 {
        self.to_mm() / MM_PER_INCH
    }

    pub fn to_points(self) -> f64 {
        self.to_inches() * POINTS_PER_INCH
    }

    /// Number of device pixels at `dpi`, rounded to the nearest pixel
    pub fn to_pixels(self, dpi: u32) -> u32 {
        (self.to_inches() * dpi as f64).round().max(0.0) as u32
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Whether this length is no longer than [`MAX_LENGTH_MM`]
    pub fn is_within_limit(self) -> bool {
        self <= Length::from_mm(MAX_LENGTH_MM)
    }

    /// Half of this length, rounded towards zero
    pub fn half(self) -> Self {
        Self(self.0 / 2)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm", self.to_mm())
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Length {
    type Output = Length;
    fn mul(self, rhs: i64) -> Length {
        Length(self.0 * rhs)
    }
}

impl Div<i64> for Length {
    type Output = Length;
    fn div(self, rhs: i64) -> Length {
        Length(self.0 / rhs)
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Length>>(iter: I) -> Length {
        iter.fold(Length::ZERO, Add::add)
    }
}

/// A point on the sheet, origin at the top-left corner, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: Length,
    pub y: Length,
}

impl Point {
    pub fn new(x: Length, y: Length) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: Length,
    pub height: Length,
}

impl Size {
    pub fn new(width: Length, height: Length) -> Self {
        Self { width, height }
    }

    pub fn from_mm(width_mm: f64, height_mm: f64) -> Self {
        Self::new(Length::from_mm(width_mm), Length::from_mm(height_mm))
    }

    /// The same size turned by 90 degrees
    pub fn rotated(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Grow every side by `amount`
    pub fn inflate(self, amount: Length) -> Self {
        Self::new(self.width + amount * 2, self.height + amount * 2)
    }

    pub fn fits_within(self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    pub fn is_empty(self) -> bool {
        !self.width.is_positive() || !self.height.is_positive()
    }

    pub fn is_within_limit(self) -> bool {
        self.width.is_within_limit() && self.height.is_within_limit()
    }

    /// Area in square millimetres
    pub fn area_mm2(self) -> f64 {
        self.width.to_mm() * self.height.to_mm()
    }
}

/// An axis-aligned rectangle in sheet coordinates (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: Length, y: Length, width: Length, height: Length) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> Length {
        self.origin.x
    }

    pub fn top(&self) -> Length {
        self.origin.y
    }

    pub fn right(&self) -> Length {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> Length {
        self.origin.y + self.size.height
    }

    pub fn width(&self) -> Length {
        self.size.width
    }

    pub fn height(&self) -> Length {
        self.size.height
    }

    /// Shrink every side by `amount`
    pub fn deflate(&self, amount: Length) -> Rect {
        Rect::new(
            self.left() + amount,
            self.top() + amount,
            self.width() - amount * 2,
            self.height() - amount * 2,
        )
    }

    /// True when `other` lies fully inside this rectangle (edges may touch)
    pub fn contains(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.top() >= self.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the interiors overlap. Rectangles that only share an edge
    /// do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// True when the two rectangles are at least `gap` apart on one axis.
    ///
    /// This is the exact form of "the boxes grown by half the gap do not
    /// intersect" and does not suffer from halving odd gaps.
    pub fn separated_by(&self, other: &Rect, gap: Length) -> bool {
        other.left() - self.right() >= gap
            || self.left() - other.right() >= gap
            || other.top() - self.bottom() >= gap
            || self.top() - other.bottom() >= gap
    }
}
