//! Layout calculation modules for imposition
//!
//! This module handles all the geometric calculations for card imposition:
//! - Exact geometry value types (lengths, points, rectangles)
//! - The shelf packer that assigns cards to sheets
//! - The placement plan handed to the renderer and cut extractor

mod plan;
mod shelf;
mod types;

pub use plan::*;
pub(crate) use shelf::*;
pub use types::*;
