//! Sheet rendering
//!
//! - `sheet`: compositing card artwork onto sheet canvases
//! - `canvas`: pixel-grid helpers shared with the mark renderer
//! - `pdf`: wrapping rendered sheets into a printable PDF

mod canvas;
mod pdf;
mod sheet;

pub use canvas::*;
pub use pdf::sheets_to_pdf;
pub use sheet::*;
