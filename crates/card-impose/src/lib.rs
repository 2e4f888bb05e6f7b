mod cancel;
pub mod constants;
pub mod cuts;
mod impose;
pub mod io;
pub mod jdf;
mod job;
pub mod layout;
mod manifest;
pub mod marks;
mod options;
pub mod render;
mod report;
mod source;
mod stats;
mod types;

pub use cancel::CancelToken;
pub use cuts::{CutAxis, CutGeometry, CutKind, CutSegment, TrimContour, extract_cuts};
pub use impose::impose;
pub use io::*;
pub use jdf::{
    CuttingJobDocument, JobDocumentBuilder, JobMeta, OutputProfile, ParsedJob, encode,
    parse_jdf, to_xml,
};
pub use job::{JobFailure, JobOutcome, run_job};
pub use layout::{Length, PlacedCard, PlacementPlan, Point, Rect, Sheet, Size};
pub use manifest::*;
pub use options::*;
pub use render::{AssetMap, CardArt, SheetImage, SheetRenderer, render_plan, render_sheet};
pub use report::*;
pub use source::*;
pub use stats::*;
pub use types::*;
