//! Typed cutting job document and its validating builder
//!
//! Every value in a [`CuttingJobDocument`] is already expressed in the
//! output profile's unit and origin. The only way to obtain one is through
//! [`JobDocumentBuilder::build`], which rejects incomplete or inconsistent
//! input instead of letting a malformed cut file reach the machine.

use super::profile::{CoordinateOrigin, OutputProfile, Unit};
use crate::cuts::{CutAxis, CutGeometry, CutKind};
use crate::layout::{Length, PlacementPlan, Rect, Size};
use crate::types::*;
use chrono::{DateTime, Duration, Utc};

/// Job-level metadata supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct JobMeta {
    pub job_id: String,
    pub description: Option<String>,
    pub media_type: String,
    /// Back sheets are rendered and referenced next to the fronts
    pub duplex: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl JobMeta {
    /// Metadata scheduled from now, with the default 30 minute window
    pub fn new(job_id: impl Into<String>) -> Self {
        let start = Utc::now();
        Self {
            job_id: job_id.into(),
            description: None,
            media_type: "Paper".to_string(),
            duplex: false,
            start,
            end: start + Duration::minutes(30),
        }
    }
}

/// Deterministic artifact file name for one side of one sheet
pub fn sheet_artifact_name(job_id: &str, sheet_index: usize, side: SheetSide) -> String {
    match side {
        SheetSide::Front => format!("{}_sheet_{:02}.png", job_id, sheet_index + 1),
        SheetSide::Back => format!("{}_sheet_{:02}_back.png", job_id, sheet_index + 1),
    }
}

/// A cut as written to the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedCut {
    pub order: usize,
    pub pass: usize,
    pub axis: CutAxis,
    pub kind: CutKind,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

/// A card trim rectangle as written to the document
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTrim {
    pub card_id: String,
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl EncodedTrim {
    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// One sheet's resource block
#[derive(Debug, Clone, PartialEq)]
pub struct SheetBlock {
    pub index: usize,
    pub artifact: String,
    pub back_artifact: Option<String>,
    pub width: f64,
    pub height: f64,
    pub cuts: Vec<EncodedCut>,
    pub trims: Vec<EncodedTrim>,
}

impl SheetBlock {
    pub fn block_name(&self) -> String {
        format!("Sheet_{:02}", self.index + 1)
    }

    pub fn run_list_id(&self) -> String {
        format!("RunList_{:02}", self.index + 1)
    }
}

/// Complete cutting job, ready for serialization
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingJobDocument {
    pub job_id: String,
    pub description: Option<String>,
    pub version: String,
    pub profile_name: String,
    pub unit: Unit,
    pub origin: CoordinateOrigin,
    pub precision: usize,
    pub media_type: String,
    pub media_width: f64,
    pub media_height: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sheets: Vec<SheetBlock>,
}

impl CuttingJobDocument {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn cut_count(&self) -> usize {
        self.sheets.iter().map(|s| s.cuts.len()).sum()
    }

    /// Format a coordinate with the document's precision
    pub fn format(&self, value: f64) -> String {
        OutputProfile {
            name: self.profile_name.clone(),
            unit: self.unit,
            origin: self.origin,
            precision: self.precision,
            schema_version: self.version.clone(),
        }
        .format(value)
    }
}

/// Sheet input collected by the builder before conversion
#[derive(Debug, Clone)]
struct PendingSheet {
    artifact: Option<String>,
    back_artifact: Option<String>,
    geometry: CutGeometry,
}

/// Collects document parts and validates them on [`build`](Self::build)
#[derive(Debug, Clone, Default)]
pub struct JobDocumentBuilder {
    job_id: Option<String>,
    description: Option<String>,
    media: Option<Size>,
    media_type: Option<String>,
    profile: Option<OutputProfile>,
    schedule: Option<(DateTime<Utc>, DateTime<Utc>)>,
    sheets: Vec<PendingSheet>,
}

impl JobDocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn media(mut self, size: Size, media_type: impl Into<String>) -> Self {
        self.media = Some(size);
        self.media_type = Some(media_type.into());
        self
    }

    pub fn profile(mut self, profile: OutputProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.schedule = Some((start, end));
        self
    }

    /// Append the next sheet. Sheets must be added in plan order.
    pub fn sheet(
        mut self,
        artifact: Option<String>,
        back_artifact: Option<String>,
        geometry: CutGeometry,
    ) -> Self {
        self.sheets.push(PendingSheet {
            artifact,
            back_artifact,
            geometry,
        });
        self
    }

    /// Validate required fields and geometry, then convert to device units
    pub fn build(self) -> Result<CuttingJobDocument> {
        let job_id = required(self.job_id, "job ID")?;
        if job_id.chars().any(char::is_whitespace) {
            return Err(ImposeError::Encoding(format!(
                "Job ID '{}' must not contain whitespace",
                job_id
            )));
        }
        let media = self
            .media
            .ok_or_else(|| missing("media dimensions"))?;
        if media.is_empty() {
            return Err(ImposeError::Encoding(
                "Media dimensions must be positive".to_string(),
            ));
        }
        let media_type = required(self.media_type, "media type")?;
        let profile = self.profile.ok_or_else(|| missing("output profile"))?;
        profile
            .validate()
            .map_err(|e| ImposeError::Encoding(e.to_string()))?;
        let (start, end) = self.schedule.ok_or_else(|| missing("schedule"))?;
        if end < start {
            return Err(ImposeError::Encoding(
                "Job end time precedes its start time".to_string(),
            ));
        }
        if self.sheets.is_empty() {
            return Err(missing("sheet block"));
        }

        let sheets = self
            .sheets
            .into_iter()
            .enumerate()
            .map(|(index, pending)| encode_sheet(index, pending, media, &profile))
            .collect::<Result<Vec<_>>>()?;

        Ok(CuttingJobDocument {
            job_id,
            description: self.description,
            version: profile.schema_version.clone(),
            profile_name: profile.name.clone(),
            unit: profile.unit,
            origin: profile.origin,
            precision: profile.precision,
            media_type,
            media_width: profile.length(media.width),
            media_height: profile.length(media.height),
            start,
            end,
            sheets,
        })
    }
}

fn missing(field: &str) -> ImposeError {
    ImposeError::Encoding(format!("Cutting job is missing its {}", field))
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(field))
}

fn encode_sheet(
    index: usize,
    pending: PendingSheet,
    media: Size,
    profile: &OutputProfile,
) -> Result<SheetBlock> {
    let PendingSheet {
        artifact,
        back_artifact,
        geometry,
    } = pending;

    let artifact = artifact
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| missing(&format!("artifact name for sheet {}", index + 1)))?;
    if geometry.sheet_index != index {
        return Err(ImposeError::Encoding(format!(
            "Geometry for sheet {} was supplied in position {}",
            geometry.sheet_index + 1,
            index + 1
        )));
    }
    if geometry.sheet_size != media {
        return Err(ImposeError::Encoding(format!(
            "Sheet {} is {}x{} but the media is {}x{}",
            index + 1,
            geometry.sheet_size.width,
            geometry.sheet_size.height,
            media.width,
            media.height
        )));
    }

    let sheet = Rect::from_origin_size(Default::default(), media);
    let height = media.height;

    let mut cuts = Vec::with_capacity(geometry.cuts.len());
    for cut in &geometry.cuts {
        let (across, along) = match cut.axis {
            CutAxis::Horizontal => (media.height, media.width),
            CutAxis::Vertical => (media.width, media.height),
        };
        let inside = |v: Length| v >= Length::ZERO && v <= across;
        let along_ok = cut.start >= Length::ZERO && cut.start <= cut.end && cut.end <= along;
        if !inside(cut.position) || !along_ok {
            return Err(ImposeError::Encoding(format!(
                "Cut {} on sheet {} lies outside the sheet",
                cut.order,
                index + 1
            )));
        }

        let (position, start, end) = match cut.axis {
            CutAxis::Horizontal => (
                profile.y(cut.position, height),
                profile.length(cut.start),
                profile.length(cut.end),
            ),
            CutAxis::Vertical => {
                let a = profile.y(cut.start, height);
                let b = profile.y(cut.end, height);
                (profile.length(cut.position), a.min(b), a.max(b))
            }
        };
        cuts.push(EncodedCut {
            order: cut.order,
            pass: cut.pass,
            axis: cut.axis,
            kind: cut.kind,
            position,
            start,
            end,
        });
    }

    let mut trims = Vec::with_capacity(geometry.trims.len());
    for trim in &geometry.trims {
        if !sheet.contains(&trim.rect) || trim.rect.size.is_empty() {
            return Err(ImposeError::Encoding(format!(
                "Trim box of card {} on sheet {} is degenerate or outside the sheet",
                trim.card_id,
                index + 1
            )));
        }
        let top = profile.y(trim.rect.top(), height);
        let bottom = profile.y(trim.rect.bottom(), height);
        trims.push(EncodedTrim {
            card_id: trim.card_id.to_string(),
            llx: profile.length(trim.rect.left()),
            lly: top.min(bottom),
            urx: profile.length(trim.rect.right()),
            ury: top.max(bottom),
        });
    }

    Ok(SheetBlock {
        index,
        artifact,
        back_artifact,
        width: profile.length(media.width),
        height: profile.length(media.height),
        cuts,
        trims,
    })
}

/// Build the cutting job document for a plan and its cut geometry
pub fn encode(
    plan: &PlacementPlan,
    geometry: &[CutGeometry],
    meta: &JobMeta,
    profile: &OutputProfile,
) -> Result<CuttingJobDocument> {
    if plan.sheet_count() != geometry.len() {
        return Err(ImposeError::Encoding(format!(
            "Plan has {} sheet(s) but {} cut geometries were supplied",
            plan.sheet_count(),
            geometry.len()
        )));
    }
    let media = plan
        .sheets
        .first()
        .map(|s| s.size)
        .ok_or_else(|| missing("sheet block"))?;

    let mut builder = JobDocumentBuilder::new()
        .job_id(meta.job_id.clone())
        .description(meta.description.clone())
        .media(media, meta.media_type.clone())
        .profile(profile.clone())
        .schedule(meta.start, meta.end);

    for cuts in geometry {
        let front = sheet_artifact_name(&meta.job_id, cuts.sheet_index, SheetSide::Front);
        let back = meta
            .duplex
            .then(|| sheet_artifact_name(&meta.job_id, cuts.sheet_index, SheetSide::Back));
        builder = builder.sheet(Some(front), back, cuts.clone());
    }

    builder.build()
}
