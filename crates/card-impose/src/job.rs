//! End-to-end job orchestration
//!
//! A job runs in stages:
//! 1. Validate the manifest and options
//! 2. Resolve every card's artwork, applying the missing-asset policy
//! 3. Impose (one blocking task)
//! 4. Render and extract cuts per sheet (one blocking task per sheet)
//! 5. Encode the cutting job and verify it parses back identically
//!
//! This is the only place that decides whether a partial failure aborts the
//! job or yields a reduced result.

use crate::cancel::CancelToken;
use crate::cuts::{CutGeometry, extract_cuts};
use crate::impose::impose;
use crate::jdf::{CuttingJobDocument, JobMeta, encode, parse_jdf, to_xml};
use crate::layout::PlacementPlan;
use crate::manifest::{CardAsset, CardManifest};
use crate::options::JobOptions;
use crate::render::{AssetMap, CardArt, SheetImage, SheetRenderer};
use crate::report::{JobReport, SkipReason};
use crate::source::ImageSource;
use crate::types::*;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

/// Everything a successful job produced
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        document: CuttingJobDocument,
        xml: String,
        plan: PlacementPlan,
        /// Sheet images in sheet order, each front followed by its back
        sheets: Vec<SheetImage>,
        geometry: Vec<CutGeometry>,
        report: JobReport,
    },
    /// The job was cancelled; no document was produced
    Cancelled { report: JobReport },
}

impl JobOutcome {
    pub fn report(&self) -> &JobReport {
        match self {
            JobOutcome::Completed { report, .. } | JobOutcome::Cancelled { report } => report,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled { .. })
    }
}

/// A fatal job error together with whatever was reported before it
#[derive(Error, Debug)]
#[error("{error}")]
pub struct JobFailure {
    #[source]
    pub error: ImposeError,
    /// `None` when the job failed before any card was examined
    pub report: Option<JobReport>,
}

impl JobFailure {
    fn early(error: ImposeError) -> Self {
        Self {
            error,
            report: None,
        }
    }

    fn with_report(error: ImposeError, report: &JobReport) -> Self {
        Self {
            error,
            report: Some(report.clone()),
        }
    }
}

/// Artwork resolution result
struct Resolved {
    cards: Vec<CardAsset>,
    assets: AssetMap,
    missing: Vec<(CardAsset, String)>,
}

/// Run a complete job
pub async fn run_job(
    manifest: &CardManifest,
    options: &JobOptions,
    meta: &JobMeta,
    source: Arc<dyn ImageSource>,
    cancel: CancelToken,
) -> std::result::Result<JobOutcome, JobFailure> {
    options.validate().map_err(JobFailure::early)?;
    manifest.validate().map_err(JobFailure::early)?;

    let mut report = JobReport::new(manifest.total_requested());
    log::info!(
        "Job {}: {} design(s), {} card(s) requested",
        meta.job_id,
        manifest.cards.len(),
        report.requested
    );

    // Artwork
    let resolved = {
        let cards = manifest.cards.clone();
        let duplex = options.render.duplex;
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || resolve_assets(cards, source.as_ref(), duplex, &cancel))
            .await
            .map_err(|e| JobFailure::with_report(e.into(), &report))?
    };
    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(ImposeError::Cancelled) => return Ok(JobOutcome::Cancelled { report }),
        Err(e) => return Err(JobFailure::with_report(e, &report)),
    };

    for (card, reason) in &resolved.missing {
        if options.policy.missing_asset == FailurePolicy::Abort {
            return Err(JobFailure::with_report(
                ImposeError::AssetMissing {
                    card_id: card.id.clone(),
                    reason: reason.clone(),
                },
                &report,
            ));
        }
        log::warn!("Skipping card {}: {}", card.id, reason);
        report.record_skip(&card.id, SkipReason::AssetMissing(reason.clone()), card.quantity);
    }
    if resolved.cards.is_empty() {
        return Err(JobFailure::with_report(
            ImposeError::Validation("No card artwork could be resolved".to_string()),
            &report,
        ));
    }

    // Imposition
    let (plan, imposed) = {
        let cards = resolved.cards.clone();
        let spec = options.sheet.clone();
        tokio::task::spawn_blocking(move || impose(&cards, &spec))
            .await
            .map_err(|e| JobFailure::with_report(e.into(), &report))?
            .map_err(|e| JobFailure::with_report(e, &report))?
    };
    report.placed = imposed.placed;
    report.sheets_used = imposed.sheets_used;
    for skipped in &imposed.skipped {
        report.record_skip(&skipped.card_id, skipped.reason.clone(), skipped.count);
    }

    if imposed.hit_sheet_limit() {
        let unplaced = imposed
            .skipped
            .iter()
            .filter(|s| s.reason == SkipReason::SheetLimit)
            .map(|s| s.count)
            .sum();
        return Err(JobFailure::with_report(
            ImposeError::SheetLimitExceeded {
                max_sheets: options.sheet.max_sheets.unwrap_or(plan.sheet_count()),
                unplaced,
            },
            &report,
        ));
    }
    if let Some(oversized) = imposed.skipped.iter().find(|s| s.reason == SkipReason::Oversized) {
        if options.policy.oversized_card == FailurePolicy::Abort {
            return Err(JobFailure::with_report(
                ImposeError::Capacity {
                    card_id: oversized.card_id.clone(),
                    reason: oversized.reason.to_string(),
                },
                &report,
            ));
        }
        for s in imposed.skipped.iter().filter(|s| s.reason == SkipReason::Oversized) {
            log::warn!("Skipping {} cop(ies) of card {}: {}", s.count, s.card_id, s.reason);
        }
    }
    if plan.is_empty() {
        return Err(JobFailure::with_report(
            ImposeError::Validation("No card fits on the sheet".to_string()),
            &report,
        ));
    }
    log::info!(
        "Job {}: {} card(s) on {} sheet(s)",
        meta.job_id,
        report.placed,
        report.sheets_used
    );

    // Per-sheet work
    let plan = Arc::new(plan);
    let assets = Arc::new(resolved.assets);
    let (sheets, geometry) =
        match process_sheets(&plan, &assets, options, cancel.clone()).await {
            Ok(done) => done,
            Err(ImposeError::Cancelled) => return Ok(JobOutcome::Cancelled { report }),
            Err(e) => return Err(JobFailure::with_report(e, &report)),
        };
    if cancel.is_cancelled() {
        return Ok(JobOutcome::Cancelled { report });
    }

    // Encoding
    let mut meta = meta.clone();
    meta.duplex = options.render.duplex;
    let (document, xml) = encode_and_verify(&plan, &geometry, &meta, options)
        .map_err(|e| JobFailure::with_report(e, &report))?;

    log::info!(
        "Job {}: encoded {} cut(s) across {} sheet(s)",
        meta.job_id,
        document.cut_count(),
        document.sheet_count()
    );

    let plan = Arc::try_unwrap(plan).unwrap_or_else(|shared| (*shared).clone());
    Ok(JobOutcome::Completed {
        document,
        xml,
        plan,
        sheets,
        geometry,
        report,
    })
}

fn resolve_assets(
    cards: Vec<CardAsset>,
    source: &dyn ImageSource,
    duplex: bool,
    cancel: &CancelToken,
) -> Result<Resolved> {
    let mut resolved = Resolved {
        cards: Vec::with_capacity(cards.len()),
        assets: AssetMap::new(),
        missing: Vec::new(),
    };

    for card in cards {
        cancel.checkpoint()?;
        match resolve_card(&card, source, duplex) {
            Ok(art) => {
                resolved.assets.insert(card.id.clone(), art);
                resolved.cards.push(card);
            }
            Err(reason) => resolved.missing.push((card, reason)),
        }
    }
    Ok(resolved)
}

fn resolve_card(
    card: &CardAsset,
    source: &dyn ImageSource,
    duplex: bool,
) -> std::result::Result<CardArt, String> {
    let front = source
        .resolve(&card.image)
        .map_err(|e| format!("{}: {}", card.image, e))?;
    let mut art = CardArt::new(front, (card.pixel_width, card.pixel_height));
    art.check(&card.id).map_err(|e| e.to_string())?;

    if let Some(back) = card.back_image.as_ref().filter(|_| duplex) {
        let back = source
            .resolve(back)
            .map_err(|e| format!("{}: {}", back, e))?;
        art = art.with_back(back);
    }
    Ok(art)
}

/// Render and extract cuts for every sheet concurrently
async fn process_sheets(
    plan: &Arc<PlacementPlan>,
    assets: &Arc<AssetMap>,
    options: &JobOptions,
    cancel: CancelToken,
) -> Result<(Vec<SheetImage>, Vec<CutGeometry>)> {
    let mut tasks = JoinSet::new();
    for index in 0..plan.sheet_count() {
        let plan = Arc::clone(plan);
        let assets = Arc::clone(assets);
        let render = options.render.clone();
        let cancel = cancel.clone();

        tasks.spawn_blocking(move || {
            cancel.checkpoint()?;
            let sheet = &plan.sheets[index];
            // Every placed card had its art resolved, so a gap here is a bug
            // and must not reach the cut file as a blank slot
            let renderer = SheetRenderer::new(&assets, &render)
                .policy(FailurePolicy::Abort)
                .cancel_token(cancel);

            let mut images = vec![renderer.render(sheet, SheetSide::Front)?];
            if render.duplex {
                images.push(renderer.render(sheet, SheetSide::Back)?);
            }
            let geometry = extract_cuts(sheet);
            log::debug!(
                "Sheet {}: {} card(s), {} cut(s)",
                index + 1,
                sheet.card_count(),
                geometry.cut_count()
            );
            Ok::<_, ImposeError>((index, images, geometry))
        });
    }

    let mut done = Vec::with_capacity(plan.sheet_count());
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(result) => done.push(result),
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    done.sort_by_key(|(index, _, _)| *index);
    let mut sheets = Vec::with_capacity(done.len());
    let mut geometry = Vec::with_capacity(done.len());
    for (_, images, cuts) in done {
        sheets.extend(images);
        geometry.push(cuts);
    }
    Ok((sheets, geometry))
}

fn encode_and_verify(
    plan: &PlacementPlan,
    geometry: &[CutGeometry],
    meta: &JobMeta,
    options: &JobOptions,
) -> Result<(CuttingJobDocument, String)> {
    let document = encode(plan, geometry, meta, &options.profile)?;
    let xml = to_xml(&document)?;
    parse_jdf(&xml)?.verify_against(&document)?;
    Ok((document, xml))
}
