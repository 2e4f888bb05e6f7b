use card_impose::*;
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::Arc;

fn card(id: &str, quantity: usize) -> CardAsset {
    CardAsset {
        id: CardId::new(id),
        image: format!("{}.png", id),
        pixel_width: 20,
        pixel_height: 30,
        dpi: 25,
        trim: Size::from_mm(20.0, 30.0),
        bleed: Length::from_mm(1.0),
        quantity,
        allow_rotation: true,
        back_image: None,
    }
}

fn art(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

fn small_job() -> JobOptions {
    let mut options = JobOptions::default();
    let mut sheet = SheetSpec::new(Size::from_mm(100.0, 100.0));
    sheet.margins = SheetMargins::uniform(Length::from_mm(5.0));
    sheet.gutter = Length::from_mm(2.0);
    options.sheet = sheet;
    options.render.dpi = 50;
    options
}

fn manifest() -> CardManifest {
    CardManifest::new(vec![card("a", 4), card("b", 4)])
}

fn source() -> Arc<dyn ImageSource> {
    Arc::new(
        MemoryImageSource::new()
            .with("a.png", art(20, 30, [200, 0, 0]))
            .with("b.png", art(20, 30, [0, 0, 200])),
    )
}

async fn run(
    manifest: &CardManifest,
    options: &JobOptions,
    source: Arc<dyn ImageSource>,
) -> std::result::Result<JobOutcome, JobFailure> {
    run_job(manifest, options, &JobMeta::new("test-job"), source, CancelToken::new()).await
}

#[tokio::test]
async fn test_job_completes() {
    let options = small_job();
    let outcome = run(&manifest(), &options, source()).await.unwrap();

    let JobOutcome::Completed {
        document,
        xml,
        plan,
        sheets,
        geometry,
        report,
    } = outcome
    else {
        panic!("job was cancelled");
    };

    assert_eq!(report.requested, 8);
    assert_eq!(report.placed, 8);
    assert!(report.skipped.is_empty());
    assert_eq!(report.sheets_used, plan.sheet_count());

    assert_eq!(sheets.len(), plan.sheet_count());
    assert_eq!(geometry.len(), plan.sheet_count());
    assert_eq!(document.sheet_count(), plan.sheet_count());
    assert!(sheets.iter().all(|s| s.side == SheetSide::Front));
    // 100mm at 50 DPI
    assert_eq!(sheets[0].image.dimensions(), (197, 197));

    let parsed = parse_jdf(&xml).unwrap();
    parsed.verify_against(&document).unwrap();
    assert_eq!(parsed.job_id, "test-job");
}

#[tokio::test]
async fn test_missing_asset_is_skipped() {
    let mut options = small_job();
    options.policy.missing_asset = FailurePolicy::Skip;
    let source: Arc<dyn ImageSource> =
        Arc::new(MemoryImageSource::new().with("a.png", art(20, 30, [200, 0, 0])));

    let outcome = run(&manifest(), &options, source).await.unwrap();
    let report = outcome.report();
    assert_eq!(report.placed, 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].card_id, CardId::new("b"));
    assert_eq!(report.skipped[0].count, 4);
    assert!(matches!(report.skipped[0].reason, SkipReason::AssetMissing(_)));

    let JobOutcome::Completed { plan, .. } = outcome else {
        panic!("job was cancelled");
    };
    assert!(plan
        .sheets
        .iter()
        .all(|s| s.cards.iter().all(|c| c.card_id.as_str() == "a")));
}

#[tokio::test]
async fn test_missing_asset_aborts() {
    let options = small_job();
    let source: Arc<dyn ImageSource> =
        Arc::new(MemoryImageSource::new().with("a.png", art(20, 30, [200, 0, 0])));

    let failure = run(&manifest(), &options, source).await.unwrap_err();
    assert!(matches!(
        failure.error,
        ImposeError::AssetMissing { ref card_id, .. } if card_id.as_str() == "b"
    ));
    let report = failure.report.unwrap();
    assert_eq!(report.requested, 8);
    assert_eq!(report.placed, 0);
}

#[tokio::test]
async fn test_wrong_image_dimensions_count_as_missing() {
    let options = small_job();
    let source: Arc<dyn ImageSource> = Arc::new(
        MemoryImageSource::new()
            .with("a.png", art(10, 10, [200, 0, 0]))
            .with("b.png", art(20, 30, [0, 0, 200])),
    );

    let failure = run(&manifest(), &options, source).await.unwrap_err();
    assert!(matches!(failure.error, ImposeError::AssetMissing { .. }));
}

#[tokio::test]
async fn test_oversized_card_policy() {
    let mut huge = card("huge", 1);
    huge.trim = Size::from_mm(200.0, 200.0);
    let cards = CardManifest::new(vec![card("a", 2), huge]);
    let source: Arc<dyn ImageSource> = Arc::new(
        MemoryImageSource::new()
            .with("a.png", art(20, 30, [200, 0, 0]))
            .with("huge.png", art(20, 30, [0, 200, 0])),
    );

    let mut options = small_job();
    options.policy.oversized_card = FailurePolicy::Skip;
    let outcome = run(&cards, &options, Arc::clone(&source)).await.unwrap();
    let report = outcome.report();
    assert_eq!(report.placed, 2);
    assert_eq!(report.skipped[0].reason, SkipReason::Oversized);

    options.policy.oversized_card = FailurePolicy::Abort;
    let failure = run(&cards, &options, source).await.unwrap_err();
    assert!(matches!(failure.error, ImposeError::Capacity { .. }));
    assert!(failure.error.is_capacity());
}

#[tokio::test]
async fn test_sheet_limit_fails_the_job() {
    let mut options = small_job();
    options.sheet.max_sheets = Some(1);
    let cards = CardManifest::new(vec![card("a", 20)]);

    let failure = run(&cards, &options, source()).await.unwrap_err();
    assert!(matches!(
        failure.error,
        ImposeError::SheetLimitExceeded { max_sheets: 1, .. }
    ));
    let report = failure.report.unwrap();
    assert!(report.hit_sheet_limit());
    assert_eq!(report.placed + report.skipped_count(), 20);
}

#[tokio::test]
async fn test_cancelled_job_produces_no_document() {
    let options = small_job();
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = run_job(&manifest(), &options, &JobMeta::new("test-job"), source(), cancel)
        .await
        .unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.report().requested, 8);
}

#[tokio::test]
async fn test_duplex_job_renders_back_sheets() {
    let mut options = small_job();
    options.render.duplex = true;

    let mut front = card("a", 3);
    front.back_image = Some("back.png".to_string());
    let cards = CardManifest::new(vec![front, card("b", 3)]);
    let source: Arc<dyn ImageSource> = Arc::new(
        MemoryImageSource::new()
            .with("a.png", art(20, 30, [200, 0, 0]))
            .with("b.png", art(20, 30, [0, 0, 200]))
            .with("back.png", art(20, 30, [0, 200, 0])),
    );

    let outcome = run(&cards, &options, source).await.unwrap();
    let JobOutcome::Completed {
        document,
        sheets,
        plan,
        report,
        ..
    } = outcome
    else {
        panic!("job was cancelled");
    };

    assert_eq!(report.placed, 6);
    assert_eq!(sheets.len(), plan.sheet_count() * 2);
    assert_eq!(sheets[0].side, SheetSide::Front);
    assert_eq!(sheets[1].side, SheetSide::Back);
    assert_eq!(
        document.sheets[0].back_artifact.as_deref(),
        Some("test-job_sheet_01_back.png")
    );
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_work() {
    let mut options = small_job();
    options.render.dpi = 0;
    let failure = run(&manifest(), &options, source()).await.unwrap_err();
    assert!(matches!(failure.error, ImposeError::Validation(_)));
    assert!(failure.report.is_none());

    let failure = run(&CardManifest::default(), &small_job(), source())
        .await
        .unwrap_err();
    assert!(failure.report.is_none());
}

#[tokio::test]
async fn test_multi_sheet_duplex_keeps_sheet_order() {
    let mut options = small_job();
    options.render.duplex = true;

    let mut front = card("a", 20);
    front.back_image = Some("back.png".to_string());
    let source: Arc<dyn ImageSource> = Arc::new(
        MemoryImageSource::new()
            .with("a.png", art(20, 30, [200, 0, 0]))
            .with("back.png", art(20, 30, [0, 200, 0])),
    );

    let outcome = run(&CardManifest::new(vec![front]), &options, source)
        .await
        .unwrap();
    let JobOutcome::Completed {
        document,
        sheets,
        geometry,
        plan,
        ..
    } = outcome
    else {
        panic!("job was cancelled");
    };

    assert!(plan.sheet_count() >= 3);
    assert_eq!(geometry.len(), plan.sheet_count());
    assert_eq!(sheets.len(), plan.sheet_count() * 2);
    for (i, cuts) in geometry.iter().enumerate() {
        assert_eq!(cuts.sheet_index, i);
        assert_eq!(sheets[2 * i].side, SheetSide::Front);
        assert_eq!(sheets[2 * i].sheet_index, i);
        assert_eq!(sheets[2 * i + 1].side, SheetSide::Back);
        assert_eq!(sheets[2 * i + 1].sheet_index, i);
        assert_eq!(document.sheets[i].index, i);
        assert_eq!(document.sheets[i].cuts.len(), cuts.cut_count());
    }
}

/// Cancels the job while the last image is being fetched
struct CancellingSource {
    inner: MemoryImageSource,
    cancel: CancelToken,
    trigger: String,
}

impl ImageSource for CancellingSource {
    fn resolve(&self, reference: &str) -> card_impose::Result<DynamicImage> {
        if reference == self.trigger {
            self.cancel.cancel();
        }
        self.inner.resolve(reference)
    }
}

#[tokio::test]
async fn test_cancel_after_imposition_stops_sheet_work() {
    let cancel = CancelToken::new();
    let source: Arc<dyn ImageSource> = Arc::new(CancellingSource {
        inner: MemoryImageSource::new()
            .with("a.png", art(20, 30, [200, 0, 0]))
            .with("b.png", art(20, 30, [0, 0, 200])),
        cancel: cancel.clone(),
        trigger: "b.png".to_string(),
    });

    let outcome = run_job(&manifest(), &small_job(), &JobMeta::new("test-job"), source, cancel)
        .await
        .unwrap();
    assert!(outcome.is_cancelled());
    // Artwork resolution finished and the cards were imposed before the stop
    let report = outcome.report();
    assert_eq!(report.placed, 8);
    assert!(report.sheets_used > 0);
}
