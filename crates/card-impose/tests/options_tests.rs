use card_impose::*;

#[test]
fn test_default_options_are_valid() {
    let options = JobOptions::default();
    options.validate().unwrap();
    assert_eq!(options.sheet.size, Size::from_mm(329.0, 483.0));
    assert_eq!(options.policy.missing_asset, FailurePolicy::Abort);
    assert_eq!(options.policy.oversized_card, FailurePolicy::Skip);
    assert_eq!(options.profile, OutputProfile::millimetres());
}

#[test]
fn test_validation_errors() {
    let mut options = JobOptions::default();
    options.render.dpi = 0;
    assert!(matches!(options.validate(), Err(ImposeError::Validation(_))));

    // A3+ at 2000 DPI is wider than any canvas we allocate
    let mut options = JobOptions::default();
    options.render.dpi = 2000;
    assert!(matches!(options.validate(), Err(ImposeError::Validation(_))));

    let mut options = JobOptions::default();
    options.sheet.gutter = Length::from_mm(-1.0);
    assert!(matches!(options.validate(), Err(ImposeError::Validation(_))));

    let mut options = JobOptions::default();
    options.sheet.max_sheets = Some(0);
    assert!(matches!(options.validate(), Err(ImposeError::Validation(_))));

    let mut options = JobOptions::default();
    options.profile.precision = 9;
    assert!(matches!(options.validate(), Err(ImposeError::Config(_))));
}

#[test]
fn test_sheet_rotation_swaps_margins() {
    let mut spec = SheetSpec::new(Size::from_mm(300.0, 400.0));
    spec.margins = SheetMargins {
        top: Length::from_mm(1.0),
        right: Length::from_mm(2.0),
        bottom: Length::from_mm(3.0),
        left: Length::from_mm(4.0),
    };

    let turned = spec.rotated();
    assert_eq!(turned.size, Size::from_mm(400.0, 300.0));
    assert_eq!(turned.margins.top, Length::from_mm(4.0));
    assert_eq!(turned.margins.right, Length::from_mm(1.0));
    assert_eq!(
        turned.printable_area().size,
        spec.printable_area().size.rotated()
    );
}

#[tokio::test]
async fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");

    let mut options = JobOptions::default();
    options.sheet = SheetSpec::from_paper(PaperSize::Sra3, Orientation::Landscape);
    options.sheet.max_sheets = Some(4);
    options.render.dpi = 600;
    options.render.marks.crop_marks = true;
    options.profile = OutputProfile::flatbed();
    options.save(&path).await.unwrap();

    let loaded = JobOptions::load(&path).await.unwrap();
    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_margins_accept_a_single_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    JobOptions::default().save(&path).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
    json["sheet"]["margins"] = serde_json::json!(7.5);
    json["sheet"]["gutter"] = serde_json::json!(0);
    std::fs::write(&path, json.to_string()).unwrap();

    let loaded = JobOptions::load(&path).await.unwrap();
    assert_eq!(loaded.sheet.margins, SheetMargins::uniform(Length::from_mm(7.5)));
    assert_eq!(loaded.sheet.gutter, Length::ZERO);
}

#[tokio::test]
async fn test_load_rejects_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"sheet\": 12 }").unwrap();

    assert!(matches!(
        JobOptions::load(&path).await,
        Err(ImposeError::Config(_))
    ));
    assert!(matches!(
        JobOptions::load(dir.path().join("absent.json")).await,
        Err(ImposeError::Io(_))
    ));
}
