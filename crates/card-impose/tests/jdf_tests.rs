use card_impose::jdf::{CoordinateOrigin, Unit, sheet_artifact_name};
use card_impose::*;
use chrono::{Duration, Utc};

fn card(id: &str, quantity: usize) -> CardAsset {
    CardAsset {
        id: CardId::new(id),
        image: format!("{}.png", id),
        pixel_width: 744,
        pixel_height: 1039,
        dpi: 300,
        trim: Size::from_mm(63.0, 88.0),
        bleed: Length::from_mm(3.0),
        quantity,
        allow_rotation: true,
        back_image: None,
    }
}

fn press_sheet() -> SheetSpec {
    let mut spec = SheetSpec::new(Size::from_mm(330.0, 480.0));
    spec.margins = SheetMargins::uniform(Length::from_mm(5.0));
    spec.gutter = Length::from_mm(2.0);
    spec
}

fn planned() -> (PlacementPlan, Vec<CutGeometry>) {
    let cards: Vec<CardAsset> = (0..10).map(|i| card(&format!("card{:02}", i), 5)).collect();
    let (plan, _) = impose(&cards, &press_sheet()).unwrap();
    let geometry = plan.sheets.iter().map(extract_cuts).collect();
    (plan, geometry)
}

#[test]
fn test_round_trip_for_every_profile() {
    let (plan, geometry) = planned();
    let mut meta = JobMeta::new("poker-run");
    meta.description = Some("Poker deck & friends".to_string());

    for profile in [
        OutputProfile::millimetres(),
        OutputProfile::points(),
        OutputProfile::flatbed(),
    ] {
        let doc = encode(&plan, &geometry, &meta, &profile).unwrap();
        let xml = to_xml(&doc).unwrap();
        let parsed = parse_jdf(&xml).unwrap();

        parsed.verify_against(&doc).unwrap();
        assert_eq!(parsed.job_id, "poker-run");
        assert_eq!(parsed.unit, profile.unit);
        assert_eq!(parsed.origin, profile.origin);
        assert_eq!(parsed.sheet_count(), 3);
        assert_eq!(
            parsed.cut_count(),
            geometry.iter().map(CutGeometry::cut_count).sum::<usize>()
        );
        let trims: usize = parsed.sheets.iter().map(|s| s.trims.len()).sum();
        assert_eq!(trims, 50);
    }
}

#[test]
fn test_document_references_sheet_artifacts() {
    let (plan, geometry) = planned();
    let meta = JobMeta::new("poker-run");
    let doc = encode(&plan, &geometry, &meta, &OutputProfile::millimetres()).unwrap();

    let names: Vec<&str> = doc.sheets.iter().map(|s| s.artifact.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "poker-run_sheet_01.png",
            "poker-run_sheet_02.png",
            "poker-run_sheet_03.png"
        ]
    );
    assert!(doc.sheets.iter().all(|s| s.back_artifact.is_none()));

    let parsed = parse_jdf(&to_xml(&doc).unwrap()).unwrap();
    let first = &parsed.sheets[0];
    assert_eq!(first.block_name, "Sheet_01");
    assert_eq!(parsed.sheet_artifacts(first), ["poker-run_sheet_01.png".to_string()]);
}

#[test]
fn test_units_and_origins() {
    let (plan, geometry) = planned();
    let meta = JobMeta::new("units");

    let mm = encode(&plan, &geometry, &meta, &OutputProfile::millimetres()).unwrap();
    assert_eq!(mm.unit, Unit::Millimetre);
    assert_eq!(mm.origin, CoordinateOrigin::BottomLeft);
    assert_eq!((mm.media_width, mm.media_height), (330.0, 480.0));
    // First horizontal cut sits on the top margin, measured from the bottom
    assert_eq!(mm.sheets[0].cuts[0].position, 475.0);

    let flatbed = encode(&plan, &geometry, &meta, &OutputProfile::flatbed()).unwrap();
    assert_eq!(flatbed.origin, CoordinateOrigin::TopLeft);
    assert_eq!(flatbed.sheets[0].cuts[0].position, 5.0);

    let points = encode(&plan, &geometry, &meta, &OutputProfile::points()).unwrap();
    assert_eq!(points.unit, Unit::Point);
    assert!((points.media_width - 935.433).abs() < 1e-3);

    // Trim sizes do not depend on the origin
    for doc in [&mm, &flatbed] {
        let trim = &doc.sheets[0].trims[0];
        assert!((trim.width() - 63.0).abs() < 1e-9);
        assert!((trim.height() - 88.0).abs() < 1e-9);
    }
}

#[test]
fn test_duplex_references_back_sheets() {
    let (plan, geometry) = planned();
    let mut meta = JobMeta::new("duplex");
    meta.duplex = true;

    let doc = encode(&plan, &geometry, &meta, &OutputProfile::millimetres()).unwrap();
    assert_eq!(
        doc.sheets[1].back_artifact.as_deref(),
        Some(sheet_artifact_name("duplex", 1, SheetSide::Back).as_str())
    );

    let parsed = parse_jdf(&to_xml(&doc).unwrap()).unwrap();
    parsed.verify_against(&doc).unwrap();
    assert_eq!(parsed.sheet_artifacts(&parsed.sheets[1]).len(), 2);
}

#[test]
fn test_builder_rejects_incomplete_jobs() {
    let (_, geometry) = planned();
    let now = Utc::now();
    let complete = || {
        JobDocumentBuilder::new()
            .job_id("job")
            .media(Size::from_mm(330.0, 480.0), "Paper")
            .profile(OutputProfile::millimetres())
            .schedule(now, now + Duration::minutes(30))
            .sheet(Some("job_sheet_01.png".to_string()), None, geometry[0].clone())
    };
    assert!(complete().build().is_ok());

    let no_id = JobDocumentBuilder::new()
        .media(Size::from_mm(330.0, 480.0), "Paper")
        .profile(OutputProfile::millimetres())
        .schedule(now, now)
        .sheet(Some("a.png".to_string()), None, geometry[0].clone());
    assert!(matches!(no_id.build(), Err(ImposeError::Encoding(_))));

    let spaced = complete().job_id("my job");
    assert!(matches!(spaced.build(), Err(ImposeError::Encoding(_))));

    let backwards = complete().schedule(now, now - Duration::minutes(1));
    assert!(matches!(backwards.build(), Err(ImposeError::Encoding(_))));

    let wrong_media = complete().media(Size::from_mm(320.0, 450.0), "Paper");
    assert!(matches!(wrong_media.build(), Err(ImposeError::Encoding(_))));

    let no_artifact = complete().sheet(None, None, geometry[1].clone());
    assert!(matches!(no_artifact.build(), Err(ImposeError::Encoding(_))));

    // Geometry for sheet 3 handed in as the second sheet
    let out_of_order = complete().sheet(Some("b.png".to_string()), None, geometry[2].clone());
    assert!(matches!(out_of_order.build(), Err(ImposeError::Encoding(_))));
}

#[test]
fn test_encode_checks_geometry_count() {
    let (plan, geometry) = planned();
    let meta = JobMeta::new("short");
    let result = encode(&plan, &geometry[..2], &meta, &OutputProfile::millimetres());
    assert!(matches!(result, Err(ImposeError::Encoding(_))));
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_jdf("<JDF><ResourcePool>").is_err());
    assert!(parse_jdf("not xml at all").is_err());
}

#[test]
fn test_profile_sets_jdf_version() {
    let (plan, geometry) = planned();
    let meta = JobMeta::new("versioned");

    let doc = encode(&plan, &geometry, &meta, &OutputProfile::millimetres()).unwrap();
    assert_eq!(doc.version, "1.3");

    let mut profile = OutputProfile::millimetres();
    profile.schema_version = "1.4".to_string();
    let doc = encode(&plan, &geometry, &meta, &profile).unwrap();
    let xml = to_xml(&doc).unwrap();
    assert!(xml.contains(r#"Version="1.4""#));

    let parsed = parse_jdf(&xml).unwrap();
    assert_eq!(parsed.version, "1.4");
    parsed.verify_against(&doc).unwrap();

    // A file written for another version does not match this document
    let older = encode(&plan, &geometry, &meta, &OutputProfile::millimetres()).unwrap();
    assert!(matches!(
        parsed.verify_against(&older),
        Err(ImposeError::Encoding(_))
    ));

    for bad in ["2.0", "abc"] {
        profile.schema_version = bad.to_string();
        assert!(matches!(
            encode(&plan, &geometry, &meta, &profile),
            Err(ImposeError::Encoding(_))
        ));
    }
}
