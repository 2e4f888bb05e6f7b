//! Artifact I/O: sheet images, sheet PDF, cutting job and report

use crate::jdf::{CuttingJobDocument, sheet_artifact_name};
use crate::render::{SheetImage, sheets_to_pdf};
use crate::report::JobReport;
use crate::types::*;
use image::ImageFormat;
use lopdf::Document;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Paths written by [`save_job_artifacts`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArtifacts {
    pub sheets: Vec<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub jdf: PathBuf,
    pub report: PathBuf,
}

/// Save one sheet image as PNG
pub async fn save_sheet_png(image: &SheetImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let pixels = image.image.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        let mut buffer = Cursor::new(Vec::new());
        pixels.write_to(&mut buffer, ImageFormat::Png)?;
        Ok::<_, ImposeError>(buffer.into_inner())
    })
    .await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

/// Save a PDF document
pub async fn save_pdf(mut doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::task::spawn_blocking(move || {
        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok::<_, ImposeError>(writer)
    })
    .await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

/// Save the serialized cutting job
pub async fn save_jdf(xml: &str, path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, xml).await?;
    Ok(())
}

/// Read a cutting job back from disk
pub async fn load_jdf(path: impl AsRef<Path>) -> Result<String> {
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Save the job report as JSON
#[cfg(feature = "serde")]
pub async fn save_report(report: &JobReport, path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, report.to_json()?).await?;
    Ok(())
}

/// Write every artifact of a completed job into `dir`
///
/// File names follow the names referenced by the cutting job, so the JDF
/// file can be handed to the cutter together with the sheet images.
#[cfg(feature = "serde")]
pub async fn save_job_artifacts(
    dir: impl AsRef<Path>,
    document: &CuttingJobDocument,
    xml: &str,
    sheets: &[SheetImage],
    report: &JobReport,
    write_pdf: bool,
) -> Result<JobArtifacts> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let job_id = &document.job_id;

    let mut sheet_paths = Vec::with_capacity(sheets.len());
    for image in sheets {
        let path = dir.join(sheet_artifact_name(job_id, image.sheet_index, image.side));
        save_sheet_png(image, &path).await?;
        log::debug!("Wrote {}", path.display());
        sheet_paths.push(path);
    }

    let pdf = if write_pdf {
        let path = dir.join(format!("{}_sheets.pdf", job_id));
        let doc = sheets_to_pdf(sheets)?;
        save_pdf(doc, &path).await?;
        Some(path)
    } else {
        None
    };

    let jdf = dir.join(format!("{}.jdf", job_id));
    save_jdf(xml, &jdf).await?;

    let report_path = dir.join(format!("{}_report.json", job_id));
    save_report(report, &report_path).await?;

    log::info!(
        "Wrote {} sheet image(s) and {} to {}",
        sheet_paths.len(),
        jdf.display(),
        dir.display()
    );

    Ok(JobArtifacts {
        sheets: sheet_paths,
        pdf,
        jdf,
        report: report_path,
    })
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::cuts::extract_cuts;
    use crate::impose::impose;
    use crate::jdf::{JobMeta, OutputProfile, encode, to_xml};
    use crate::layout::{Length, Size};
    use crate::manifest::CardAsset;
    use crate::options::SheetSpec;
    use image::RgbImage;

    #[tokio::test]
    async fn test_artifacts_use_document_names() {
        let mut card = CardAsset::from_pixels("ace", "ace.png", 10, 10, 10, 1);
        card.bleed = Length::ZERO;
        let spec = SheetSpec::new(Size::from_mm(50.8, 50.8));
        let (plan, report) = impose(&[card], &spec).unwrap();
        let geometry: Vec<_> = plan.sheets.iter().map(extract_cuts).collect();
        let document = encode(
            &plan,
            &geometry,
            &JobMeta::new("io-test"),
            &OutputProfile::millimetres(),
        )
        .unwrap();
        let xml = to_xml(&document).unwrap();
        let sheets = vec![SheetImage {
            sheet_index: 0,
            side: SheetSide::Front,
            dpi: 10,
            image: RgbImage::new(20, 20),
            skipped: Vec::new(),
        }];

        let dir = tempfile::tempdir().unwrap();
        let written = save_job_artifacts(dir.path(), &document, &xml, &sheets, &report, true)
            .await
            .unwrap();

        assert_eq!(written.sheets, vec![dir.path().join("io-test_sheet_01.png")]);
        assert_eq!(written.jdf, dir.path().join("io-test.jdf"));
        assert_eq!(written.pdf, Some(dir.path().join("io-test_sheets.pdf")));

        let png = image::open(&written.sheets[0]).unwrap();
        assert_eq!((png.width(), png.height()), (20, 20));
        assert_eq!(load_jdf(&written.jdf).await.unwrap(), xml);
        let json = tokio::fs::read_to_string(&written.report).await.unwrap();
        assert!(json.contains("\"placed\": 1"));
        assert!(Document::load(written.pdf.unwrap()).is_ok());
    }
}
