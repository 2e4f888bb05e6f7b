use anyhow::{Context, Result, bail};
use card_impose::{
    BleedSource, CancelToken, CardManifest, FailurePolicy, FsImageSource, JobMeta, JobOptions,
    JobOutcome, Length, OrientationPolicy, OutputProfile, SheetMargins, Size,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cardt", about = "Card imposition and cut-job tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Impose a manifest, render sheets and write the cutting job
    Impose {
        /// Card manifest (.csv or .json)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Directory image references are resolved against
        /// (defaults to the manifest's directory)
        #[arg(long)]
        images: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Job identifier used in file names and the JDF
        #[arg(long, default_value = "cards")]
        job_id: String,

        /// Job description written to the JDF
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Render resolution
        #[arg(long)]
        dpi: Option<u32>,

        /// Add crop marks at card trim corners
        #[arg(long)]
        crop_marks: bool,

        /// Add registration marks in the sheet margins
        #[arg(long)]
        registration_marks: bool,

        /// Outline each card's bleed box
        #[arg(long)]
        outline: bool,

        /// Render back sheets from each card's back image
        #[arg(long)]
        duplex: bool,

        /// Whether card images already include bleed
        #[arg(long, value_enum)]
        bleed_source: Option<BleedArg>,

        /// Cut file units and origin
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,

        /// JDF version written to the cut file (1.x)
        #[arg(long)]
        jdf_version: Option<String>,

        /// What to do when a card image is missing
        #[arg(long, value_enum)]
        on_missing: Option<PolicyArg>,

        /// What to do when a card does not fit the sheet
        #[arg(long, value_enum)]
        on_oversized: Option<PolicyArg>,

        /// Also write all sheets as one PDF
        #[arg(long)]
        pdf: bool,
    },

    /// Show how a manifest would be imposed without rendering
    Stats {
        /// Card manifest (.csv or .json)
        #[arg(short, long)]
        manifest: PathBuf,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Parse a cutting job file and print its summary
    Verify {
        /// JDF file
        jdf: PathBuf,
    },

    /// Write the default job options as JSON, as a starting point for --config
    InitConfig {
        /// Output JSON file
        output: PathBuf,
    },
}

#[derive(Args)]
struct SheetArgs {
    /// Job options JSON (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sheet paper size
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// Custom sheet width in mm (with --sheet-height)
    #[arg(long, requires = "sheet_height")]
    sheet_width: Option<f64>,

    /// Custom sheet height in mm (with --sheet-width)
    #[arg(long, requires = "sheet_width")]
    sheet_height: Option<f64>,

    /// Sheet margin in mm (uniform on all sides)
    #[arg(long)]
    margin: Option<f64>,

    /// Gutter between cards in mm
    #[arg(long)]
    gutter: Option<f64>,

    /// Maximum number of sheets
    #[arg(long)]
    max_sheets: Option<usize>,

    /// Which rotations are allowed
    #[arg(long, value_enum)]
    rotation: Option<RotationArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A3Plus,
    A4,
    Sra3,
    Letter,
    Tabloid,
}

#[derive(Clone, Copy, ValueEnum)]
enum RotationArg {
    Fixed,
    Cards,
    Sheet,
    Any,
}

#[derive(Clone, Copy, ValueEnum)]
enum BleedArg {
    Included,
    Generated,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Millimetres,
    Points,
    Flatbed,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Abort,
    Skip,
}

impl From<PaperArg> for card_impose::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A3Plus => Self::A3Plus,
            PaperArg::A4 => Self::A4,
            PaperArg::Sra3 => Self::Sra3,
            PaperArg::Letter => Self::Letter,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

impl From<RotationArg> for OrientationPolicy {
    fn from(arg: RotationArg) -> Self {
        match arg {
            RotationArg::Fixed => Self::Fixed,
            RotationArg::Cards => Self::RotateCards,
            RotationArg::Sheet => Self::RotateSheet,
            RotationArg::Any => Self::Any,
        }
    }
}

impl From<BleedArg> for BleedSource {
    fn from(arg: BleedArg) -> Self {
        match arg {
            BleedArg::Included => Self::Included,
            BleedArg::Generated => Self::Generated,
        }
    }
}

impl From<ProfileArg> for OutputProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Millimetres => Self::millimetres(),
            ProfileArg::Points => Self::points(),
            ProfileArg::Flatbed => Self::flatbed(),
        }
    }
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => Self::Abort,
            PolicyArg::Skip => Self::Skip,
        }
    }
}

impl SheetArgs {
    /// Options from the config file (or defaults) with sheet flags applied
    async fn job_options(&self) -> Result<JobOptions> {
        let mut options = match &self.config {
            Some(path) => JobOptions::load(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => JobOptions::default(),
        };

        let sheet = &mut options.sheet;
        if let Some(paper) = self.paper {
            let (w, h) = card_impose::PaperSize::from(paper).dimensions_mm();
            sheet.size = Size::from_mm(w, h);
        }
        if let (Some(w), Some(h)) = (self.sheet_width, self.sheet_height) {
            sheet.size = Size::from_mm(w, h);
        }
        if let Some(margin) = self.margin {
            sheet.margins = SheetMargins::uniform(Length::from_mm(margin));
        }
        if let Some(gutter) = self.gutter {
            sheet.gutter = Length::from_mm(gutter);
        }
        if self.max_sheets.is_some() {
            sheet.max_sheets = self.max_sheets;
        }
        if let Some(rotation) = self.rotation {
            sheet.orientation = rotation.into();
        }
        Ok(options)
    }
}

fn print_report(report: &card_impose::JobReport) {
    println!("  Requested: {}", report.requested);
    println!("  Placed: {}", report.placed);
    println!("  Sheets: {}", report.sheets_used);
    for skipped in &report.skipped {
        println!(
            "  Skipped {} x {}: {}",
            skipped.count, skipped.card_id, skipped.reason
        );
    }
}

fn image_root(manifest: &Path, images: Option<PathBuf>) -> PathBuf {
    images.unwrap_or_else(|| {
        manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Impose {
            manifest,
            images,
            output,
            job_id,
            description,
            sheet,
            dpi,
            crop_marks,
            registration_marks,
            outline,
            duplex,
            bleed_source,
            profile,
            jdf_version,
            on_missing,
            on_oversized,
            pdf,
        } => {
            let mut options = sheet.job_options().await?;
            if let Some(dpi) = dpi {
                options.render.dpi = dpi;
            }
            options.render.marks.crop_marks |= crop_marks;
            options.render.marks.registration_marks |= registration_marks;
            options.render.marks.reference_outline |= outline;
            options.render.duplex |= duplex;
            if let Some(bleed) = bleed_source {
                options.render.bleed_source = bleed.into();
            }
            if let Some(profile) = profile {
                options.profile = profile.into();
            }
            if let Some(version) = jdf_version {
                options.profile.schema_version = version;
            }
            if let Some(policy) = on_missing {
                options.policy.missing_asset = policy.into();
            }
            if let Some(policy) = on_oversized {
                options.policy.oversized_card = policy.into();
            }

            let cards = CardManifest::load(&manifest)
                .await
                .with_context(|| format!("Failed to load {}", manifest.display()))?;
            let source = Arc::new(FsImageSource::new(image_root(&manifest, images)));

            let mut meta = JobMeta::new(job_id);
            meta.description = description;

            let cancel = CancelToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted, cancelling job");
                    on_interrupt.cancel();
                }
            });

            let outcome = match card_impose::run_job(&cards, &options, &meta, source, cancel).await
            {
                Ok(outcome) => outcome,
                Err(failure) => {
                    if let Some(report) = &failure.report {
                        println!("Job failed:");
                        print_report(report);
                    }
                    return Err(failure.into());
                }
            };

            match outcome {
                JobOutcome::Completed {
                    document,
                    xml,
                    sheets,
                    report,
                    ..
                } => {
                    let written = card_impose::save_job_artifacts(
                        &output, &document, &xml, &sheets, &report, pdf,
                    )
                    .await?;
                    println!("Job {}:", document.job_id);
                    print_report(&report);
                    println!("  Cuts: {}", document.cut_count());
                    println!("Cutting job → {}", written.jdf.display());
                    if let Some(pdf) = written.pdf {
                        println!("Sheets PDF → {}", pdf.display());
                    }
                }
                JobOutcome::Cancelled { report } => {
                    println!("Job cancelled:");
                    print_report(&report);
                    bail!("job cancelled");
                }
            }
        }

        Commands::Stats { manifest, sheet } => {
            let options = sheet.job_options().await?;
            let cards = CardManifest::load(&manifest)
                .await
                .with_context(|| format!("Failed to load {}", manifest.display()))?;

            let stats = card_impose::calculate_statistics(&cards, &options.sheet)?;
            println!("Imposition Statistics:");
            println!("  Designs: {}", stats.designs);
            println!("  Requested: {}", stats.requested);
            println!("  Placed: {}", stats.placed);
            println!("  Skipped: {}", stats.skipped);
            println!("  Sheets: {}", stats.sheets);
            println!("  Cards per full sheet: {}", stats.yield_per_sheet());
            println!("  Utilization: {:.1}%", stats.utilization * 100.0);
            println!("  Cut length: {:.1} mm", stats.cut_length_mm);
            if stats.sheet_rotated {
                println!("  Sheet turned for a better yield");
            }
        }

        Commands::Verify { jdf } => {
            let xml = card_impose::load_jdf(&jdf).await?;
            let job = card_impose::parse_jdf(&xml)
                .with_context(|| format!("Failed to parse {}", jdf.display()))?;
            println!("Job {} (JDF {}):", job.job_id, job.version);
            println!(
                "  Media: {} x {} {}",
                job.media.0,
                job.media.1,
                job.unit.symbol()
            );
            for sheet in &job.sheets {
                if sheet.declared_cuts != sheet.cuts.len() {
                    bail!(
                        "{} declares {} cuts but contains {}",
                        sheet.block_name,
                        sheet.declared_cuts,
                        sheet.cuts.len()
                    );
                }
                println!(
                    "  {}: {} cut(s), {} card(s), artwork {}",
                    sheet.block_name,
                    sheet.cuts.len(),
                    sheet.trims.len(),
                    job.sheet_artifacts(sheet).join(", ")
                );
            }
        }

        Commands::InitConfig { output } => {
            JobOptions::default().save(&output).await?;
            println!("Default options → {}", output.display());
        }
    }

    Ok(())
}
