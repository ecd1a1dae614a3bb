use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use resital_story::async_api::RasterWorker;
use resital_story::export::{DirectorySink, ExportDriver, ExportOutcome};
use resital_story::form::StoryForm;
use resital_story::listing::{ListingData, ListingInput};
use resital_story::notify::{ConsoleNotifier, Notifier};
use resital_story::rendering::font::FontSystem;
use resital_story::rendering::raster::SkiaRasterizer;
use resital_story::rendering::render_preview_measured;
use resital_story::{StoryConfig, StoryState};

/// Generate a 1080x1920 real-estate listing story image.
#[derive(Debug, Parser)]
#[command(name = "resital-story", version, about)]
struct Cli {
    /// JSON file with raw listing input (flags below override it)
    #[arg(long)]
    listing: Option<PathBuf>,

    /// Consultant name
    #[arg(long)]
    name: Option<String>,

    /// Consultant GSM number, digits in any grouping
    #[arg(long)]
    gsm: Option<String>,

    /// Listing type label, e.g. "Satılık"
    #[arg(long)]
    listing_type: Option<String>,

    /// Portfolio type label, e.g. "Konut"
    #[arg(long)]
    portfolio_type: Option<String>,

    /// Price, digits in any grouping
    #[arg(long)]
    price: Option<String>,

    /// Location line
    #[arg(long)]
    location: Option<String>,

    /// Listing headline (30 characters max)
    #[arg(long)]
    headline: Option<String>,

    #[arg(long)]
    consultant_photo: Option<PathBuf>,

    #[arg(long)]
    portfolio_photo: Option<PathBuf>,

    #[arg(long)]
    logo: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Font file to prefer over system fonts
    #[arg(long)]
    font: Option<PathBuf>,

    /// Only use the font given with --font
    #[arg(long)]
    no_system_fonts: bool,

    /// JPEG quality in (0, 1]
    #[arg(long, default_value_t = 0.98)]
    quality: f32,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,

    /// Print the formatted listing and preview texts without exporting
    #[arg(long)]
    dry_run: bool,

    /// More logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> StoryConfig {
        let mut config = StoryConfig {
            output_dir: self.out.clone(),
            font_file: self.font.clone(),
            load_system_fonts: !self.no_system_fonts,
            ..StoryConfig::default()
        };
        config.export.quality = self.quality;
        config
    }

    fn field_input(&self) -> ListingInput {
        ListingInput {
            consultant_name: self.name.clone(),
            gsm_number: self.gsm.clone(),
            listing_type: self.listing_type.clone(),
            portfolio_type: self.portfolio_type.clone(),
            price: self.price.clone(),
            location: self.location.clone(),
            headline: self.headline.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DryRunReport<'a> {
    listing: &'a ListingData,
    texts: Vec<&'a str>,
    images: usize,
    digest: String,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    config.validate().context("invalid options")?;

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let mut state = StoryState::new();
    {
        let mut form = StoryForm::new(&mut state, notifier.as_ref());

        if let Some(path) = &cli.listing {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let input = ListingInput::from_json(&text)?;
            form.apply_input(&input).context("applying listing file")?;
        }
        form.apply_input(&cli.field_input())
            .context("applying listing flags")?;

        // An unreadable photo leaves its slot empty; the story still renders
        if let Some(path) = &cli.consultant_photo {
            match form.on_consultant_photo(path.clone()).await {
                Ok(check) => info!("Consultant photo is {}x{}", check.width, check.height),
                Err(e) => warn!("Skipping consultant photo {}: {}", path.display(), e),
            }
        }
        if let Some(path) = &cli.portfolio_photo {
            if let Err(e) = form.on_portfolio_photo(path.clone()).await {
                warn!("Skipping portfolio photo {}: {}", path.display(), e);
            }
        }
        if let Some(path) = &cli.logo {
            if let Err(e) = form.on_logo(path.clone()).await {
                warn!("Skipping logo {}: {}", path.display(), e);
            }
        }
    }

    // One font lookup serves both line breaking and painting
    let fonts = FontSystem::new(
        &config.font_families,
        config.font_file.as_deref(),
        config.load_system_fonts,
    )
    .context("loading fonts")?;
    let tree = render_preview_measured(&state, config.viewport, &fonts);

    if cli.dry_run {
        if cli.json {
            let report = DryRunReport {
                listing: &state.listing,
                texts: tree.texts().collect(),
                images: tree.image_count(),
                digest: tree.digest(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for text in tree.texts() {
                println!("{}", text);
            }
        }
        return Ok(());
    }

    let worker = RasterWorker::new(move || Ok(SkiaRasterizer::with_fonts(fonts)))
        .await
        .context("starting rasterizer")?;
    let driver = ExportDriver::new(
        worker.clone(),
        DirectorySink::new(&config.output_dir),
        notifier,
        config.export.clone(),
    );

    let outcome = driver.export(Some(&tree)).await;
    worker.close().await?;

    match outcome {
        ExportOutcome::Saved(saved) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&saved)?);
            } else {
                println!("{}", saved.path.display());
            }
            Ok(())
        }
        ExportOutcome::Failed(detail) => bail!("export failed: {}", detail),
        ExportOutcome::NotReady | ExportOutcome::Busy => bail!("export did not run"),
    }
}
