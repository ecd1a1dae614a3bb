//! Resital Plus story generator
//!
//! Turns a small real-estate listing form into a fixed-size "story" card and
//! exports it as a 1080x1920 JPEG for social media.
//!
//! # Pipeline
//!
//! - **Form** (`form::StoryForm`): routes every edit through the phone/price
//!   formatters into the session `StoryState`, and takes the three photos.
//! - **Preview** (`rendering::render_preview`): lays the card out at 360x640
//!   logical pixels and yields a `PreviewTree` of paint commands.
//! - **Export** (`export::ExportDriver`): rasterizes the tree at 3x on a worker
//!   thread and hands the JPEG to a download sink.
//!
//! # Example
//!
//! ```no_run
//! use resital_story::export::{DirectorySink, ExportDriver};
//! use resital_story::form::StoryForm;
//! use resital_story::listing::Field;
//! use resital_story::notify::ConsoleNotifier;
//! use resital_story::{async_api::RasterWorker, StoryConfig, StoryState};
//! use std::sync::Arc;
//!
//! # async fn run() -> resital_story::Result<()> {
//! let config = StoryConfig::default();
//! let mut state = StoryState::new();
//! let notifier = ConsoleNotifier;
//! let mut form = StoryForm::new(&mut state, &notifier);
//! form.on_change(Field::GsmNumber, "5551234567")?;
//! form.on_change(Field::Price, "3500000")?;
//!
//! let tree = resital_story::rendering::render_preview(&state);
//! let worker = RasterWorker::with_config(config.clone()).await?;
//! let driver = ExportDriver::new(
//!     worker,
//!     DirectorySink::new(&config.output_dir),
//!     Arc::new(ConsoleNotifier),
//!     config.export.clone(),
//! );
//! driver.export(Some(&tree)).await;
//! # Ok(())
//! # }
//! ```

#![deny(unused_doc_comments)]

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod format;
pub mod listing;
pub mod notify;
pub mod photo;
pub mod state;
pub use state::StoryState;

pub mod form;

// Preview layout + built-in rasterizer (the latter gated by `skia`)
pub mod rendering;

// Worker-thread rasterization behind an async facade
pub mod async_api;

pub mod export;

/// Logical card width in pixels.
pub const CARD_WIDTH: u32 = 360;
/// Logical card height in pixels.
pub const CARD_HEIGHT: u32 = 640;
/// Export width expected by the story format.
pub const STORY_WIDTH: u32 = 1080;
/// Export height expected by the story format.
pub const STORY_HEIGHT: u32 = 1920;

/// Logical dimensions of the preview card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        }
    }
}

/// Encoded output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Rasterization settings for an export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Encoder quality as a fraction of the maximum (JPEG only)
    pub quality: f32,
    /// Device pixels per logical pixel
    pub pixel_ratio: u32,
    pub format: OutputFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: 0.98,
            pixel_ratio: 3,
            format: OutputFormat::Jpeg,
        }
    }
}

impl ExportOptions {
    /// Pixel size of the export for a card of `viewport` size.
    pub fn output_size(&self, viewport: Viewport) -> (u32, u32) {
        (
            viewport.width * self.pixel_ratio,
            viewport.height * self.pixel_ratio,
        )
    }

    /// Quality mapped onto the JPEG encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Configuration for the story generator
///
/// # Examples
///
/// ```
/// let cfg = resital_story::StoryConfig::default();
/// assert_eq!(cfg.export.output_size(cfg.viewport), (1080, 1920));
/// ```
#[derive(Debug, Clone)]
pub struct StoryConfig {
    /// Logical card size
    pub viewport: Viewport,
    /// Export rasterization settings
    pub export: ExportOptions,
    /// Directory receiving exported stories
    pub output_dir: PathBuf,
    /// Preferred font families, in priority order
    pub font_families: Vec<String>,
    /// Font file loaded ahead of the system fonts
    pub font_file: Option<PathBuf>,
    /// Whether to search the system font directories
    pub load_system_fonts: bool,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            export: ExportOptions::default(),
            output_dir: PathBuf::from("."),
            font_families: vec!["Montserrat".to_string(), "sans-serif".to_string()],
            font_file: None,
            load_system_fonts: true,
        }
    }
}

impl StoryConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.export.quality > 0.0 && self.export.quality <= 1.0) {
            return Err(Error::ConfigError(format!(
                "quality must be in (0, 1], got {}",
                self.export.quality
            )));
        }
        if self.export.pixel_ratio == 0 {
            return Err(Error::ConfigError("pixel ratio must be at least 1".into()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must not be empty".into()));
        }
        Ok(())
    }
}

/// Rasterization capability: paints a preview tree and encodes the result.
pub trait Rasterizer {
    fn rasterize(&self, tree: &rendering::PreviewTree, options: &ExportOptions)
        -> Result<rendering::Screenshot>;
}

/// Create the default rasterizer backend.
#[cfg(feature = "skia")]
pub fn new_rasterizer(config: &StoryConfig) -> Result<impl Rasterizer> {
    config.validate()?;
    rendering::raster::SkiaRasterizer::new(config)
}
