//! Export driver: rasterizes the preview once per request and saves the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info};
use serde::Serialize;

use crate::async_api::RasterWorker;
use crate::notify::{Notifier, EXPORT_FAILED_ALERT};
use crate::rendering::{PreviewTree, Screenshot};
use crate::{Error, ExportOptions, OutputFormat, Result};

/// Prefix of every exported file name.
pub const FILENAME_PREFIX: &str = "resital-plus-story-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Generating,
}

/// Where a finished export goes.
pub trait DownloadSink: Send + Sync {
    /// Consume `artifact` and store it under `filename`.
    fn save(&self, filename: &str, artifact: Screenshot) -> Result<SavedStory>;
}

/// Writes exports into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, artifact: Screenshot) -> Result<SavedStory> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, &artifact.data)?;
        debug!("Wrote {} bytes to {}", artifact.data.len(), path.display());
        Ok(SavedStory {
            filename: filename.to_string(),
            path,
            bytes_written: artifact.data.len(),
            width: artifact.width,
            height: artifact.height,
        })
    }
}

/// Report for one saved export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStory {
    pub filename: String,
    pub path: PathBuf,
    pub bytes_written: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No preview to capture yet; nothing happened.
    NotReady,
    /// An export is already in flight; the request was dropped.
    Busy,
    Saved(SavedStory),
    /// The export failed; the user was alerted with a generic message.
    Failed(String),
}

/// `resital-plus-story-<millis>.<ext>`
pub fn export_filename(epoch_millis: i64, format: OutputFormat) -> String {
    format!("{}{}.{}", FILENAME_PREFIX, epoch_millis, format.extension())
}

/// Drives exports through an `Idle`/`Generating` state machine.
///
/// At most one export is in flight: a request made while `Generating` comes
/// back as [`ExportOutcome::Busy`] without touching the rasterizer.
pub struct ExportDriver<S> {
    worker: RasterWorker,
    sink: S,
    notifier: Arc<dyn Notifier>,
    options: ExportOptions,
    state: Mutex<ExportState>,
}

/// Returns the driver to `Idle` when the export finishes or is dropped.
struct Generating<'a> {
    state: &'a Mutex<ExportState>,
}

impl Drop for Generating<'_> {
    fn drop(&mut self) {
        *lock(self.state) = ExportState::Idle;
    }
}

fn lock(state: &Mutex<ExportState>) -> MutexGuard<'_, ExportState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: DownloadSink> ExportDriver<S> {
    pub fn new(
        worker: RasterWorker,
        sink: S,
        notifier: Arc<dyn Notifier>,
        options: ExportOptions,
    ) -> Self {
        Self {
            worker,
            sink,
            notifier,
            options,
            state: Mutex::new(ExportState::Idle),
        }
    }

    pub fn state(&self) -> ExportState {
        *lock(&self.state)
    }

    /// Whether the export control accepts a request.
    pub fn trigger_enabled(&self) -> bool {
        self.state() == ExportState::Idle
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Rasterize `tree` and save it.
    pub async fn export(&self, tree: Option<&PreviewTree>) -> ExportOutcome {
        let Some(tree) = tree else {
            debug!("Export requested before the preview exists; ignoring");
            return ExportOutcome::NotReady;
        };
        let Some(_generating) = self.begin() else {
            debug!("Export already in progress; ignoring request");
            return ExportOutcome::Busy;
        };

        match self.run(tree).await {
            Ok(saved) => {
                info!("Saved story to {}", saved.path.display());
                ExportOutcome::Saved(saved)
            }
            Err(e) => {
                error!("Story export failed: {}", e);
                self.notifier.alert(EXPORT_FAILED_ALERT);
                ExportOutcome::Failed(e.to_string())
            }
        }
    }

    fn begin(&self) -> Option<Generating<'_>> {
        let mut state = lock(&self.state);
        if *state == ExportState::Generating {
            return None;
        }
        *state = ExportState::Generating;
        Some(Generating { state: &self.state })
    }

    async fn run(&self, tree: &PreviewTree) -> Result<SavedStory> {
        let shot = self
            .worker
            .rasterize(tree.clone(), self.options.clone())
            .await?;

        let (expected_width, expected_height) = self.options.output_size(tree.viewport);
        if shot.width != expected_width || shot.height != expected_height {
            return Err(Error::OutputSize {
                width: shot.width,
                height: shot.height,
                expected_width,
                expected_height,
            });
        }

        let filename = export_filename(chrono::Utc::now().timestamp_millis(), shot.format);
        self.sink.save(&filename, shot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notice, RecordingNotifier};
    use crate::rendering::render_preview;
    use crate::{Rasterizer, StoryState};

    /// Returns a frame of a fixed size regardless of the request.
    struct SizedRasterizer(u32, u32);

    impl Rasterizer for SizedRasterizer {
        fn rasterize(&self, _tree: &PreviewTree, options: &ExportOptions) -> Result<Screenshot> {
            Ok(Screenshot {
                width: self.0,
                height: self.1,
                format: options.format,
                data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            })
        }
    }

    async fn driver(
        w: u32,
        h: u32,
        dir: &Path,
        notifier: Arc<RecordingNotifier>,
    ) -> ExportDriver<DirectorySink> {
        let worker = RasterWorker::new(move || Ok(SizedRasterizer(w, h)))
            .await
            .unwrap();
        ExportDriver::new(
            worker,
            DirectorySink::new(dir),
            notifier,
            ExportOptions::default(),
        )
    }

    #[test]
    fn filename_embeds_timestamp() {
        assert_eq!(
            export_filename(1_700_000_000_123, OutputFormat::Jpeg),
            "resital-plus-story-1700000000123.jpeg"
        );
        assert_eq!(
            export_filename(5, OutputFormat::Png),
            "resital-plus-story-5.png"
        );
    }

    #[test]
    fn directory_sink_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("nested/out"));
        let saved = sink
            .save(
                "a.jpeg",
                Screenshot {
                    width: 2,
                    height: 3,
                    format: OutputFormat::Jpeg,
                    data: vec![9; 7],
                },
            )
            .unwrap();
        assert_eq!(saved.bytes_written, 7);
        assert_eq!(fs::read(&saved.path).unwrap().len(), 7);
    }

    #[tokio::test]
    async fn missing_tree_is_not_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let d = driver(1080, 1920, tmp.path(), notifier.clone()).await;
        assert_eq!(d.export(None).await, ExportOutcome::NotReady);
        assert!(d.trigger_enabled());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn wrong_size_fails_and_alerts() {
        let tmp = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let d = driver(360, 640, tmp.path(), notifier.clone()).await;
        let tree = render_preview(&StoryState::new());

        let outcome = d.export(Some(&tree)).await;
        assert!(matches!(outcome, ExportOutcome::Failed(ref m) if m.contains("360x640")));
        assert_eq!(
            notifier.notices(),
            vec![Notice::Alert(EXPORT_FAILED_ALERT.to_string())]
        );
        assert_eq!(d.state(), ExportState::Idle);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn successful_export_returns_to_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let d = driver(1080, 1920, tmp.path(), notifier.clone()).await;
        let tree = render_preview(&StoryState::new());

        let ExportOutcome::Saved(saved) = d.export(Some(&tree)).await else {
            panic!("export did not save");
        };
        assert!(saved.filename.starts_with(FILENAME_PREFIX));
        assert!(saved.filename.ends_with(".jpeg"));
        assert_eq!((saved.width, saved.height), (1080, 1920));
        assert!(d.trigger_enabled());
        assert!(notifier.notices().is_empty());
    }
}
