use crate::rendering::{PreviewTree, Screenshot};
use crate::{Error, ExportOptions, Rasterizer, Result};
use log::debug;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Rasterize(PreviewTree, ExportOptions, oneshot::Sender<Result<Screenshot>>),
    Close(oneshot::Sender<()>),
}

/// An async-friendly rasterizer backed by a dedicated worker thread.
///
/// The worker thread owns the rasterizer (fonts, pixmaps) and executes
/// commands sent from async tasks, so painting a 1080x1920 frame never blocks
/// the runtime and the rasterizer itself need not be `Send`.
#[derive(Clone)]
pub struct RasterWorker {
    cmd_tx: Sender<Command>,
}

impl RasterWorker {
    /// Spawn the worker thread and build the rasterizer on it with `factory`.
    pub async fn new<F, R>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Rasterizer + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new()
            .name("story-raster".into())
            .spawn(move || {
                let rasterizer = match factory() {
                    Ok(r) => r,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };
                let _ = init_tx.send(Ok(()));

                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Rasterize(tree, options, resp) => {
                            let res = rasterizer.rasterize(&tree, &options);
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                debug!("Raster worker exiting");
            })?;

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Worker running the built-in tiny-skia rasterizer.
    #[cfg(feature = "skia")]
    pub async fn with_config(config: crate::StoryConfig) -> Result<Self> {
        Self::new(move || crate::new_rasterizer(&config)).await
    }

    /// Rasterize `tree` on the worker thread.
    pub async fn rasterize(&self, tree: PreviewTree, options: ExportOptions) -> Result<Screenshot> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Rasterize(tree, options, tx))
            .map_err(|_| Error::Other("Raster worker has stopped".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Rasterize canceled: {}", e)))?
    }

    /// Shut the worker thread down.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}
