//! Photo intake: user-selected files become shareable image handles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use log::debug;

use crate::{Error, Result};

/// Accepted width/height ratio range for the consultant medallion photo.
pub const SQUARE_RATIO_MIN: f64 = 0.9;
pub const SQUARE_RATIO_MAX: f64 = 1.1;

/// The three image slots of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSlot {
    Consultant,
    Portfolio,
    Logo,
}

impl PhotoSlot {
    pub fn name(self) -> &'static str {
        match self {
            PhotoSlot::Consultant => "consultant photo",
            PhotoSlot::Portfolio => "portfolio photo",
            PhotoSlot::Logo => "logo",
        }
    }
}

/// A decoded, in-session image ready to be painted.
///
/// Clones share the same pixels. Two handles compare equal only when they
/// come from the same intake.
#[derive(Clone)]
pub struct PhotoHandle {
    source: String,
    image: Arc<RgbaImage>,
}

impl PhotoHandle {
    pub fn new(source: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            source: source.into(),
            image: Arc::new(image),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl PartialEq for PhotoHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for PhotoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoHandle")
            .field("source", &self.source)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Optional handle per slot. Setting a slot drops the handle it replaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Photos {
    pub consultant: Option<PhotoHandle>,
    pub portfolio: Option<PhotoHandle>,
    pub logo: Option<PhotoHandle>,
}

impl Photos {
    pub fn get(&self, slot: PhotoSlot) -> Option<&PhotoHandle> {
        match slot {
            PhotoSlot::Consultant => self.consultant.as_ref(),
            PhotoSlot::Portfolio => self.portfolio.as_ref(),
            PhotoSlot::Logo => self.logo.as_ref(),
        }
    }

    pub fn set(&mut self, slot: PhotoSlot, handle: PhotoHandle) {
        let target = match slot {
            PhotoSlot::Consultant => &mut self.consultant,
            PhotoSlot::Portfolio => &mut self.portfolio,
            PhotoSlot::Logo => &mut self.logo,
        };
        if target.replace(handle).is_some() {
            debug!("Released previous {}", slot.name());
        }
    }
}

/// Decode an image file into a handle.
pub fn load_handle(path: &Path) -> Result<PhotoHandle> {
    let img = image::open(path)
        .map_err(|e| Error::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let rgba = img.to_rgba8();
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        rgba.width(),
        rgba.height()
    );
    Ok(PhotoHandle::new(path.display().to_string(), rgba))
}

/// Decode in-memory image bytes into a handle.
pub fn load_handle_from_memory(bytes: &[u8], source: &str) -> Result<PhotoHandle> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageLoad(format!("{}: {}", source, e)))?;
    Ok(PhotoHandle::new(source, img.to_rgba8()))
}

/// Whether `width / height` falls within the near-square range.
pub fn is_near_square(width: u32, height: u32) -> bool {
    if height == 0 {
        return false;
    }
    let ratio = width as f64 / height as f64;
    (SQUARE_RATIO_MIN..=SQUARE_RATIO_MAX).contains(&ratio)
}

/// Async wrapper around [`load_handle`] on the blocking pool.
pub async fn intake(path: PathBuf) -> Result<PhotoHandle> {
    tokio::task::spawn_blocking(move || load_handle(&path))
        .await
        .map_err(|e| Error::Other(format!("photo intake canceled: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn near_square_bounds_are_inclusive() {
        assert!(is_near_square(100, 100));
        assert!(is_near_square(90, 100));
        assert!(is_near_square(110, 100));
        assert!(!is_near_square(89, 100));
        assert!(!is_near_square(1920, 1080));
        assert!(!is_near_square(10, 0));
    }

    #[test]
    fn load_keeps_decoded_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 64, 36);
        let handle = load_handle(&path).unwrap();
        assert_eq!((handle.width(), handle.height()), (64, 36));
        assert_eq!(handle.source(), path.display().to_string());
    }

    #[tokio::test]
    async fn intake_decodes_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "tall.png", 30, 50);
        let handle = intake(path).await.unwrap();
        assert_eq!((handle.width(), handle.height()), (30, 50));
        assert!(intake(dir.path().join("gone.png")).await.is_err());
    }

    #[test]
    fn load_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_handle(&path), Err(Error::ImageLoad(_))));
        assert!(load_handle_from_memory(b"nope", "memory").is_err());
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = PhotoHandle::new("a", RgbaImage::new(2, 2));
        let b = PhotoHandle::new("a", RgbaImage::new(2, 2));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn setting_a_slot_replaces_the_handle() {
        let mut photos = Photos::default();
        let first = PhotoHandle::new("first", RgbaImage::new(1, 1));
        let second = PhotoHandle::new("second", RgbaImage::new(1, 1));
        photos.set(PhotoSlot::Logo, first);
        photos.set(PhotoSlot::Logo, second.clone());
        assert_eq!(photos.get(PhotoSlot::Logo), Some(&second));
        assert!(photos.get(PhotoSlot::Portfolio).is_none());
    }
}
