//! Form component: the only path by which user input reaches `StoryState`.

use std::path::PathBuf;

use log::{debug, info};

use crate::listing::{Field, ListingInput, ListingType, PortfolioType};
use crate::notify::{Notifier, SQUARE_PHOTO_WARNING};
use crate::photo::{self, PhotoSlot};
use crate::state::StoryState;
use crate::Result;

/// Outcome of a consultant photo intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoCheck {
    pub width: u32,
    pub height: u32,
    pub near_square: bool,
}

pub struct StoryForm<'a> {
    state: &'a mut StoryState,
    notifier: &'a dyn Notifier,
}

impl<'a> StoryForm<'a> {
    pub fn new(state: &'a mut StoryState, notifier: &'a dyn Notifier) -> Self {
        Self { state, notifier }
    }

    pub fn state(&self) -> &StoryState {
        self.state
    }

    /// Change handler for every text and select control.
    pub fn on_change(&mut self, field: Field, raw: &str) -> Result<()> {
        field.apply(&mut self.state.listing, raw)?;
        debug!("{} = {:?}", field.name(), self.state.listing.get(field));
        Ok(())
    }

    /// Apply every value present in `input`, stopping at the first rejected one.
    pub fn apply_input(&mut self, input: &ListingInput) -> Result<()> {
        for (field, raw) in input.entries() {
            self.on_change(field, raw)?;
        }
        Ok(())
    }

    pub fn select_listing_type(&mut self, value: Option<ListingType>) {
        self.state.listing.listing_type = value;
    }

    pub fn select_portfolio_type(&mut self, value: Option<PortfolioType>) {
        self.state.listing.portfolio_type = value;
    }

    /// Take a consultant photo. A far-from-square photo raises a warning
    /// but is still stored.
    pub async fn on_consultant_photo(&mut self, path: PathBuf) -> Result<PhotoCheck> {
        let handle = photo::intake(path).await?;
        let (width, height) = (handle.width(), handle.height());

        let near_square = photo::is_near_square(width, height);
        if !near_square {
            self.notifier.warn(SQUARE_PHOTO_WARNING);
        }
        info!("Consultant photo {} ({}x{})", handle.source(), width, height);
        self.state.photos.set(PhotoSlot::Consultant, handle);

        Ok(PhotoCheck {
            width,
            height,
            near_square,
        })
    }

    /// Take a portfolio photo. Any image is accepted.
    pub async fn on_portfolio_photo(&mut self, path: PathBuf) -> Result<()> {
        let handle = photo::intake(path).await?;
        info!("Portfolio photo {}", handle.source());
        self.state.photos.set(PhotoSlot::Portfolio, handle);
        Ok(())
    }

    /// Take a logo. Any image is accepted.
    pub async fn on_logo(&mut self, path: PathBuf) -> Result<()> {
        let handle = photo::intake(path).await?;
        info!("Logo {}", handle.source());
        self.state.photos.set(PhotoSlot::Logo, handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notice, RecordingNotifier};
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn on_change_formats_and_stores() {
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();
        let mut form = StoryForm::new(&mut state, &notifier);
        form.on_change(Field::GsmNumber, "555").unwrap();
        form.on_change(Field::GsmNumber, "(555) 12").unwrap();
        form.on_change(Field::Price, "12a3").unwrap();
        assert_eq!(form.state().listing.gsm_number, "(555) 12");
        assert_eq!(form.state().listing.price, "123 TL");
    }

    #[test]
    fn apply_input_stops_on_invalid_option() {
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();
        let mut form = StoryForm::new(&mut state, &notifier);
        let input = ListingInput {
            consultant_name: Some("Deniz".into()),
            portfolio_type: Some("Villa".into()),
            price: Some("10".into()),
            ..Default::default()
        };
        assert!(form.apply_input(&input).is_err());
        assert_eq!(state.listing.consultant_name, "Deniz");
        assert_eq!(state.listing.price, "");
    }

    #[tokio::test]
    async fn wide_consultant_photo_warns_but_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 160, 90);
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();

        let check = StoryForm::new(&mut state, &notifier)
            .on_consultant_photo(path)
            .await
            .unwrap();

        assert!(!check.near_square);
        assert_eq!((check.width, check.height), (160, 90));
        let stored = state.photos.consultant.as_ref().unwrap();
        assert_eq!((stored.width(), stored.height()), (160, 90));
        assert_eq!(
            notifier.notices(),
            vec![Notice::Warning(SQUARE_PHOTO_WARNING.to_string())]
        );
    }

    #[tokio::test]
    async fn square_consultant_photo_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "square.png", 100, 105);
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();

        let check = StoryForm::new(&mut state, &notifier)
            .on_consultant_photo(path)
            .await
            .unwrap();

        assert!(check.near_square);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn portfolio_and_logo_skip_aspect_checks() {
        let dir = tempfile::tempdir().unwrap();
        let wide = write_png(dir.path(), "wide.png", 300, 20);
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();
        let mut form = StoryForm::new(&mut state, &notifier);

        form.on_portfolio_photo(wide.clone()).await.unwrap();
        form.on_logo(wide).await.unwrap();

        assert!(state.photos.portfolio.is_some());
        assert!(state.photos.logo.is_some());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn unreadable_photo_leaves_slot_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");
        let mut state = StoryState::new();
        let notifier = RecordingNotifier::new();

        let res = StoryForm::new(&mut state, &notifier)
            .on_consultant_photo(missing)
            .await;

        assert!(res.is_err());
        assert!(state.photos.consultant.is_none());
    }
}
