//! The single session state shared by the form and the preview.

use crate::listing::ListingData;
use crate::photo::Photos;

/// Listing values plus photo handles for one session.
///
/// The form is the only writer; the preview only reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryState {
    pub listing: ListingData,
    pub photos: Photos,
}

impl StoryState {
    pub fn new() -> Self {
        Self::default()
    }
}
