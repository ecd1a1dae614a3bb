//! Error types for the story generator

use thiserror::Error;

/// Result type alias for story operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or exporting a story
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or decode a user-selected image
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// Failed to paint the preview
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to encode the rasterized output
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Font discovery or parsing failed
    #[error("Font error: {0}")]
    FontError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A select field received text outside its option list
    #[error("Invalid value {value:?} for {field}")]
    InvalidOption { field: &'static str, value: String },

    /// The rasterizer produced an image that breaks the story size contract
    #[error("Unexpected output size {width}x{height}, expected {expected_width}x{expected_height}")]
    OutputSize {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageLoad(err.to_string())
    }
}
