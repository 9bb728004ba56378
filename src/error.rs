//! Error types for the image voxel mesher.

use thiserror::Error;

/// Result type alias using MesherError.
pub type Result<T> = std::result::Result<T, MesherError>;

/// Main error type for voxel meshing operations.
#[derive(Error, Debug)]
pub enum MesherError {
    /// The pixel buffer does not describe a usable image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Voxel parameters are out of range.
    #[error("Invalid voxel parameters: {0}")]
    InvalidParams(String),

    /// A pixel coordinate lies outside the image extent.
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// The pixel buffer ends before the requested sample.
    #[error("Pixel buffer too short: need {needed} values at index {index}, buffer has {len}")]
    BufferTooShort {
        index: usize,
        needed: usize,
        len: usize,
    },

    /// Failed to decode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to export mesh.
    #[error("Export error: {0}")]
    Export(String),
}
