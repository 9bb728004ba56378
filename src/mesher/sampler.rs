//! Pixel lookup in flat sample buffers.

use crate::error::{MesherError, Result};
use crate::types::{Color, PixelImage};

/// Read the color of pixel `(x, y)`.
///
/// Samples start at `x * channels + y * channels * width`, so rows are
/// `width` pixels long and `y` selects the row. Three-channel images
/// sample as opaque.
pub fn sample(image: &PixelImage, x: u32, y: u32) -> Result<Color> {
    if x >= image.width || y >= image.height {
        return Err(MesherError::OutOfBounds {
            x,
            y,
            width: image.width,
            height: image.height,
        });
    }

    let channels = image.channels as usize;
    let index = x as usize * channels + y as usize * channels * image.width as usize;
    let values = image
        .pixels
        .get(index..index + channels)
        .ok_or(MesherError::BufferTooShort {
            index,
            needed: channels,
            len: image.pixels.len(),
        })?;

    Color::from_channels(values).ok_or_else(|| {
        MesherError::InvalidImage(format!("expected 3 or 4 channels, got {}", channels))
    })
}
