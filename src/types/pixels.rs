//! Decoded pixel buffers.

use crate::error::{MesherError, Result};
use std::path::Path;

/// A decoded image as a flat buffer of normalized float samples.
///
/// Samples are stored row by row with `x` varying fastest. Row 0 is the
/// bottom row of the picture, so world-space +y points up the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Samples per pixel, 3 (RGB) or 4 (RGBA).
    pub channels: u32,
    /// `width * height * channels` samples in `[0, 1]`.
    pub pixels: Vec<f32>,
}

impl PixelImage {
    /// Create an image, validating its layout.
    pub fn new(width: u32, height: u32, channels: u32, pixels: Vec<f32>) -> Result<Self> {
        let image = Self {
            width,
            height,
            channels,
            pixels,
        };
        image.validate()?;
        Ok(image)
    }

    /// Build an image from a decoded [`image::DynamicImage`].
    ///
    /// Sources with an alpha channel become RGBA, everything else RGB.
    /// Rows are flipped so the top of the picture ends up at the highest `y`.
    pub fn from_dynamic(img: &image::DynamicImage) -> Self {
        let flipped = img.flipv();
        let (width, height) = (flipped.width(), flipped.height());

        if flipped.color().has_alpha() {
            Self {
                width,
                height,
                channels: 4,
                pixels: flipped.to_rgba32f().into_raw(),
            }
        } else {
            Self {
                width,
                height,
                channels: 3,
                pixels: flipped.to_rgb32f().into_raw(),
            }
        }
    }

    /// Number of samples the declared dimensions require.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.channels as usize)
    }

    /// Number of pixels (and therefore voxels).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Check channel count, buffer length and sample range.
    pub fn validate(&self) -> Result<()> {
        if self.channels != 3 && self.channels != 4 {
            return Err(MesherError::InvalidImage(format!(
                "expected 3 or 4 channels, got {}",
                self.channels
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(MesherError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                self.width, self.height
            )));
        }

        let expected = self.expected_len().ok_or_else(|| {
            MesherError::InvalidImage(format!(
                "{}x{}x{} overflows the addressable sample count",
                self.width, self.height, self.channels
            ))
        })?;
        if self.pixels.len() != expected {
            return Err(MesherError::InvalidImage(format!(
                "{}x{} image with {} channels needs {} samples, buffer has {}",
                self.width,
                self.height,
                self.channels,
                expected,
                self.pixels.len()
            )));
        }

        if let Some(index) = self
            .pixels
            .iter()
            .position(|v| !v.is_finite() || !(0.0..=1.0).contains(v))
        {
            return Err(MesherError::InvalidImage(format!(
                "sample {} is {}, expected a value in [0, 1]",
                index, self.pixels[index]
            )));
        }

        Ok(())
    }
}

/// Load and decode an image file.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<PixelImage> {
    let data = std::fs::read(path)?;
    load_from_bytes(&data)
}

/// Decode an in-memory PNG or JPEG.
pub fn load_from_bytes(data: &[u8]) -> Result<PixelImage> {
    let img = image::load_from_memory(data)?;
    let pixels = PixelImage::from_dynamic(&img);
    pixels.validate()?;
    Ok(pixels)
}
