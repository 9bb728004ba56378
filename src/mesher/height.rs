//! Extrusion height from pixel color.

use super::CellMetrics;
use crate::types::Color;

/// HSL lightness: the mean of the largest and smallest RGB channel.
pub fn lightness(color: Color) -> f32 {
    (color.max_channel() + color.min_channel()) / 2.0
}

/// Prism height for a color. Scales with the cell size so tall voxels
/// keep their proportions at any display width.
pub fn height(color: Color, metrics: &CellMetrics) -> f32 {
    lightness(color) * metrics.height_scale * metrics.cell_size
}
