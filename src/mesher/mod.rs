//! Voxel mesh generation from pixel buffers.
//!
//! This module turns every pixel of an image into an independent prism whose
//! height follows the pixel's lightness.

pub mod assembler;
pub mod geometry;
pub mod height;
pub mod prism;
pub mod sampler;

pub use assembler::AssemblyStrategy;
pub use geometry::{MeshBuffer, TriangleMesh, Vertex};
pub use prism::{Prism, PrismFace};

use crate::error::{MesherError, Result};
use crate::types::PixelImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Voxel shape configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelParams {
    /// Width of the whole image in world units.
    pub display_width: f32,
    /// Footprint of the prism base relative to one cell.
    pub base_scale: f32,
    /// Footprint of the prism top relative to one cell.
    pub top_scale: f32,
    /// Height of a fully light pixel, in cells.
    pub height_scale: f32,
}

impl Default for VoxelParams {
    fn default() -> Self {
        Self {
            display_width: 2.0,
            base_scale: 1.0,
            top_scale: 0.5,
            height_scale: 10.0,
        }
    }
}

impl VoxelParams {
    pub fn with_display_width(mut self, display_width: f32) -> Self {
        self.display_width = display_width;
        self
    }

    pub fn with_base_scale(mut self, base_scale: f32) -> Self {
        self.base_scale = base_scale;
        self
    }

    pub fn with_top_scale(mut self, top_scale: f32) -> Self {
        self.top_scale = top_scale;
        self
    }

    pub fn with_height_scale(mut self, height_scale: f32) -> Self {
        self.height_scale = height_scale;
        self
    }

    /// Parse parameters from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: VoxelParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check that every parameter is finite and positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("display_width", self.display_width),
            ("base_scale", self.base_scale),
            ("top_scale", self.top_scale),
            ("height_scale", self.height_scale),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(MesherError::InvalidParams(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Derive per-cell dimensions for an image `image_width` pixels wide.
    pub fn metrics(&self, image_width: u32) -> CellMetrics {
        let cell_size = self.display_width / image_width as f32;
        CellMetrics {
            cell_size,
            base_half_extent: cell_size * self.base_scale / 2.0,
            top_half_extent: cell_size * self.top_scale / 2.0,
            height_scale: self.height_scale,
        }
    }
}

/// Dimensions shared by every voxel of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Distance between neighbouring voxel centers.
    pub cell_size: f32,
    /// Half the side length of a prism base.
    pub base_half_extent: f32,
    /// Half the side length of a prism top.
    pub top_half_extent: f32,
    pub height_scale: f32,
}

/// The main voxel mesher.
#[derive(Debug, Clone, Default)]
pub struct VoxelMesher {
    params: VoxelParams,
    strategy: AssemblyStrategy,
}

impl VoxelMesher {
    /// Create a mesher with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesher with custom parameters.
    pub fn with_params(params: VoxelParams) -> Self {
        Self {
            params,
            strategy: AssemblyStrategy::default(),
        }
    }

    /// Choose how cells are assembled.
    pub fn with_strategy(mut self, strategy: AssemblyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn params(&self) -> &VoxelParams {
        &self.params
    }

    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
    }

    /// Generate the voxel mesh for an image.
    pub fn mesh(&self, image: &PixelImage) -> Result<MeshBuffer> {
        assembler::assemble_with(image, &self.params, self.strategy)
    }
}
