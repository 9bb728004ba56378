//! # Image Voxel Mesher
//!
//! A Rust library for turning raster images into voxel meshes.
//!
//! ## Overview
//!
//! Every pixel becomes its own rectangular prism. The prism's height follows
//! the pixel's HSL lightness and every face corner carries the pixel's RGB
//! color, so the result renders as flat-shaded colored columns.
//!
//! ## Quick Start
//!
//! ```ignore
//! use image_voxel_mesher::{load_image, generate_voxel_mesh, export_glb, VoxelParams};
//!
//! // Decode an image into a pixel buffer
//! let image = load_image("path/to/sprite.png")?;
//!
//! // Build one prism per pixel
//! let mesh = generate_voxel_mesh(&image, &VoxelParams::default())?;
//!
//! // Export to GLB
//! let glb_bytes = export_glb(&mesh)?;
//! ```
//!
//! ## Library Integration
//!
//! Pixel data that is already decoded can be wrapped directly:
//!
//! ```ignore
//! use image_voxel_mesher::{PixelImage, VoxelMesher, VoxelParams};
//!
//! let image = PixelImage::new(width, height, 4, rgba_samples)?;
//! let mesher = VoxelMesher::with_params(VoxelParams::default().with_top_scale(1.0));
//! let mesh = mesher.mesh(&image)?;
//!
//! // vertices, quad faces and per-corner colors
//! let (vertices, faces, colors) = (&mesh.vertices, &mesh.faces, &mesh.loop_colors);
//! ```

pub mod error;
pub mod types;
pub mod mesher;
pub mod export;

// Re-export main types for convenience
pub use error::{MesherError, Result};
pub use types::{BoundingBox, Color, PixelImage};
pub use mesher::{
    AssemblyStrategy, CellMetrics, MeshBuffer, Prism, PrismFace, TriangleMesh, Vertex,
    VoxelMesher, VoxelParams,
};
pub use export::gltf::export_glb;
pub use export::obj::{export_obj, ObjExport};
pub use export::raw::{export_raw, RawMeshData};
pub use export::usd::export_usda;

/// Build the voxel mesh for an image.
///
/// Validates the image and parameters first; any failure returns an error
/// and no geometry.
pub fn generate_voxel_mesh(image: &PixelImage, params: &VoxelParams) -> Result<MeshBuffer> {
    mesher::assembler::assemble(image, params)
}

/// Load an image from a file path (PNG or JPEG).
pub fn load_image<P: AsRef<std::path::Path>>(path: P) -> Result<PixelImage> {
    types::pixels::load_from_path(path)
}

/// Load an image from encoded bytes (for WASM compatibility).
pub fn load_image_from_bytes(data: &[u8]) -> Result<PixelImage> {
    types::pixels::load_from_bytes(data)
}

#[cfg(feature = "wasm")]
pub mod wasm;
