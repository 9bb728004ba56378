//! Grid traversal that turns a whole image into one mesh buffer.
//!
//! Cells are visited with `x` as the outer loop and `y` as the inner loop,
//! so cell `(x, y)` has index `x * height + y`. Its vertices occupy
//! `[index * 8, index * 8 + 8)` and its faces `[index * 6, index * 6 + 6)`
//! regardless of which pass produced the buffer.

use super::height::height;
use super::prism::{build_prism, Prism, CORNERS_PER_PRISM, FACES_PER_PRISM, VERTICES_PER_PRISM};
use super::sampler::sample;
use super::{CellMetrics, MeshBuffer, VoxelParams};
use crate::error::{MesherError, Result};
use crate::types::PixelImage;
use tracing::{debug, trace};

/// Images with at least this many pixels use the parallel pass under
/// [`AssemblyStrategy::Auto`].
pub const PARALLEL_THRESHOLD: usize = 4096;

/// How cells are distributed over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyStrategy {
    /// Parallel for large images when the `parallel` feature is enabled.
    #[default]
    Auto,
    /// Always a single append-only pass.
    Sequential,
    /// Always the parallel pass. Falls back to sequential without the
    /// `parallel` feature.
    Parallel,
}

/// Build the voxel mesh for an image, choosing the pass automatically.
pub fn assemble(image: &PixelImage, params: &VoxelParams) -> Result<MeshBuffer> {
    assemble_with(image, params, AssemblyStrategy::Auto)
}

/// Build the voxel mesh with an explicit strategy.
pub fn assemble_with(
    image: &PixelImage,
    params: &VoxelParams,
    strategy: AssemblyStrategy,
) -> Result<MeshBuffer> {
    let metrics = prepare(image, params)?;

    let parallel = match strategy {
        AssemblyStrategy::Auto => image.pixel_count() >= PARALLEL_THRESHOLD,
        AssemblyStrategy::Sequential => false,
        AssemblyStrategy::Parallel => true,
    };

    debug!(
        width = image.width,
        height = image.height,
        channels = image.channels,
        cell_size = metrics.cell_size,
        parallel,
        "assembling voxel mesh"
    );

    let mesh = if parallel {
        run_parallel(image, &metrics)?
    } else {
        run_sequential(image, &metrics)?
    };

    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "voxel mesh assembled"
    );
    Ok(mesh)
}

/// Single-threaded pass appending one prism per cell.
pub fn assemble_sequential(image: &PixelImage, params: &VoxelParams) -> Result<MeshBuffer> {
    let metrics = prepare(image, params)?;
    run_sequential(image, &metrics)
}

/// Multi-threaded pass writing each cell into its own preallocated slot.
#[cfg(feature = "parallel")]
pub fn assemble_parallel(image: &PixelImage, params: &VoxelParams) -> Result<MeshBuffer> {
    let metrics = prepare(image, params)?;
    run_parallel(image, &metrics)
}

/// Validate inputs and derive cell dimensions.
fn prepare(image: &PixelImage, params: &VoxelParams) -> Result<CellMetrics> {
    image.validate()?;
    params.validate()?;

    let max_cells = u32::MAX as usize / VERTICES_PER_PRISM;
    if image.pixel_count() > max_cells {
        return Err(MesherError::InvalidImage(format!(
            "{}x{} image needs more than {} vertices",
            image.width,
            image.height,
            u32::MAX
        )));
    }

    Ok(params.metrics(image.width))
}

/// Grid coordinates of a cell index.
fn cell_position(cell: usize, image_height: u32) -> (u32, u32) {
    let rows = image_height as usize;
    ((cell / rows) as u32, (cell % rows) as u32)
}

fn build_cell(image: &PixelImage, metrics: &CellMetrics, x: u32, y: u32) -> Result<Prism> {
    let color = sample(image, x, y)?;
    let prism_height = height(color, metrics);
    Ok(build_prism(x, y, color, prism_height, metrics))
}

fn run_sequential(image: &PixelImage, metrics: &CellMetrics) -> Result<MeshBuffer> {
    let cells = image.pixel_count();
    let mut mesh = MeshBuffer::with_capacity(cells);

    for cell in 0..cells {
        let (x, y) = cell_position(cell, image.height);
        let prism = build_cell(image, metrics, x, y)?;
        mesh.push_prism(&prism);
    }

    Ok(mesh)
}

#[cfg(feature = "parallel")]
fn run_parallel(image: &PixelImage, metrics: &CellMetrics) -> Result<MeshBuffer> {
    use rayon::prelude::*;

    let cells = image.pixel_count();
    trace!(cells, "writing cells in parallel");
    let mut vertices = vec![[0.0f32; 3]; cells * VERTICES_PER_PRISM];
    let mut faces = vec![[0u32; 4]; cells * FACES_PER_PRISM];
    let mut loop_colors = vec![[0.0f32; 4]; cells * CORNERS_PER_PRISM];

    vertices
        .par_chunks_mut(VERTICES_PER_PRISM)
        .zip(faces.par_chunks_mut(FACES_PER_PRISM))
        .zip(loop_colors.par_chunks_mut(CORNERS_PER_PRISM))
        .enumerate()
        .try_for_each(|(cell, ((cell_vertices, cell_faces), cell_colors))| {
            let (x, y) = cell_position(cell, image.height);
            let prism = build_cell(image, metrics, x, y)?;
            let base = (cell * VERTICES_PER_PRISM) as u32;

            cell_vertices.copy_from_slice(&prism.vertices);
            for (slot, face) in cell_faces.iter_mut().zip(prism.faces) {
                *slot = face.map(|i| base + i);
            }
            cell_colors.copy_from_slice(&prism.loop_colors());
            Ok::<(), MesherError>(())
        })?;

    Ok(MeshBuffer {
        vertices,
        faces,
        loop_colors,
    })
}

#[cfg(not(feature = "parallel"))]
fn run_parallel(image: &PixelImage, metrics: &CellMetrics) -> Result<MeshBuffer> {
    trace!("parallel feature disabled, assembling sequentially");
    run_sequential(image, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::prism::PrismFace;
    use glam::Vec3;

    fn rgb_image(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [f32; 3]) -> PixelImage {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.extend(pixel(x, y));
            }
        }
        PixelImage::new(width, height, 3, pixels).unwrap()
    }

    /// Distinct color per pixel, all inside [0, 1].
    fn distinct_image(width: u32, height: u32) -> PixelImage {
        let count = (width * height) as f32;
        rgb_image(width, height, |x, y| {
            let n = (y * width + x) as f32;
            [n / count, 1.0 - n / count, 0.5]
        })
    }

    fn prism_center(mesh: &MeshBuffer, cell: usize) -> Vec3 {
        let range = cell * VERTICES_PER_PRISM..(cell + 1) * VERTICES_PER_PRISM;
        mesh.vertices[range]
            .iter()
            .fold(Vec3::ZERO, |acc, v| acc + Vec3::new(v[0], v[1], 0.0))
            / VERTICES_PER_PRISM as f32
    }

    #[test]
    fn test_counts_and_indices() {
        let image = distinct_image(4, 3);
        let mesh = assemble(&image, &VoxelParams::default()).unwrap();

        assert_eq!(mesh.vertex_count(), 4 * 3 * 8);
        assert_eq!(mesh.face_count(), 4 * 3 * 6);
        assert_eq!(mesh.loop_colors.len(), 4 * 3 * 6 * 4);
        assert!(mesh.is_consistent());

        for face in &mesh.faces {
            let mut sorted = *face;
            sorted.sort_unstable();
            assert!(sorted.windows(2).all(|w| w[0] != w[1]));
        }
    }

    #[test]
    fn test_single_white_pixel() {
        let image = rgb_image(1, 1, |_, _| [1.0, 1.0, 1.0]);
        let params = VoxelParams::default()
            .with_display_width(2.0)
            .with_height_scale(10.0);

        let mesh = assemble(&image, &params).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.loop_colors.len(), 24);
        assert!(mesh.loop_colors.iter().all(|c| *c == [1.0, 1.0, 1.0, 1.0]));

        let top: Vec<_> = mesh.vertices[4..].iter().map(|v| v[2]).collect();
        assert_eq!(top, vec![20.0; 4]);
        assert!(mesh.vertices[..4].iter().all(|v| v[2] == 0.0));
    }

    #[test]
    fn test_black_pixel_is_flat() {
        let image = rgb_image(1, 1, |_, _| [0.0, 0.0, 0.0]);
        let mesh = assemble(&image, &VoxelParams::default()).unwrap();

        assert!(mesh.vertices.iter().all(|v| v[2] == 0.0));
    }

    #[test]
    fn test_two_pixels_are_disjoint() {
        let image = rgb_image(2, 1, |x, _| if x == 0 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] });
        let params = VoxelParams::default().with_display_width(3.0);
        let mesh = assemble(&image, &params).unwrap();

        assert!(mesh.faces[..6].iter().flatten().all(|&i| i < 8));
        assert!(mesh.faces[6..].iter().flatten().all(|&i| (8..16).contains(&i)));

        let offset = prism_center(&mesh, 1) - prism_center(&mesh, 0);
        let cell_size = params.metrics(image.width).cell_size;
        assert!((offset - Vec3::new(cell_size, 0.0, 0.0)).length() < 1e-6);

        assert!(mesh.loop_colors[..24].iter().all(|c| *c == [1.0, 0.0, 0.0, 1.0]));
        assert!(mesh.loop_colors[24..].iter().all(|c| *c == [0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_non_square_color_fidelity() {
        let (width, height) = (3, 2);
        let image = distinct_image(width, height);
        let params = VoxelParams::default();
        let mesh = assemble(&image, &params).unwrap();
        let cell_size = params.metrics(width).cell_size;

        for cell in 0..(width * height) as usize {
            let (x, y) = cell_position(cell, height);
            let expected = sample(&image, x, y).unwrap().opaque().to_array();

            for face in cell * FACES_PER_PRISM..(cell + 1) * FACES_PER_PRISM {
                assert_eq!(mesh.face_colors(face).unwrap(), &[expected; 4], "cell ({}, {})", x, y);
            }

            let center = prism_center(&mesh, cell);
            let expected_center = Vec3::new(x as f32 * cell_size, y as f32 * cell_size, 0.0);
            assert!((center - expected_center).length() < 1e-5, "cell ({}, {})", x, y);
        }
    }

    #[test]
    fn test_alpha_is_forced_opaque() {
        let image = PixelImage::new(1, 1, 4, vec![0.5, 0.5, 0.5, 0.0]).unwrap();
        let mesh = assemble(&image, &VoxelParams::default()).unwrap();

        assert!(mesh.loop_colors.iter().all(|c| *c == [0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_heights_follow_lightness() {
        let image = rgb_image(3, 1, |x, _| {
            let v = x as f32 / 2.0;
            [v, v, v]
        });
        let mesh = assemble(&image, &VoxelParams::default()).unwrap();

        let top_z = |cell: usize| mesh.vertices[cell * VERTICES_PER_PRISM + 4][2];
        assert!(top_z(0) < top_z(1));
        assert!(top_z(1) < top_z(2));
    }

    #[test]
    fn test_faces_point_away_from_prism() {
        let image = distinct_image(2, 2);
        let mesh = assemble(&image, &VoxelParams::default()).unwrap();

        for (face_index, face) in mesh.faces.iter().enumerate() {
            let Some(normal) = mesh.face_normal(face_index) else {
                continue;
            };
            let cell = face_index / FACES_PER_PRISM;
            let range = cell * VERTICES_PER_PRISM..(cell + 1) * VERTICES_PER_PRISM;
            let prism_mid = mesh.vertices[range]
                .iter()
                .fold(Vec3::ZERO, |acc, v| acc + Vec3::from(*v))
                / VERTICES_PER_PRISM as f32;
            let face_mid = face
                .iter()
                .fold(Vec3::ZERO, |acc, &i| acc + Vec3::from(mesh.vertices[i as usize]))
                / 4.0;

            assert!(
                Vec3::from(normal).dot(face_mid - prism_mid) > 0.0,
                "{:?} of cell {} faces inward",
                PrismFace::from_face_index(face_index),
                cell
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let image = distinct_image(5, 4);
        let params = VoxelParams::default().with_top_scale(0.8);

        let first = assemble(&image, &params).unwrap();
        let second = assemble(&image, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strategies_agree() {
        let image = distinct_image(7, 5);
        let params = VoxelParams::default();

        let sequential = assemble_with(&image, &params, AssemblyStrategy::Sequential).unwrap();
        let parallel = assemble_with(&image, &params, AssemblyStrategy::Parallel).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_pass_matches_sequential() {
        let image = distinct_image(64, 70);
        let params = VoxelParams::default();

        let sequential = assemble_sequential(&image, &params).unwrap();
        let parallel = assemble_parallel(&image, &params).unwrap();
        assert_eq!(sequential.vertex_count(), 64 * 70 * 8);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_invalid_image_rejected() {
        let image = PixelImage {
            width: 2,
            height: 2,
            channels: 3,
            pixels: vec![0.0; 11],
        };
        let result = assemble(&image, &VoxelParams::default());
        assert!(matches!(result, Err(MesherError::InvalidImage(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let image = rgb_image(1, 1, |_, _| [1.0, 1.0, 1.0]);
        let params = VoxelParams::default().with_base_scale(0.0);

        let result = assemble_sequential(&image, &params);
        assert!(matches!(result, Err(MesherError::InvalidParams(_))));
    }

    #[test]
    fn test_cell_position() {
        assert_eq!(cell_position(0, 3), (0, 0));
        assert_eq!(cell_position(2, 3), (0, 2));
        assert_eq!(cell_position(3, 3), (1, 0));
        assert_eq!(cell_position(7, 3), (2, 1));
    }
}
