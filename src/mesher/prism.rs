//! Per-pixel prism geometry.
//!
//! A prism has a base quad on the ground plane and a top quad at its
//! height. Corners are labelled counter-clockwise seen from +Z:
//!
//! ```text
//!   top     h ---- g        base    d ---- c
//!           |      |                |      |
//!           e ---- f                a ---- b
//! ```
//!
//! `a..d` are local indices 0..4 and `e..h` are 4..8; `e` sits above `a`.

use super::CellMetrics;
use crate::types::Color;
use glam::Vec3;

/// Vertices emitted per voxel.
pub const VERTICES_PER_PRISM: usize = 8;
/// Quads emitted per voxel.
pub const FACES_PER_PRISM: usize = 6;
/// Colored face corners emitted per voxel.
pub const CORNERS_PER_PRISM: usize = FACES_PER_PRISM * 4;

const A: u32 = 0;
const B: u32 = 1;
const C: u32 = 2;
const D: u32 = 3;
const E: u32 = 4;
const F: u32 = 5;
const G: u32 = 6;
const H: u32 = 7;

/// The six faces of a prism, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrismFace {
    Bottom,
    /// Faces -Y.
    Front,
    /// Faces +X.
    Right,
    /// Faces +Y.
    Back,
    /// Faces -X.
    Left,
    Top,
}

impl PrismFace {
    /// All six faces in the order they are written to a mesh.
    pub const ALL: [PrismFace; FACES_PER_PRISM] = [
        PrismFace::Bottom,
        PrismFace::Front,
        PrismFace::Right,
        PrismFace::Back,
        PrismFace::Left,
        PrismFace::Top,
    ];

    /// Local vertex indices, counter-clockwise seen from outside.
    pub fn corners(&self) -> [u32; 4] {
        match self {
            PrismFace::Bottom => [A, D, C, B],
            PrismFace::Front => [A, B, F, E],
            PrismFace::Right => [B, C, G, F],
            PrismFace::Back => [C, D, H, G],
            PrismFace::Left => [D, A, E, H],
            PrismFace::Top => [E, F, G, H],
        }
    }

    /// Outward direction of this face on an untapered prism.
    pub fn normal(&self) -> [f32; 3] {
        match self {
            PrismFace::Bottom => [0.0, 0.0, -1.0],
            PrismFace::Front => [0.0, -1.0, 0.0],
            PrismFace::Right => [1.0, 0.0, 0.0],
            PrismFace::Back => [0.0, 1.0, 0.0],
            PrismFace::Left => [-1.0, 0.0, 0.0],
            PrismFace::Top => [0.0, 0.0, 1.0],
        }
    }

    /// The face kind at a position in a mesh made of whole prisms.
    pub fn from_face_index(face: usize) -> PrismFace {
        Self::ALL[face % FACES_PER_PRISM]
    }
}

/// Geometry of one voxel with local vertex indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prism {
    pub vertices: [[f32; 3]; VERTICES_PER_PRISM],
    pub faces: [[u32; 4]; FACES_PER_PRISM],
    /// Color shared by every face corner, always opaque.
    pub color: [f32; 4],
}

impl Prism {
    /// Per-corner colors, face-major.
    pub fn loop_colors(&self) -> [[f32; 4]; CORNERS_PER_PRISM] {
        [self.color; CORNERS_PER_PRISM]
    }
}

/// Build the prism for grid cell `(grid_x, grid_y)`.
pub fn build_prism(
    grid_x: u32,
    grid_y: u32,
    color: Color,
    height: f32,
    metrics: &CellMetrics,
) -> Prism {
    let center = Vec3::new(
        grid_x as f32 * metrics.cell_size,
        grid_y as f32 * metrics.cell_size,
        0.0,
    );

    let base = quad_corners(center, metrics.base_half_extent);
    let top = quad_corners(center + Vec3::Z * height, metrics.top_half_extent);

    let mut vertices = [[0.0; 3]; VERTICES_PER_PRISM];
    for (slot, corner) in vertices.iter_mut().zip(base.iter().chain(top.iter())) {
        *slot = corner.to_array();
    }

    Prism {
        vertices,
        faces: PrismFace::ALL.map(|face| face.corners()),
        color: color.opaque().to_array(),
    }
}

/// Square corners around `center`, counter-clockwise from the -X/-Y corner.
fn quad_corners(center: Vec3, half_extent: f32) -> [Vec3; 4] {
    [
        center + Vec3::new(-half_extent, -half_extent, 0.0),
        center + Vec3::new(half_extent, -half_extent, 0.0),
        center + Vec3::new(half_extent, half_extent, 0.0),
        center + Vec3::new(-half_extent, half_extent, 0.0),
    ]
}
