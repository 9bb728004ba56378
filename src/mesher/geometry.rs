//! Mesh geometry types.

use super::prism::{Prism, PrismFace, CORNERS_PER_PRISM, FACES_PER_PRISM, VERTICES_PER_PRISM};
use crate::error::{MesherError, Result};
use crate::types::BoundingBox;
use glam::Vec3;

/// Most quads whose unwelded corners can still be addressed by `u32` indices.
pub const MAX_EXPORT_FACES: usize = (u32::MAX / 4) as usize + 1;

/// Quad mesh with per-face-corner colors.
///
/// Colors live on face corners rather than vertices, so two faces meeting at
/// a vertex can carry different colors. `loop_colors[face * 4 + corner]` is
/// the color of corner `corner` of face `face`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Quads as vertex indices, counter-clockwise seen from outside.
    pub faces: Vec<[u32; 4]>,
    /// RGBA color per face corner.
    pub loop_colors: Vec<[f32; 4]>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `prisms` voxels.
    pub fn with_capacity(prisms: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(prisms * VERTICES_PER_PRISM),
            faces: Vec::with_capacity(prisms * FACES_PER_PRISM),
            loop_colors: Vec::with_capacity(prisms * CORNERS_PER_PRISM),
        }
    }

    /// Append a prism and return the index of its first vertex.
    pub fn push_prism(&mut self, prism: &Prism) -> u32 {
        let base = self.vertices.len() as u32;

        self.vertices.extend_from_slice(&prism.vertices);
        self.faces
            .extend(prism.faces.map(|face| face.map(|i| base + i)));
        self.loop_colors.extend_from_slice(&prism.loop_colors());

        base
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of quads.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of triangles after triangulation.
    pub fn triangle_count(&self) -> usize {
        self.faces.len() * 2
    }

    /// Check if the mesh is empty.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Color of one face corner.
    pub fn loop_color(&self, face: usize, corner: usize) -> Option<[f32; 4]> {
        if corner >= 4 {
            return None;
        }
        self.loop_colors.get(face * 4 + corner).copied()
    }

    /// Colors of all four corners of a face.
    pub fn face_colors(&self, face: usize) -> Option<&[[f32; 4]]> {
        self.loop_colors.get(face * 4..face * 4 + 4)
    }

    /// Unit normal of a face, or `None` for a face with no area.
    pub fn face_normal(&self, face: usize) -> Option<[f32; 3]> {
        let indices = self.faces.get(face)?;

        let mut normal = Vec3::ZERO;
        for i in 0..4 {
            let current = Vec3::from(*self.vertices.get(indices[i] as usize)?);
            let next = Vec3::from(*self.vertices.get(indices[(i + 1) % 4] as usize)?);
            normal += current.cross(next);
        }

        let normal = normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            None
        } else {
            Some(normal.to_array())
        }
    }

    /// Bounding box of all vertices.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Translate all vertices by an offset.
    pub fn translate(&mut self, offset: [f32; 3]) {
        for vertex in &mut self.vertices {
            vertex[0] += offset[0];
            vertex[1] += offset[1];
            vertex[2] += offset[2];
        }
    }

    /// Check that every face references valid vertices and every corner has a color.
    pub fn is_consistent(&self) -> bool {
        let vertex_count = self.vertices.len();
        self.loop_colors.len() == self.faces.len() * 4
            && self
                .faces
                .iter()
                .all(|face| face.iter().all(|&i| (i as usize) < vertex_count))
    }

    /// Reject buffers that an exporter cannot write faithfully: dangling
    /// face indices, missing corner colors, or too many corners for `u32`
    /// indices once faces are unwelded.
    pub fn validate_for_export(&self) -> Result<()> {
        if !self.is_consistent() {
            return Err(MesherError::Export(format!(
                "Inconsistent mesh buffer: {} vertices, {} faces, {} corner colors",
                self.vertices.len(),
                self.faces.len(),
                self.loop_colors.len()
            )));
        }
        check_face_count(self.faces.len())
    }

    /// Split every face into its own four vertices and two triangles.
    ///
    /// Each output vertex carries its corner color and the flat face normal.
    /// Faces with no area fall back to the normal of their prism side, which
    /// assumes the buffer is a run of whole prisms in emission order (face
    /// `i` is side `i % 6`). Hand-built or merged buffers whose degenerate
    /// faces break that layout get a nominal normal that may not match.
    ///
    /// Fails with [`MesherError::Export`] when [`validate_for_export`]
    /// rejects the buffer.
    ///
    /// [`validate_for_export`]: MeshBuffer::validate_for_export
    pub fn triangulate(&self) -> Result<TriangleMesh> {
        self.validate_for_export()?;

        let mut mesh = TriangleMesh::with_capacity(self.faces.len());

        for (face_index, face) in self.faces.iter().enumerate() {
            let normal = self
                .face_normal(face_index)
                .unwrap_or_else(|| PrismFace::from_face_index(face_index).normal());

            let mut corners = [0u32; 4];
            for (corner, &vertex_index) in face.iter().enumerate() {
                let color = self
                    .loop_color(face_index, corner)
                    .unwrap_or([1.0, 1.0, 1.0, 1.0]);
                let position = *self.vertices.get(vertex_index as usize).ok_or_else(|| {
                    MesherError::Export(format!(
                        "Face {} references missing vertex {}",
                        face_index, vertex_index
                    ))
                })?;
                corners[corner] = mesh.add_vertex(Vertex {
                    position,
                    normal,
                    color,
                });
            }

            mesh.add_quad(corners[0], corners[1], corners[2], corners[3]);
        }

        Ok(mesh)
    }
}

fn check_face_count(faces: usize) -> Result<()> {
    if faces > MAX_EXPORT_FACES {
        return Err(MesherError::Export(format!(
            "{} faces need more than {} corner indices",
            faces,
            u32::MAX
        )));
    }
    Ok(())
}

/// A vertex of a triangulated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in 3D space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// Vertex color (RGBA).
    pub color: [f32; 4],
}

/// A triangle mesh with unshared face corners, ready for export.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    /// Add a vertex and return its index.
    ///
    /// Callers keep the mesh within `u32` indices; see [`MAX_EXPORT_FACES`].
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle by vertex indices.
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a quad (two triangles) whose corners are already counter-clockwise.
    pub fn add_quad(&mut self, i0: u32, i1: u32, i2: u32, i3: u32) {
        self.add_triangle(i0, i1, i2);
        self.add_triangle(i0, i2, i3);
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the mesh is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Rotate from the Z-up mesher frame into a Y-up frame: `(x, y, z) -> (x, z, -y)`.
    pub fn to_y_up(&self) -> TriangleMesh {
        let swap = |v: [f32; 3]| [v[0], v[2], -v[1]];
        TriangleMesh {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex {
                    position: swap(v.position),
                    normal: swap(v.normal),
                    color: v.color,
                })
                .collect(),
            indices: self.indices.clone(),
        }
    }

    /// Get positions as a flat array (for glTF export).
    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.position).collect()
    }

    /// Get normals as a flat array (for glTF export).
    pub fn normals_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.normal).collect()
    }

    /// Get colors as a flat array (for glTF export).
    pub fn colors_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.color).collect()
    }

    /// Bounding box of all vertex positions.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::prism::build_prism;
    use crate::mesher::VoxelParams;
    use crate::types::Color;

    fn sample_prism(grid_x: u32, color: Color, height: f32) -> Prism {
        let metrics = VoxelParams::default()
            .with_display_width(1.0)
            .with_top_scale(1.0)
            .metrics(1);
        build_prism(grid_x, 0, color, height, &metrics)
    }

    #[test]
    fn test_push_prism_offsets_indices() {
        let mut mesh = MeshBuffer::new();
        assert!(mesh.is_empty());

        let first = mesh.push_prism(&sample_prism(0, Color::WHITE, 1.0));
        let second = mesh.push_prism(&sample_prism(1, Color::BLACK, 0.0));

        assert_eq!((first, second), (0, 8));
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(mesh.loop_colors.len(), 48);
        assert!(mesh.faces[..6].iter().flatten().all(|&i| i < 8));
        assert!(mesh.faces[6..].iter().flatten().all(|&i| (8..16).contains(&i)));
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_loop_color_lookup() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::rgb(0.5, 0.25, 0.0), 1.0));

        assert_eq!(mesh.loop_color(5, 3), Some([0.5, 0.25, 0.0, 1.0]));
        assert_eq!(mesh.loop_color(0, 4), None);
        assert_eq!(mesh.loop_color(6, 0), None);
        assert_eq!(mesh.face_colors(2).map(|c| c.len()), Some(4));
        assert!(mesh.face_colors(6).is_none());
    }

    #[test]
    fn test_face_normals_of_cube() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::WHITE, 1.0));

        for (face_index, face) in PrismFace::ALL.iter().enumerate() {
            assert_eq!(mesh.face_normal(face_index), Some(face.normal()), "{:?}", face);
        }
    }

    #[test]
    fn test_degenerate_face_has_no_normal() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::BLACK, 0.0));

        // Side faces of a flat prism have no area.
        assert!(mesh.face_normal(1).is_none());
        assert_eq!(mesh.face_normal(5), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_bounds_and_translate() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::WHITE, 2.0));
        mesh.translate([1.0, 0.0, -1.0]);

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, [0.5, -0.5, -1.0]);
        assert_eq!(bounds.max, [1.5, 0.5, 1.0]);
    }

    #[test]
    fn test_inconsistent_buffer_detected() {
        let mesh = MeshBuffer {
            vertices: vec![[0.0; 3]; 3],
            faces: vec![[0, 1, 2, 3]],
            loop_colors: vec![[1.0; 4]; 4],
        };
        assert!(!mesh.is_consistent());
    }

    #[test]
    fn test_triangulate_rejects_dangling_index() {
        let mesh = MeshBuffer {
            vertices: vec![[0.0; 3]; 3],
            faces: vec![[0, 1, 2, 3]],
            loop_colors: vec![[1.0; 4]; 4],
        };
        assert!(matches!(mesh.triangulate(), Err(MesherError::Export(_))));
    }

    #[test]
    fn test_triangulate_rejects_missing_colors() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::WHITE, 1.0));
        mesh.loop_colors.pop();

        assert!(matches!(mesh.validate_for_export(), Err(MesherError::Export(_))));
        assert!(mesh.triangulate().is_err());
    }

    #[test]
    fn test_face_count_limit() {
        assert!(check_face_count(MAX_EXPORT_FACES).is_ok());
        assert!(matches!(
            check_face_count(MAX_EXPORT_FACES + 1),
            Err(MesherError::Export(_))
        ));
        // The last corner of the largest exportable mesh is u32::MAX.
        assert_eq!(MAX_EXPORT_FACES * 4 - 1, u32::MAX as usize);
    }

    #[test]
    fn test_triangulate_unwelds_corners() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::rgb(0.0, 1.0, 0.0), 1.0));

        let tris = mesh.triangulate().unwrap();

        assert_eq!(tris.vertex_count(), 24);
        assert_eq!(tris.triangle_count(), 12);
        assert!(tris.vertices.iter().all(|v| v.color == [0.0, 1.0, 0.0, 1.0]));
        // First face is the bottom: two triangles over its own four corners.
        assert_eq!(&tris.indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(tris.vertices[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_triangulate_flat_prism_uses_side_normals() {
        let mut mesh = MeshBuffer::new();
        mesh.push_prism(&sample_prism(0, Color::BLACK, 0.0));

        let tris = mesh.triangulate().unwrap();
        // Corners 4..8 belong to the front face.
        assert_eq!(tris.vertices[4].normal, PrismFace::Front.normal());
    }

    #[test]
    fn test_to_y_up() {
        let mut tris = TriangleMesh::new();
        tris.add_vertex(Vertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 0.0, 1.0],
            color: [1.0; 4],
        });

        let rotated = tris.to_y_up();
        assert_eq!(rotated.vertices[0].position, [1.0, 3.0, -2.0]);
        assert_eq!(rotated.vertices[0].normal, [0.0, 1.0, -0.0]);
    }
}
