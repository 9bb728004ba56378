//! Raw mesh data export for custom rendering.

use crate::error::Result;
use crate::mesher::MeshBuffer;

/// Raw triangle data for custom use.
///
/// Face corners are not shared, so `colors` stays exact per face. Positions
/// keep the mesher's Z-up frame.
#[derive(Debug)]
pub struct RawMeshData {
    /// Vertex positions (3 floats per vertex).
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex).
    pub normals: Vec<[f32; 3]>,
    /// Vertex colors (4 floats per vertex, RGBA).
    pub colors: Vec<[f32; 4]>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
}

/// Export mesh as raw triangle data.
///
/// An empty buffer gives empty arrays. Inconsistent buffers are rejected.
pub fn export_raw(mesh: &MeshBuffer) -> Result<RawMeshData> {
    let triangles = mesh.triangulate()?;

    Ok(RawMeshData {
        positions: triangles.vertices.iter().map(|v| v.position).collect(),
        normals: triangles.vertices.iter().map(|v| v.normal).collect(),
        colors: triangles.vertices.iter().map(|v| v.color).collect(),
        indices: triangles.indices,
    })
}

impl RawMeshData {
    /// Get positions as a flat array.
    pub fn positions_flat(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.iter().copied()).collect()
    }

    /// Get normals as a flat array.
    pub fn normals_flat(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|n| n.iter().copied()).collect()
    }

    /// Get colors as a flat array.
    pub fn colors_flat(&self) -> Vec<f32> {
        self.colors.iter().flat_map(|c| c.iter().copied()).collect()
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::VoxelParams;
    use crate::types::PixelImage;

    #[test]
    fn test_export_raw() {
        let image = PixelImage::new(2, 1, 3, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        let mesh = crate::generate_voxel_mesh(&image, &VoxelParams::default()).unwrap();

        let raw = export_raw(&mesh).unwrap();

        assert_eq!(raw.vertex_count(), 2 * 24);
        assert_eq!(raw.triangle_count(), 2 * 12);
        assert_eq!(raw.normals.len(), raw.positions.len());
        assert_eq!(raw.colors[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(raw.colors[24], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(raw.positions_flat().len(), 2 * 24 * 3);
        assert_eq!(raw.colors_flat().len(), 2 * 24 * 4);
        assert!(raw.indices.iter().all(|&i| (i as usize) < raw.vertex_count()));
    }

    #[test]
    fn test_export_raw_empty() {
        let raw = export_raw(&MeshBuffer::new()).unwrap();
        assert_eq!(raw.vertex_count(), 0);
        assert!(raw.normals_flat().is_empty());
    }

    #[test]
    fn test_export_raw_inconsistent_fails() {
        let mesh = MeshBuffer {
            vertices: vec![[0.0; 3]; 3],
            faces: vec![[0, 1, 2, 3]],
            loop_colors: vec![[1.0; 4]; 4],
        };
        assert!(matches!(
            export_raw(&mesh),
            Err(crate::error::MesherError::Export(_))
        ));
    }
}
