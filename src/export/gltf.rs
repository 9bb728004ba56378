//! glTF/GLB export.

use crate::error::{MesherError, Result};
use crate::mesher::geometry::TriangleMesh;
use crate::mesher::MeshBuffer;
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use std::mem;

/// Export a mesh to GLB format (binary glTF).
///
/// Face corners are unwelded so each face keeps its own color and flat
/// normal. glTF is Y-up, so positions are rotated out of the mesher's
/// Z-up frame. Colors go to `COLOR_0` and are multiplied with a plain white
/// material by viewers.
pub fn export_glb(mesh: &MeshBuffer) -> Result<Vec<u8>> {
    if mesh.is_empty() {
        return Err(MesherError::Export("Cannot export empty mesh".to_string()));
    }

    let triangles = mesh.triangulate()?.to_y_up();
    let (min, max) = calculate_bounds(&triangles);

    // Build the binary buffer: positions, normals, colors, indices
    let positions = triangles.positions_flat();
    let normals = triangles.normals_flat();
    let colors = triangles.colors_flat();

    let mut buffer_data: Vec<u8> = Vec::new();
    let pos_offset = buffer_data.len();
    buffer_data.extend_from_slice(bytemuck_cast_slice(&positions));
    let norm_offset = buffer_data.len();
    buffer_data.extend_from_slice(bytemuck_cast_slice(&normals));
    let color_offset = buffer_data.len();
    buffer_data.extend_from_slice(bytemuck_cast_slice(&colors));
    let idx_offset = buffer_data.len();
    buffer_data.extend_from_slice(bytemuck_cast_slice(&triangles.indices));
    let end = buffer_data.len();

    let vertex_count = triangles.vertex_count();
    let index_count = triangles.indices.len();

    let buffer_views = vec![
        create_buffer_view(pos_offset, norm_offset - pos_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(norm_offset, color_offset - norm_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(color_offset, idx_offset - color_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(idx_offset, end - idx_offset, Some(json::buffer::Target::ElementArrayBuffer)),
    ];

    let accessors = vec![
        create_accessor(0, vertex_count, json::accessor::Type::Vec3, json::accessor::ComponentType::F32, Some(min), Some(max)),
        create_accessor(1, vertex_count, json::accessor::Type::Vec3, json::accessor::ComponentType::F32, None, None),
        create_accessor(2, vertex_count, json::accessor::Type::Vec4, json::accessor::ComponentType::F32, None, None),
        create_accessor(3, index_count, json::accessor::Type::Scalar, json::accessor::ComponentType::U32, None, None),
    ];

    let root = json::Root {
        accessors,
        buffers: vec![json::Buffer {
            byte_length: USize64(buffer_data.len() as u64),
            extensions: Default::default(),
            extras: Default::default(),
            uri: None,
        }],
        buffer_views,
        materials: vec![create_vertex_color_material()],
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            primitives: vec![create_primitive(0, 3, 0)],
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        }],
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            nodes: vec![json::Index::new(0)],
        }],
        scene: Some(json::Index::new(0)),
        ..Default::default()
    };

    // Serialize JSON
    let json_string = json::serialize::to_string(&root)
        .map_err(|e| MesherError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;
    let json_bytes = json_string.as_bytes();

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let padded_buffer_len = buffer_data.len() + buffer_padding;

    let lengths = glb_lengths(padded_json_len, padded_buffer_len)?;

    let mut glb = Vec::with_capacity(lengths.total as usize);

    // GLB Header
    glb.extend_from_slice(b"glTF"); // magic
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&lengths.total.to_le_bytes()); // length

    // JSON Chunk
    glb.extend_from_slice(&lengths.json.to_le_bytes()); // chunk length
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // chunk type: JSON
    glb.extend_from_slice(json_bytes);
    glb.extend_from_slice(&vec![0x20u8; json_padding]); // padding (spaces)

    // BIN Chunk
    glb.extend_from_slice(&lengths.bin.to_le_bytes()); // chunk length
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // chunk type: BIN
    glb.extend_from_slice(&buffer_data);
    glb.extend_from_slice(&vec![0u8; buffer_padding]); // padding (zeros)

    Ok(glb)
}

/// Header and chunk lengths of a GLB file.
#[derive(Debug, PartialEq, Eq)]
struct GlbLengths {
    total: u32,
    json: u32,
    bin: u32,
}

/// GLB stores every length as `u32`, which caps a file at 4 GiB.
fn glb_lengths(padded_json_len: usize, padded_buffer_len: usize) -> Result<GlbLengths> {
    let too_large = || {
        MesherError::Export(format!(
            "GLB too large: {} JSON bytes and {} binary bytes exceed the 4 GiB limit",
            padded_json_len, padded_buffer_len
        ))
    };

    let total = padded_json_len
        .checked_add(padded_buffer_len)
        .and_then(|len| len.checked_add(12 + 8 + 8)) // header + two chunk headers
        .ok_or_else(too_large)?;

    Ok(GlbLengths {
        total: u32::try_from(total).map_err(|_| too_large())?,
        json: u32::try_from(padded_json_len).map_err(|_| too_large())?,
        bin: u32::try_from(padded_buffer_len).map_err(|_| too_large())?,
    })
}

/// Position bounds required on the POSITION accessor.
fn calculate_bounds(mesh: &TriangleMesh) -> ([f32; 3], [f32; 3]) {
    match mesh.bounds() {
        Some(bounds) => (bounds.min, bounds.max),
        None => ([0.0; 3], [0.0; 3]),
    }
}

/// Create a buffer view.
fn create_buffer_view(
    offset: usize,
    size: usize,
    target: Option<json::buffer::Target>,
) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: USize64(size as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        target: target.map(Valid),
    }
}

/// Create an accessor.
fn create_accessor(
    buffer_view: u32,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    min: Option<[f32; 3]>,
    max: Option<[f32; 3]>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(buffer_view)),
        byte_offset: Some(USize64(0)),
        count: USize64(count as u64),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: min.map(|m| json::Value::from(m.to_vec())),
        max: max.map(|m| json::Value::from(m.to_vec())),
        normalized: false,
        sparse: None,
    }
}

/// Create a primitive with position, normal and color attributes.
fn create_primitive(
    positions_accessor: u32,
    indices_accessor: u32,
    material: u32,
) -> json::mesh::Primitive {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(positions_accessor),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Normals),
        json::Index::new(positions_accessor + 1),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Colors(0)),
        json::Index::new(positions_accessor + 2),
    );

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(json::Index::new(indices_accessor)),
        material: Some(json::Index::new(material)),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

/// Untextured rough material; the surface color comes from `COLOR_0`.
fn create_vertex_color_material() -> json::Material {
    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: None,
            base_color_factor: json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(json::material::AlphaMode::Opaque),
        alpha_cutoff: None,
        double_sided: false,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: Default::default(),
        extras: Default::default(),
    }
}

/// Cast a slice of T to a slice of bytes.
fn bytemuck_cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    let ptr = slice.as_ptr() as *const u8;
    let len = slice.len() * mem::size_of::<T>();
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::VoxelParams;
    use crate::types::PixelImage;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn white_voxel() -> MeshBuffer {
        let image = PixelImage::new(1, 1, 3, vec![1.0, 1.0, 1.0]).unwrap();
        crate::generate_voxel_mesh(&image, &VoxelParams::default()).unwrap()
    }

    #[test]
    fn test_export_single_voxel() {
        let glb = export_glb(&white_voxel()).unwrap();

        // Check GLB header
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2); // version
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);

        // JSON chunk follows the header
        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(read_u32(&glb, 16), 0x4E4F534A);
        let json_text = std::str::from_utf8(&glb[20..20 + json_len]).unwrap();
        assert!(json_text.contains("COLOR_0"));
        assert!(json_text.contains("NORMAL"));

        // BIN chunk holds 24 corners of position, normal and color plus 36 indices
        let bin_header = 20 + json_len;
        assert_eq!(read_u32(&glb, bin_header + 4), 0x004E4942);
        let bin_len = read_u32(&glb, bin_header) as usize;
        assert_eq!(bin_len, 24 * (3 + 3 + 4) * 4 + 36 * 4);
    }

    #[test]
    fn test_export_is_y_up() {
        let triangles = white_voxel().triangulate().unwrap().to_y_up();
        let (min, max) = calculate_bounds(&triangles);

        // Default params: cell 2, height 20 along +Y after rotation.
        assert_eq!(min[1], 0.0);
        assert_eq!(max[1], 20.0);
        assert_eq!(min[0], -1.0);
        assert_eq!(max[2], 1.0);
    }

    #[test]
    fn test_export_inconsistent_mesh_fails() {
        let mesh = MeshBuffer {
            vertices: vec![[0.0; 3]; 3],
            faces: vec![[0, 1, 2, 3]],
            loop_colors: vec![[1.0; 4]; 4],
        };
        let result = export_glb(&mesh);
        assert!(matches!(result, Err(MesherError::Export(_))));
    }

    #[test]
    fn test_glb_lengths() {
        assert_eq!(
            glb_lengths(8, 16).unwrap(),
            GlbLengths { total: 52, json: 8, bin: 16 }
        );

        // 2048x2048 voxels: 1104 BIN bytes per cell no longer fit the header.
        let bin_len = 2048 * 2048 * 1104;
        assert!(matches!(glb_lengths(1024, bin_len), Err(MesherError::Export(_))));
        // Each length fits, the sum does not.
        let half = u32::MAX as usize / 2 + 1;
        assert!(glb_lengths(half, half).is_err());
    }

    #[test]
    fn test_export_empty_mesh_fails() {
        let result = export_glb(&MeshBuffer::new());
        assert!(matches!(result, Err(MesherError::Export(_))));
    }
}
