//! Wavefront OBJ export.
//!
//! OBJ is a simple, widely-supported text-based 3D format.
//! Vertex colors are written as the `v x y z r g b` extension understood by
//! most viewers, and each quad gets its own flat normal.

use crate::error::{MesherError, Result};
use crate::mesher::prism::PrismFace;
use crate::mesher::MeshBuffer;
use std::fmt::{self, Write};

/// Export a mesh to OBJ format.
/// Returns (obj_content, mtl_content) as strings.
///
/// Positions and normals are rotated into the Y-up frame used by glTF.
pub fn export_obj(mesh: &MeshBuffer, name: &str) -> Result<(String, String)> {
    if mesh.is_empty() {
        return Err(MesherError::Export("Cannot export empty mesh".to_string()));
    }
    mesh.validate_for_export()?;

    let mut obj = String::with_capacity(256 + mesh.vertex_count() * 60 + mesh.face_count() * 60);
    let mut mtl = String::with_capacity(256);

    write_obj(&mut obj, mesh, name)
        .and_then(|_| write_mtl(&mut mtl, name))
        .map_err(|e| MesherError::Export(format!("Failed to format OBJ: {}", e)))?;

    Ok((obj, mtl))
}

fn to_y_up(v: [f32; 3]) -> [f32; 3] {
    // + 0.0 keeps "-0" out of the text
    [v[0], v[2], -v[1] + 0.0]
}

/// One color per vertex. Every corner of a voxel shares the voxel's color,
/// so the last corner written wins without loss.
fn vertex_colors(mesh: &MeshBuffer) -> Vec<[f32; 4]> {
    let mut colors = vec![[1.0, 1.0, 1.0, 1.0]; mesh.vertex_count()];
    for (face_index, face) in mesh.faces.iter().enumerate() {
        for (corner, &vertex) in face.iter().enumerate() {
            if let (Some(slot), Some(color)) = (
                colors.get_mut(vertex as usize),
                mesh.loop_color(face_index, corner),
            ) {
                *slot = color;
            }
        }
    }
    colors
}

fn write_obj(obj: &mut String, mesh: &MeshBuffer, name: &str) -> fmt::Result {
    // OBJ header
    writeln!(obj, "# Image Voxel Mesher OBJ Export")?;
    writeln!(obj, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(obj, "# Faces: {}", mesh.face_count())?;
    writeln!(obj)?;

    // Reference material file
    writeln!(obj, "mtllib {}.mtl", name)?;
    writeln!(obj)?;

    // Object name
    writeln!(obj, "o {}", name)?;
    writeln!(obj)?;

    for (position, color) in mesh.vertices.iter().zip(vertex_colors(mesh)) {
        let [x, y, z] = to_y_up(*position);
        writeln!(obj, "v {} {} {} {} {} {}", x, y, z, color[0], color[1], color[2])?;
    }
    writeln!(obj)?;

    for face_index in 0..mesh.face_count() {
        let normal = mesh
            .face_normal(face_index)
            .unwrap_or_else(|| PrismFace::from_face_index(face_index).normal());
        let [x, y, z] = to_y_up(normal);
        writeln!(obj, "vn {} {} {}", x, y, z)?;
    }
    writeln!(obj)?;

    writeln!(obj, "usemtl {}_material", name)?;
    for (face_index, face) in mesh.faces.iter().enumerate() {
        let n = face_index + 1;
        writeln!(
            obj,
            "f {}//{} {}//{} {}//{} {}//{}",
            u64::from(face[0]) + 1,
            n,
            u64::from(face[1]) + 1,
            n,
            u64::from(face[2]) + 1,
            n,
            u64::from(face[3]) + 1,
            n
        )?;
    }

    Ok(())
}

fn write_mtl(mtl: &mut String, name: &str) -> fmt::Result {
    writeln!(mtl, "# Image Voxel Mesher Material")?;
    writeln!(mtl)?;
    writeln!(mtl, "newmtl {}_material", name)?;
    writeln!(mtl, "Ka 1.0 1.0 1.0")?;
    writeln!(mtl, "Kd 1.0 1.0 1.0")?;
    writeln!(mtl, "Ks 0.0 0.0 0.0")?;
    writeln!(mtl, "Ns 10.0")?;
    writeln!(mtl, "d 1.0")?;
    writeln!(mtl, "illum 1")?;
    Ok(())
}

/// OBJ and MTL contents for writing to files.
pub struct ObjExport {
    pub obj: String,
    pub mtl: String,
}

impl ObjExport {
    pub fn from_mesh(mesh: &MeshBuffer, name: &str) -> Result<Self> {
        let (obj, mtl) = export_obj(mesh, name)?;
        Ok(Self { obj, mtl })
    }
}
