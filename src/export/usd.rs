//! USDA export.
//!
//! Generates USD ASCII text manually via string formatting. Quads are
//! written as-is and the per-corner colors map onto a `faceVarying`
//! `displayColor` primvar, so no unwelding is needed.

use crate::error::{MesherError, Result};
use crate::mesher::prism::PrismFace;
use crate::mesher::MeshBuffer;
use std::fmt::{self, Write};

/// Export a mesh as USDA text with a single `Mesh` prim named `name`.
///
/// The stage is Y-up like the glTF and OBJ exports.
pub fn export_usda(mesh: &MeshBuffer, name: &str) -> Result<String> {
    if mesh.is_empty() {
        return Err(MesherError::Export("Cannot export empty mesh".to_string()));
    }
    mesh.validate_for_export()?;

    // ~40 bytes per point, ~40 per face corner across the corner arrays
    let estimated_size = 1024 + mesh.vertex_count() * 40 + mesh.loop_colors.len() * 40;
    let mut usda = String::with_capacity(estimated_size);

    write_stage(&mut usda, mesh, &prim_name(name))
        .map_err(|e| MesherError::Export(format!("Failed to format USDA: {}", e)))?;

    Ok(usda)
}

/// USD prim names must be identifiers.
fn prim_name(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn to_y_up(v: [f32; 3]) -> [f32; 3] {
    [v[0], v[2], -v[1] + 0.0]
}

fn write_stage(usda: &mut String, mesh: &MeshBuffer, name: &str) -> fmt::Result {
    // Header
    writeln!(usda, "#usda 1.0")?;
    writeln!(usda, "(")?;
    writeln!(usda, "    defaultPrim = \"Root\"")?;
    writeln!(usda, "    metersPerUnit = 1")?;
    writeln!(usda, "    upAxis = \"Y\"")?;
    writeln!(usda, ")\n")?;
    writeln!(usda, "def Xform \"Root\"")?;
    writeln!(usda, "{{")?;

    write_material(usda)?;
    write_mesh_prim(usda, name, mesh)?;

    writeln!(usda, "}}")?;
    Ok(())
}

/// Rough preview surface that takes its color from `displayColor`.
fn write_material(usda: &mut String) -> fmt::Result {
    writeln!(usda, "    def Material \"voxel_material\"")?;
    writeln!(usda, "    {{")?;
    writeln!(
        usda,
        "        token outputs:surface.connect = </Root/voxel_material/surface.outputs:surface>"
    )?;
    writeln!(usda)?;

    writeln!(usda, "        def Shader \"surface\"")?;
    writeln!(usda, "        {{")?;
    writeln!(usda, "            uniform token info:id = \"UsdPreviewSurface\"")?;
    writeln!(
        usda,
        "            color3f inputs:diffuseColor.connect = </Root/voxel_material/color.outputs:result>"
    )?;
    writeln!(usda, "            float inputs:metallic = 0")?;
    writeln!(usda, "            float inputs:roughness = 1")?;
    writeln!(usda, "            float inputs:opacity = 1")?;
    writeln!(usda, "            token outputs:surface")?;
    writeln!(usda, "        }}")?;

    // Primvar reader
    writeln!(usda, "        def Shader \"color\"")?;
    writeln!(usda, "        {{")?;
    writeln!(
        usda,
        "            uniform token info:id = \"UsdPrimvarReader_float3\""
    )?;
    writeln!(usda, "            string inputs:varname = \"displayColor\"")?;
    writeln!(usda, "            float3 outputs:result")?;
    writeln!(usda, "        }}")?;

    writeln!(usda, "    }}\n")?;
    Ok(())
}

/// Write a comma-separated array inline, streaming values directly to the buffer.
fn write_array_inline<T, F>(usda: &mut String, items: &[T], mut fmt: F) -> fmt::Result
where
    F: FnMut(&T, &mut String) -> fmt::Result,
{
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            usda.push_str(", ");
        }
        fmt(item, usda)?;
    }
    Ok(())
}

/// Write a Mesh prim with points, quads, flat normals and corner colors.
fn write_mesh_prim(usda: &mut String, name: &str, mesh: &MeshBuffer) -> fmt::Result {
    writeln!(usda, "    def Mesh \"{}\"", name)?;
    writeln!(usda, "    {{")?;
    writeln!(usda, "        uniform token orientation = \"rightHanded\"")?;
    writeln!(usda, "        uniform token subdivisionScheme = \"none\"")?;

    // Face vertex counts, all quads
    write!(usda, "        int[] faceVertexCounts = [")?;
    for i in 0..mesh.face_count() {
        if i > 0 {
            usda.push_str(", ");
        }
        usda.push('4');
    }
    writeln!(usda, "]")?;

    // Face vertex indices
    write!(usda, "        int[] faceVertexIndices = [")?;
    write_array_inline(usda, &mesh.faces, |face, s| {
        write!(s, "{}, {}, {}, {}", face[0], face[1], face[2], face[3])
    })?;
    writeln!(usda, "]")?;

    // Points
    write!(usda, "        point3f[] points = [")?;
    write_array_inline(usda, &mesh.vertices, |v, s| {
        let [x, y, z] = to_y_up(*v);
        write!(s, "({}, {}, {})", x, y, z)
    })?;
    writeln!(usda, "]")?;

    // Normals (uniform interpolation, one per face)
    let normals: Vec<[f32; 3]> = (0..mesh.face_count())
        .map(|face| {
            mesh.face_normal(face)
                .unwrap_or_else(|| PrismFace::from_face_index(face).normal())
        })
        .collect();
    write!(usda, "        normal3f[] normals = [")?;
    write_array_inline(usda, &normals, |n, s| {
        let [x, y, z] = to_y_up(*n);
        write!(s, "({}, {}, {})", x, y, z)
    })?;
    writeln!(usda, "] (")?;
    writeln!(usda, "            interpolation = \"uniform\"")?;
    writeln!(usda, "        )")?;

    // Corner colors
    write!(usda, "        color3f[] primvars:displayColor = [")?;
    write_array_inline(usda, &mesh.loop_colors, |c, s| {
        write!(s, "({}, {}, {})", c[0], c[1], c[2])
    })?;
    writeln!(usda, "] (")?;
    writeln!(usda, "            interpolation = \"faceVarying\"")?;
    writeln!(usda, "        )")?;

    // Material binding
    writeln!(usda, "        rel material:binding = </Root/voxel_material>")?;

    writeln!(usda, "    }}")?;
    Ok(())
}
