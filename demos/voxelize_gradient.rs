//! Example: Voxelize a generated gradient and export to GLB and OBJ
//!
//! This example demonstrates the full pipeline without any input file:
//! 1. Build a pixel buffer in memory
//! 2. Generate the voxel mesh
//! 3. Export to GLB and OBJ and save artifacts

use image_voxel_mesher::{
    export_glb, export_obj, generate_voxel_mesh, PixelImage, VoxelParams,
};
use std::fs;
use std::path::Path;

const WIDTH: u32 = 24;
const HEIGHT: u32 = 16;

/// Diagonal hue sweep that darkens towards the bottom row.
fn gradient_pixels() -> Vec<f32> {
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let u = x as f32 / (WIDTH - 1) as f32;
            let v = y as f32 / (HEIGHT - 1) as f32;
            pixels.extend([u * v, (1.0 - u) * v, 0.5 * v]);
        }
    }
    pixels
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let image = PixelImage::new(WIDTH, HEIGHT, 3, gradient_pixels())?;
    let params = VoxelParams::default()
        .with_display_width(4.0)
        .with_top_scale(0.8)
        .with_height_scale(6.0);

    let mesh = generate_voxel_mesh(&image, &params)?;
    println!(
        "Generated {} vertices, {} faces for {}x{} pixels",
        mesh.vertex_count(),
        mesh.face_count(),
        WIDTH,
        HEIGHT
    );

    let out_dir = Path::new("artifacts");
    fs::create_dir_all(out_dir)?;

    let glb = export_glb(&mesh)?;
    fs::write(out_dir.join("gradient.glb"), &glb)?;
    println!("Wrote {} bytes to {:?}", glb.len(), out_dir.join("gradient.glb"));

    let (obj, mtl) = export_obj(&mesh, "gradient")?;
    fs::write(out_dir.join("gradient.obj"), obj)?;
    fs::write(out_dir.join("gradient.mtl"), mtl)?;
    println!("Wrote OBJ to {:?}", out_dir.join("gradient.obj"));

    Ok(())
}
