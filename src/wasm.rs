//! WASM bindings for image-voxel-mesher.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.
//! Build with `--no-default-features --features wasm`; the rayon pass is
//! not available on `wasm32`.

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

/// Voxel shape options.
#[wasm_bindgen]
pub struct VoxelOptions {
    params: crate::VoxelParams,
}

impl Default for VoxelOptions {
    fn default() -> Self {
        Self {
            params: crate::VoxelParams::default(),
        }
    }
}

#[wasm_bindgen]
impl VoxelOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> VoxelOptions {
        VoxelOptions::default()
    }

    /// Parse options from a JSON object such as `{"top_scale": 1.0}`.
    pub fn from_json(json: &str) -> Result<VoxelOptions, JsError> {
        let params = crate::VoxelParams::from_json_str(json)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(VoxelOptions { params })
    }

    #[wasm_bindgen(setter)]
    pub fn set_display_width(&mut self, value: f32) {
        self.params.display_width = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_base_scale(&mut self, value: f32) {
        self.params.base_scale = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_top_scale(&mut self, value: f32) {
        self.params.top_scale = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_height_scale(&mut self, value: f32) {
        self.params.height_scale = value;
    }
}

/// Mesh result containing GLB data.
#[wasm_bindgen]
pub struct MeshResult {
    glb_data: Vec<u8>,
    vertex_count: usize,
    face_count: usize,
}

#[wasm_bindgen]
impl MeshResult {
    /// Get the GLB binary data.
    #[wasm_bindgen(getter)]
    pub fn glb_data(&self) -> Vec<u8> {
        self.glb_data.clone()
    }

    /// Get the voxel mesh vertex count (8 per pixel).
    #[wasm_bindgen(getter)]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Get the voxel mesh quad count (6 per pixel).
    #[wasm_bindgen(getter)]
    pub fn face_count(&self) -> usize {
        self.face_count
    }
}

/// Flat triangle arrays for direct upload into a WebGL/three.js buffer.
#[wasm_bindgen]
pub struct VoxelMeshHandle {
    inner: crate::RawMeshData,
}

#[wasm_bindgen]
impl VoxelMeshHandle {
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.inner.positions_flat().as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn normals(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.inner.normals_flat().as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn colors(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.inner.colors_flat().as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(self.inner.indices.as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn vertex_count(&self) -> usize {
        self.inner.vertex_count()
    }
}

fn mesh_image(
    image: &crate::PixelImage,
    options: Option<VoxelOptions>,
) -> Result<crate::MeshBuffer, JsError> {
    let options = options.unwrap_or_default();
    crate::VoxelMesher::with_params(options.params)
        .with_strategy(crate::AssemblyStrategy::Sequential)
        .mesh(image)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Voxelize an encoded PNG/JPEG and return GLB data.
#[wasm_bindgen]
pub fn voxelize_image_to_glb(
    data: &[u8],
    options: Option<VoxelOptions>,
) -> Result<MeshResult, JsError> {
    let image = crate::load_image_from_bytes(data).map_err(|e| JsError::new(&e.to_string()))?;
    let mesh = mesh_image(&image, options)?;

    let glb_data = crate::export_glb(&mesh).map_err(|e| JsError::new(&e.to_string()))?;

    Ok(MeshResult {
        glb_data,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
    })
}

/// Voxelize an already decoded pixel buffer and return flat triangle arrays.
///
/// Samples must be in `[0, 1]` with row 0 at the bottom; canvas `ImageData`
/// needs its rows reversed and its bytes divided by 255 first.
#[wasm_bindgen]
pub fn voxelize_pixels(
    width: u32,
    height: u32,
    channels: u32,
    pixels: Vec<f32>,
    options: Option<VoxelOptions>,
) -> Result<VoxelMeshHandle, JsError> {
    let image = crate::PixelImage::new(width, height, channels, pixels)
        .map_err(|e| JsError::new(&e.to_string()))?;
    let mesh = mesh_image(&image, options)?;

    let inner = crate::export_raw(&mesh).map_err(|e| JsError::new(&e.to_string()))?;

    Ok(VoxelMeshHandle { inner })
}
