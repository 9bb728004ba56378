//! Image Voxel Mesher CLI
//!
//! Generate voxel meshes from raster images.

use clap::{Parser, Subcommand, ValueEnum};
use image_voxel_mesher::{
    export_glb, export_usda, load_image, AssemblyStrategy, MeshBuffer, ObjExport, VoxelMesher,
    VoxelParams,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-voxel-mesher")]
#[command(author, version, about = "Generate voxel meshes from raster images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn every pixel of an image into a colored prism
    Voxelize {
        /// Input image (PNG or JPEG)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (extension added when missing)
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "glb")]
        format: OutputFormat,

        /// JSON file with voxel parameters; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Width of the whole image in world units
        #[arg(long)]
        display_width: Option<f32>,

        /// Prism base size relative to one cell
        #[arg(long)]
        base_scale: Option<f32>,

        /// Prism top size relative to one cell
        #[arg(long)]
        top_scale: Option<f32>,

        /// Height of a fully light pixel, in cells
        #[arg(long)]
        height_scale: Option<f32>,

        /// Assemble on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Show information about an image
    Info {
        /// Input image (PNG or JPEG)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Binary glTF format
    Glb,
    /// Wavefront OBJ format
    Obj,
    /// USD ASCII format
    Usda,
}

/// Parameter overrides given on the command line.
struct ParamOverrides {
    display_width: Option<f32>,
    base_scale: Option<f32>,
    top_scale: Option<f32>,
    height_scale: Option<f32>,
}

impl ParamOverrides {
    fn apply(&self, mut params: VoxelParams) -> VoxelParams {
        if let Some(value) = self.display_width {
            params.display_width = value;
        }
        if let Some(value) = self.base_scale {
            params.base_scale = value;
        }
        if let Some(value) = self.top_scale {
            params.top_scale = value;
        }
        if let Some(value) = self.height_scale {
            params.height_scale = value;
        }
        params
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Voxelize {
            input,
            output,
            format,
            config,
            display_width,
            base_scale,
            top_scale,
            height_scale,
            sequential,
        } => {
            let overrides = ParamOverrides {
                display_width,
                base_scale,
                top_scale,
                height_scale,
            };
            voxelize(
                &input,
                &output,
                format,
                config.as_deref(),
                &overrides,
                sequential,
            )?;
        }
        Commands::Info { input } => {
            show_image_info(&input)?;
        }
    }

    Ok(())
}

fn voxelize(
    input_path: &Path,
    output_path: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    overrides: &ParamOverrides,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_params = match config_path {
        Some(path) => {
            println!("Loading voxel parameters from {:?}...", path);
            VoxelParams::from_path(path)?
        }
        None => VoxelParams::default(),
    };
    let params = overrides.apply(base_params);
    params.validate()?;

    println!("Loading image from {:?}...", input_path);
    let image = load_image(input_path)?;
    println!(
        "  {}x{} pixels, {} channels",
        image.width, image.height, image.channels
    );

    println!("Meshing with params:");
    println!("  - Display width: {}", params.display_width);
    println!("  - Base scale: {}", params.base_scale);
    println!("  - Top scale: {}", params.top_scale);
    println!("  - Height scale: {}", params.height_scale);

    let strategy = if sequential {
        AssemblyStrategy::Sequential
    } else {
        AssemblyStrategy::Auto
    };
    let mesher = VoxelMesher::with_params(params).with_strategy(strategy);
    let mesh = mesher.mesh(&image)?;

    println!(
        "  Generated {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    );

    let name = input_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("voxels");
    export_mesh(&mesh, output_path, format, name)?;

    Ok(())
}

fn show_image_info(input_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading image from {:?}...", input_path);
    let image = load_image(input_path)?;
    let voxels = image.pixel_count();

    println!("\nImage Info:");
    println!("  Size: {}x{}", image.width, image.height);
    println!("  Channels: {}", image.channels);
    println!("  Voxels: {}", voxels);
    println!("  Vertices: {}", voxels * 8);
    println!("  Faces: {}", voxels * 6);

    Ok(())
}

fn export_mesh(
    mesh: &MeshBuffer,
    path: &Path,
    format: OutputFormat,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Glb => {
            let glb_path = if path.extension().is_some() {
                path.to_path_buf()
            } else {
                path.with_extension("glb")
            };
            let glb_data = export_glb(mesh)?;
            fs::write(&glb_path, &glb_data)?;
            println!("Exported GLB ({} bytes) to {:?}", glb_data.len(), glb_path);
        }
        OutputFormat::Obj => {
            let obj_export = ObjExport::from_mesh(mesh, name)?;

            let obj_path = if path.extension().is_some() {
                path.to_path_buf()
            } else {
                path.with_extension("obj")
            };
            let mtl_path = obj_path.with_file_name(format!("{}.mtl", name));

            fs::write(&obj_path, &obj_export.obj)?;
            fs::write(&mtl_path, &obj_export.mtl)?;

            println!("Exported OBJ to {:?}", obj_path);
            println!("  Material: {:?}", mtl_path);
        }
        OutputFormat::Usda => {
            let usda_path = if path.extension().is_some() {
                path.to_path_buf()
            } else {
                path.with_extension("usda")
            };
            let usda = export_usda(mesh, name)?;
            fs::write(&usda_path, &usda)?;
            println!("Exported USDA ({} bytes) to {:?}", usda.len(), usda_path);
        }
    }

    Ok(())
}
