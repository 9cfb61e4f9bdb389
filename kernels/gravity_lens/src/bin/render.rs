// Gravitational Lens Render CLI
//
// Loads a source image, applies the lensing transform, and writes PNG
// output plus a manifest describing the run. With --frames > 1 the source
// drifts horizontally behind the black hole, one PNG per frame.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use gravity_lens::*;

/// CLI arguments for the lens renderer
#[derive(Parser, Debug)]
#[command(name = "render")]
#[command(about = "Render gravitational lensing of an image by a Schwarzschild black hole", long_about = None)]
struct Args {
    /// Source image path (PNG, JPEG, ...)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for rendered frames and the manifest
    #[arg(short, long, default_value = "renders")]
    output: PathBuf,

    /// Black hole mass in solar masses
    #[arg(short, long, default_value_t = 10.0)]
    mass: f64,

    /// Schwarzschild radii spanned by the image's maximum radius
    #[arg(short, long, default_value_t = 100.0)]
    scale: f64,

    /// Output width in pixels (height follows the source aspect ratio)
    #[arg(short, long, default_value_t = PREVIEW_WIDTH)]
    width: u32,

    /// Deflection model: "weak" (fast) or "geodesic" (accurate)
    #[arg(short = 'M', long, default_value = "weak")]
    method: String,

    /// Number of frames; 1 renders a single still
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1024))]
    frames: u32,
}

/// Metadata written next to the rendered output
#[derive(Serialize)]
struct Manifest {
    input: String,
    options: RenderOptions,
    frames: u32,
    outputs: Vec<String>,
}

/// Parse the deflection model from its CLI name
fn parse_method(method: &str) -> Result<LensMethod, String> {
    method
        .parse::<LensMethod>()
        .map_err(|_| format!("Invalid method: '{method}'. Must be one of: weak, geodesic"))
}

fn frame_filename(stem: &str, frames: u32, index: u32) -> String {
    if frames == 1 {
        format!("{stem}_lensed.png")
    } else {
        format!("{stem}_frame{index:03}.png")
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let method = parse_method(&args.method).map_err(|e| e.to_string())?;
    let options = RenderOptions {
        mass: args.mass,
        scale: args.scale,
        out_width: args.width,
        method,
    };

    if !args.input.exists() {
        return Err(Box::new(LensError::SourceNotFound(args.input.clone())));
    }
    let source = image::open(&args.input)?.to_rgb8();
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    println!("\nGravitational Lens Renderer");
    println!("=======================================");
    println!("  Input: {}", args.input.display());
    println!("  Source: {}x{}", source.width(), source.height());
    println!("  Mass: {} solar masses", options.mass);
    println!("  Scale: {} Schwarzschild radii", options.scale);
    println!("  Width: {} px", options.out_width);
    println!("  Method: {}", method.name());
    println!("  Frames: {}", args.frames);
    println!("=======================================\n");

    let pb = ProgressBar::new(args.frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%)")?
            .progress_chars("=> "),
    );

    println!("Tracing light rays...");
    let rendered = render_animation(&source, args.frames, &options, |done| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("lensing complete");

    fs::create_dir_all(&args.output)?;

    println!("\nWriting files...");
    let mut outputs = Vec::with_capacity(rendered.len());
    for (i, frame) in rendered.iter().enumerate() {
        let name = frame_filename(&stem, args.frames, i as u32);
        let path = args.output.join(&name);
        frame.save(&path)?;
        println!("  Wrote {} ({}x{})", path.display(), frame.width(), frame.height());
        outputs.push(name);
    }

    let manifest = Manifest {
        input: args.input.display().to_string(),
        options,
        frames: args.frames,
        outputs,
    };
    let manifest_path = args.output.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    println!("  Wrote {}", manifest_path.display());

    println!("\nRender complete: {} frame(s) in {}\n", args.frames, args.output.display());

    Ok(())
}
