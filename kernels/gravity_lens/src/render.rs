// Render entry points: source loading, resizing, frame sequencing

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::LensError;
use crate::lensing::lens_image;
use crate::types::LensMethod;

// Default output width for previews
pub const PREVIEW_WIDTH: u32 = 512;

// ============================================================================
// RENDER OPTIONS
// ============================================================================

// Parameters for one render call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    // Black hole mass in solar masses
    pub mass: f64,

    // Schwarzschild radii spanned by the output grid's maximum radius
    pub scale: f64,

    // Output width in pixels; height follows the source aspect ratio
    pub out_width: u32,

    // Deflection model
    pub method: LensMethod,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mass: 10.0,
            scale: 100.0,
            out_width: PREVIEW_WIDTH,
            method: LensMethod::Weak,
        }
    }
}

// ============================================================================
// SOURCE PREPARATION
// ============================================================================

// Aspect-preserving bilinear resize to the requested output width
pub fn resize_to_width(src: &RgbImage, out_width: u32) -> Result<RgbImage, LensError> {
    if out_width == 0 {
        return Err(LensError::InvalidWidth);
    }

    let (w0, h0) = src.dimensions();
    let aspect = h0 as f64 / w0.max(1) as f64;
    let out_height = ((out_width as f64 * aspect) as u32).max(1);

    Ok(imageops::resize(src, out_width, out_height, FilterType::Triangle))
}

// Circular leftward column shift; the animation primitive.
//
// Column x of the output reads column (x + shift) mod width of the source,
// so content appears to drift left as the shift grows.
pub fn roll_horizontal(src: &RgbImage, shift: u32) -> RgbImage {
    let (width, height) = src.dimensions();
    let shift = shift % width;
    let mut out = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let src_x = (x + shift) % width;
            out.put_pixel(x, y, *src.get_pixel(src_x, y));
        }
    }

    out
}

// ============================================================================
// RENDER ENTRY POINTS
// ============================================================================

// Render a lensed image from a source file on disk.
//
// A missing path is reported before any decode is attempted; decode
// failures carry the underlying image error.
pub fn render_file(path: &Path, options: &RenderOptions) -> Result<RgbImage, LensError> {
    if !path.exists() {
        return Err(LensError::SourceNotFound(path.to_path_buf()));
    }

    let src = image::open(path)?.to_rgb8();
    render_buffer(&src, options)
}

// Render a lensed image from an in-memory source buffer
pub fn render_buffer(src: &RgbImage, options: &RenderOptions) -> Result<RgbImage, LensError> {
    let resized = resize_to_width(src, options.out_width)?;
    lens_image(&resized, options.mass, options.scale, options.method)
}

// Render an animation as a sequence of independently lensed frames.
//
// The source is resized once; frame i lenses a copy rolled left by
// round(i·width/frames) columns. Frames are fully independent - no
// sequencing state lives in the core - and `progress` is invoked with the
// number of completed frames after each one.
pub fn render_animation<F>(
    src: &RgbImage,
    frames: u32,
    options: &RenderOptions,
    mut progress: F,
) -> Result<Vec<RgbImage>, LensError>
where
    F: FnMut(u32),
{
    if frames == 0 {
        return Err(LensError::InvalidFrameCount);
    }

    let resized = resize_to_width(src, options.out_width)?;
    let width = resized.width();

    let mut rendered = Vec::with_capacity(frames as usize);
    for i in 0..frames {
        let shift = (i as f64 * width as f64 / frames as f64).round() as u32;
        let rolled = roll_horizontal(&resized, shift);
        rendered.push(lens_image(&rolled, options.mass, options.scale, options.method)?);
        progress(i + 1);
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::path::PathBuf;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 7])
        })
    }

    #[test]
    fn test_resize_preserves_aspect() {
        let src = gradient(200, 100);
        let out = resize_to_width(&src, 50).unwrap();
        assert_eq!(out.dimensions(), (50, 25));

        // Width below one source-height unit still yields at least one row
        let tall = gradient(400, 2);
        let out = resize_to_width(&tall, 100).unwrap();
        assert_eq!(out.dimensions(), (100, 1));
    }

    #[test]
    fn test_resize_rejects_zero_width() {
        let src = gradient(8, 8);
        assert!(matches!(
            resize_to_width(&src, 0),
            Err(LensError::InvalidWidth)
        ));
    }

    #[test]
    fn test_roll_wraps_columns() {
        let src = gradient(10, 3);
        let rolled = roll_horizontal(&src, 4);

        for y in 0..3 {
            for x in 0..10 {
                assert_eq!(rolled.get_pixel(x, y), src.get_pixel((x + 4) % 10, y));
            }
        }

        // A full revolution is the identity
        let full = roll_horizontal(&src, 10);
        assert_eq!(full, src);
    }

    #[test]
    fn test_render_file_missing_source() {
        let path = PathBuf::from("definitely/not/here.png");
        let err = render_file(&path, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, LensError::SourceNotFound(_)));
    }

    #[test]
    fn test_render_buffer_output_dimensions() {
        let src = gradient(128, 64);
        let options = RenderOptions {
            out_width: 32,
            ..RenderOptions::default()
        };
        let out = render_buffer(&src, &options).unwrap();
        assert_eq!(out.dimensions(), (32, 16));
    }

    #[test]
    fn test_animation_frame_count_and_independence() {
        let src = gradient(40, 20);
        let options = RenderOptions {
            out_width: 20,
            ..RenderOptions::default()
        };

        let mut ticks = Vec::new();
        let frames = render_animation(&src, 4, &options, |done| ticks.push(done)).unwrap();

        assert_eq!(frames.len(), 4);
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        for frame in &frames {
            assert_eq!(frame.dimensions(), (20, 10));
        }
    }

    #[test]
    fn test_animation_rejects_zero_frames() {
        let src = gradient(16, 16);
        assert!(matches!(
            render_animation(&src, 0, &RenderOptions::default(), |_| {}),
            Err(LensError::InvalidFrameCount)
        ));
    }
}
