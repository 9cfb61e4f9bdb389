// Image-space lensing transform: deflection field, inverse mapping, mask

use image::{Rgb, RgbImage};

use crate::error::LensError;
use crate::profile::DeflectionProfile;
use crate::types::{BlackHole, LensMethod};

// ============================================================================
// PIXEL FIELD
// ============================================================================

// Per-pixel polar geometry of an output grid.
//
// Owned by a single mapper invocation; concurrent renders each build their
// own, so nothing is shared or locked.
#[derive(Debug, Clone)]
pub struct PixelField {
    pub width: u32,
    pub height: u32,

    // Image center in pixel coordinates
    pub cx: f64,
    pub cy: f64,

    // Image-space radius and polar angle per pixel, row-major
    pub radius: Vec<f64>,
    pub angle: Vec<f64>,

    // Largest pixel radius, floored at 1.0 so the physical scale is
    // well-defined even for a 1x1 grid
    pub max_radius: f64,
}

impl PixelField {
    pub fn new(width: u32, height: u32) -> Self {
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        let count = (width as usize) * (height as usize);

        let mut radius = Vec::with_capacity(count);
        let mut angle = Vec::with_capacity(count);
        let mut max_radius = 1.0_f64;

        for y in 0..height {
            for x in 0..width {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                let r = (dx * dx + dy * dy).sqrt();
                radius.push(r);
                angle.push(dy.atan2(dx));
                max_radius = max_radius.max(r);
            }
        }

        Self {
            width,
            height,
            cx,
            cy,
            radius,
            angle,
            max_radius,
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

// ============================================================================
// DEFLECTION FIELD
// ============================================================================

// Deflection angle per pixel, by either method.
//
// Weak: the closed-form law applied elementwise (INFINITY marks capture).
// Geodesic: one profile of traced bins, linearly interpolated to every
// pixel's radius - all values finite, the horizon mask handles the shadow.
pub fn deflection_field(
    field: &PixelField,
    black_hole: &BlackHole,
    meters_per_pixel: f64,
    method: LensMethod,
) -> Vec<f64> {
    match method {
        LensMethod::Weak => field
            .radius
            .iter()
            .map(|r_px| black_hole.weak_field_deflection(r_px * meters_per_pixel))
            .collect(),
        LensMethod::Geodesic => {
            let profile =
                DeflectionProfile::build(black_hole, field.max_radius, meters_per_pixel);
            field.radius.iter().map(|r_px| profile.sample(*r_px)).collect()
        }
    }
}

// ============================================================================
// LENSING MAPPER
// ============================================================================

// Apply gravitational lensing to a source image.
//
// Backward (image-order) mapping: each output pixel looks up the single
// source location its light originated from. The apparent polar angle is
// rotated by the deflection, the sampling position is rounded to the
// nearest source pixel and clamped into bounds, and anything inside the
// event horizon (or captured under the weak-field law) is painted black.
//
// `scale` is the number of Schwarzschild radii spanned by the grid's
// maximum image radius. Pure function of its inputs; safe to call
// concurrently with independent arguments.
pub fn lens_image(
    src: &RgbImage,
    mass: f64,
    scale: f64,
    method: LensMethod,
) -> Result<RgbImage, LensError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(LensError::InvalidScale(scale));
    }
    let black_hole = BlackHole::new(mass)?;

    let (width, height) = src.dimensions();
    let field = PixelField::new(width, height);

    let rs = black_hole.schwarzschild_radius;
    let meters_per_pixel = scale * rs / field.max_radius;
    let horizon_px = rs / meters_per_pixel;

    log::debug!(
        "lensing {width}x{height} px, method {}, {meters_per_pixel:.3e} m/px, shadow radius {horizon_px:.2} px",
        method.name()
    );

    let alpha = deflection_field(&field, &black_hole, meters_per_pixel, method);

    let black = Rgb([0u8, 0u8, 0u8]);
    let mut out = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let i = field.index(x, y);
            let r_px = field.radius[i];
            let a = alpha[i];

            // Event-horizon shadow and captured rays render black
            if !a.is_finite() || r_px <= horizon_px {
                out.put_pixel(x, y, black);
                continue;
            }

            // Trace backward: the apparent direction rotated by the
            // deflection points at the source location
            let theta_src = field.angle[i] + a;
            let sx = field.cx + r_px * theta_src.cos();
            let sy = field.cy + r_px * theta_src.sin();

            let xi = (sx.round() as i64).clamp(0, width as i64 - 1) as u32;
            let yi = (sy.round() as i64).clamp(0, height as i64 - 1) as u32;

            out.put_pixel(x, y, *src.get_pixel(xi, yi));
        }
    }

    Ok(out)
}
