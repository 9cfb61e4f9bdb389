// Error types for the lensing pipeline

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// CALLER-FACING ERRORS
// ============================================================================

// Failures surfaced to the caller of the render entry points.
//
// Everything here is rejected before any pixel is computed: either a
// parameter failed validation or the source asset could not be read.
// Capture and singularity conditions are NOT errors - they are defined
// physical outcomes (infinite deflection, masked pixel).
#[derive(Error, Debug)]
pub enum LensError {
    // Mass in solar masses; the Schwarzschild radius must stay positive
    #[error("mass must be positive and finite (solar masses), got {0}")]
    InvalidMass(f64),

    // Scale in Schwarzschild radii spanned by the image's maximum radius
    #[error("scale must be positive and finite (Schwarzschild radii), got {0}")]
    InvalidScale(f64),

    #[error("output width must be at least 1 pixel")]
    InvalidWidth,

    #[error("frame count must be at least 1")]
    InvalidFrameCount,

    #[error("unknown lensing method '{0}', expected 'weak' or 'geodesic'")]
    UnknownMethod(String),

    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed to read source image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

// ============================================================================
// PER-TRACE ERRORS
// ============================================================================

// A single geodesic trace that failed to converge.
//
// The profile builder absorbs these locally (zero-angle fallback for the
// affected bin); they never abort a render or reach the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum IntegrationError {
    #[error("step size underflow at lambda = {lambda:.6e}")]
    StepUnderflow { lambda: f64 },

    #[error("non-finite state at lambda = {lambda:.6e}")]
    NonFiniteState { lambda: f64 },

    #[error("step budget exhausted at lambda = {lambda:.6e}")]
    MaxStepsExceeded { lambda: f64 },
}
