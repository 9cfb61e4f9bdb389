// kernels/gravity_lens/src/lib.rs

// Gravitational Lensing Physics Core
//
// This library renders the distortion a Schwarzschild black hole imprints
// on a background image. The pipeline flows one way:
//
//   black-hole model -> geodesic integrator -> deflection profile -> mapper
//
// Two deflection models are supported: the closed-form weak-field law
// (fast) and full null-geodesic integration sampled at radial bins and
// interpolated (accurate near the photon sphere). Every render call is a
// pure function over its inputs; nothing is cached or shared between
// calls, so independent renders may run concurrently without locking.
//
// All computations use f64 for precision near the horizon.

pub mod error;
pub mod geodesic;
pub mod integration;
pub mod lensing;
pub mod profile;
pub mod render;
pub mod types;

pub use error::{IntegrationError, LensError};
pub use geodesic::{geodesic_rhs, null_invariant, PhotonState};
pub use integration::{Integrator, Trajectory};
pub use lensing::{deflection_field, lens_image, PixelField};
pub use profile::{profile_bin_count, DeflectionProfile};
pub use render::{
    render_animation, render_buffer, render_file, resize_to_width, roll_horizontal,
    RenderOptions, PREVIEW_WIDTH,
};
pub use types::{BlackHole, LensMethod, C, G, SOLAR_MASS};
