// Radial deflection profile for the geodesic render method

use std::f64::consts::{FRAC_PI_2, PI};

use crate::integration::Integrator;
use crate::geodesic::PhotonState;
use crate::types::BlackHole;

// Bounds on the number of impact-parameter bins. More bins cost one full
// geodesic trace each; fewer bins coarsen the interpolation. Tunable
// defaults, not a contract.
pub const MIN_PROFILE_BINS: usize = 8;
pub const MAX_PROFILE_BINS: usize = 128;

// One traced bin per pixel of image radius, clamped into [8, 128]
pub fn profile_bin_count(max_radius_px: f64) -> usize {
    (max_radius_px as usize).clamp(MIN_PROFILE_BINS, MAX_PROFILE_BINS)
}

// ============================================================================
// DEFLECTION PROFILE
// ============================================================================

// Sampled deflection-angle table over image-space radius.
//
// Rationale: a full geodesic per output pixel is too slow. Instead a
// bounded number of representative impact parameters are traced and every
// pixel interpolates between them. Built once per render call and dropped
// afterwards; never cached across calls.
#[derive(Debug, Clone)]
pub struct DeflectionProfile {
    // Radius bins in pixels, strictly increasing from 0 to max_radius_px
    radii: Vec<f64>,

    // Net deflection angle per bin (radians)
    angles: Vec<f64>,
}

impl DeflectionProfile {
    // Trace one geodesic per radius bin and record its net deflection.
    //
    // Each bin launches a photon from far outside the strong-field region
    // (r0 = max(10⁴·r_s, 10⁶ m)) with unit inward radial velocity and the
    // small angular velocity φ̇ = b/r0² matching that bin's impact
    // parameter. A straight pass-through sweeps φ by exactly π, so the
    // net deflection is |φ_final| - π.
    //
    // A bin whose trace fails integrates to zero deflection instead of
    // aborting the render; the fallback is logged.
    pub fn build(black_hole: &BlackHole, max_radius_px: f64, meters_per_pixel: f64) -> Self {
        let rs = black_hole.schwarzschild_radius;
        let bins = profile_bin_count(max_radius_px);
        let r0 = (1e4 * rs).max(1e6);
        let lambda_max = (2.0 * r0).max(1000.0);
        let integrator = Integrator::default();

        let mut radii = Vec::with_capacity(bins);
        let mut angles = Vec::with_capacity(bins);

        for i in 0..bins {
            let radius_px = max_radius_px * i as f64 / (bins - 1) as f64;
            let b = radius_px * meters_per_pixel;
            let dphi0 = b / (r0 * r0);

            let photon =
                PhotonState::from_initial_conditions(r0, FRAC_PI_2, 0.0, -1.0, 0.0, dphi0, rs);

            let angle = match integrator.trace(&photon, rs, lambda_max) {
                Ok(trajectory) => trajectory.final_state().phi.abs() - PI,
                Err(err) => {
                    log::warn!(
                        "deflection bin {i} (b = {b:.3e} m) failed: {err}; using zero fallback"
                    );
                    0.0
                }
            };

            radii.push(radius_px);
            angles.push(angle);
        }

        log::debug!(
            "deflection profile: {bins} bins over {max_radius_px:.1} px, r0 = {r0:.3e} m"
        );

        Self { radii, angles }
    }

    // Piecewise-linear interpolation over the bins, clamped at the ends
    pub fn sample(&self, radius_px: f64) -> f64 {
        let n = self.radii.len();
        if radius_px <= self.radii[0] {
            return self.angles[0];
        }
        if radius_px >= self.radii[n - 1] {
            return self.angles[n - 1];
        }

        // Bins are evenly spaced, but search keeps this correct for any
        // increasing grid
        let upper = self
            .radii
            .partition_point(|r| *r < radius_px)
            .clamp(1, n - 1);
        let lower = upper - 1;

        let span = self.radii[upper] - self.radii[lower];
        let t = (radius_px - self.radii[lower]) / span;
        self.angles[lower] + t * (self.angles[upper] - self.angles[lower])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_count_clamping() {
        assert_eq!(profile_bin_count(2.0), MIN_PROFILE_BINS);
        assert_eq!(profile_bin_count(50.9), 50);
        assert_eq!(profile_bin_count(4000.0), MAX_PROFILE_BINS);
    }

    #[test]
    fn test_bins_are_increasing() {
        let bh = BlackHole::new(10.0).unwrap();
        let mpp = 100.0 * bh.schwarzschild_radius / 16.0;
        let profile = DeflectionProfile::build(&bh, 16.0, mpp);

        assert_eq!(profile.len(), 16);
        for pair in profile.radii.windows(2) {
            assert!(pair[1] > pair[0], "bin radii must strictly increase");
        }
        assert_eq!(profile.radii[0], 0.0);
        assert_eq!(*profile.radii.last().unwrap(), 16.0);
    }

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let profile = DeflectionProfile {
            radii: vec![0.0, 1.0, 2.0],
            angles: vec![0.0, 0.1, 0.4],
        };

        assert_eq!(profile.sample(-5.0), 0.0);
        assert_eq!(profile.sample(0.0), 0.0);
        assert!((profile.sample(0.5) - 0.05).abs() < 1e-12);
        assert!((profile.sample(1.5) - 0.25).abs() < 1e-12);
        assert_eq!(profile.sample(2.0), 0.4);
        assert_eq!(profile.sample(99.0), 0.4);
    }

    #[test]
    fn test_traced_angles_are_finite() {
        let bh = BlackHole::new(10.0).unwrap();
        // Outer bin at 20 Schwarzschild radii; inner bins cross the capture
        // region and read whatever angle the frozen state left behind
        let mpp = 20.0 * bh.schwarzschild_radius / 16.0;
        let profile = DeflectionProfile::build(&bh, 16.0, mpp);
        assert!(profile.angles.iter().all(|a| a.is_finite()));
    }
}
