// Adaptive Runge-Kutta-Fehlberg integration of photon geodesics

use crate::error::IntegrationError;
use crate::geodesic::{geodesic_rhs, PhotonState, STATE_DIM};

// ============================================================================
// RKF45 BUTCHER TABLEAU
// ============================================================================

// Fehlberg's embedded 4(5) pair: six stages yield a 4th and a 5th order
// solution whose difference estimates the local truncation error.
const A21: f64 = 1.0 / 4.0;
const A31: f64 = 3.0 / 32.0;
const A32: f64 = 9.0 / 32.0;
const A41: f64 = 1932.0 / 2197.0;
const A42: f64 = -7200.0 / 2197.0;
const A43: f64 = 7296.0 / 2197.0;
const A51: f64 = 439.0 / 216.0;
const A52: f64 = -8.0;
const A53: f64 = 3680.0 / 513.0;
const A54: f64 = -845.0 / 4104.0;
const A61: f64 = -8.0 / 27.0;
const A62: f64 = 2.0;
const A63: f64 = -3544.0 / 2565.0;
const A64: f64 = 1859.0 / 4104.0;
const A65: f64 = -11.0 / 40.0;

const B4: [f64; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];
const B5: [f64; 6] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

// ============================================================================
// INTEGRATOR CONFIGURATION
// ============================================================================

// Fraction of the start radius at which the escape event fires.
//
// Slightly below 1.0 so the event cannot trigger on the initial sample
// (the photon starts exactly at r0, moving inward).
pub const ESCAPE_THRESHOLD: f64 = 0.999;

// Adaptive step-size integrator for the 8-component geodesic system
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    // Relative local error tolerance per component
    pub rel_tolerance: f64,

    // Absolute local error floor (guards components near zero, e.g. φ)
    pub abs_tolerance: f64,

    // Safety factor applied to every step-size adjustment
    pub safety_factor: f64,

    // Hard cap on accepted + rejected steps per trace
    pub max_steps: usize,
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            rel_tolerance: 1e-8,
            abs_tolerance: 1e-6,
            safety_factor: 0.9,
            max_steps: 100_000,
        }
    }
}

// ============================================================================
// TRAJECTORY RESULT
// ============================================================================

// Result of one geodesic trace: the affine-parameter samples, the state at
// each sample, and whether the escape event fired.
//
// The fields exist unconditionally - callers branch on `escaped` rather
// than probing for optional attributes. When `escaped` is true the last
// sample is the state at the event (r back at the escape threshold while
// increasing); otherwise the trajectory is truncated at lambda_max and the
// photon is possibly not yet escaped.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub escaped: bool,
    pub lambdas: Vec<f64>,
    pub states: Vec<PhotonState>,
}

impl Trajectory {
    // Last sample of the run. A trajectory always holds at least the
    // initial state, pushed before the first step is taken.
    #[inline]
    pub fn final_state(&self) -> &PhotonState {
        self.states.last().expect("trajectory holds the initial sample")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

// ============================================================================
// MAIN INTEGRATION LOOP
// ============================================================================

impl Integrator {
    // Integrate a photon from λ=0 forward until the escape event fires,
    // λ_max is reached, or the step budget runs out.
    //
    // Escape detection: the event radius is 0.999·r0. The photon starts
    // above it moving inward, so the first crossing is downward and is
    // ignored; only the later below-to-above crossing (receding after
    // closest approach) terminates the run. The event state is localized
    // on the dense interpolant of the accepted step, not snapped to a
    // step boundary.
    //
    // Numerical instability surfaces as a typed error; the caller decides
    // on a fallback.
    pub fn trace(
        &self,
        initial: &PhotonState,
        schwarzschild_radius: f64,
        lambda_max: f64,
    ) -> Result<Trajectory, IntegrationError> {
        let rs = schwarzschild_radius;
        let threshold = ESCAPE_THRESHOLD * initial.r;

        let max_step = lambda_max / 256.0;
        let min_step = lambda_max * 1e-14;
        let mut h = (lambda_max * 1e-6).max(min_step);

        let mut lambda = 0.0;
        let mut y = initial.as_array();
        let mut lambdas = vec![0.0];
        let mut states = vec![*initial];
        let mut escaped = false;
        let mut steps = 0usize;

        while lambda < lambda_max {
            // Remaining span too small to resolve: call it done
            if lambda_max - lambda < min_step {
                break;
            }
            steps += 1;
            if steps > self.max_steps {
                return Err(IntegrationError::MaxStepsExceeded { lambda });
            }

            let h_try = h.min(lambda_max - lambda);

            // Six RKF45 stages
            let k1 = geodesic_rhs(&y, rs);
            let k2 = geodesic_rhs(&stage(&y, h_try, &[(A21, &k1)]), rs);
            let k3 = geodesic_rhs(&stage(&y, h_try, &[(A31, &k1), (A32, &k2)]), rs);
            let k4 = geodesic_rhs(
                &stage(&y, h_try, &[(A41, &k1), (A42, &k2), (A43, &k3)]),
                rs,
            );
            let k5 = geodesic_rhs(
                &stage(&y, h_try, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
                rs,
            );
            let k6 = geodesic_rhs(
                &stage(
                    &y,
                    h_try,
                    &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
                ),
                rs,
            );

            let ks = [k1, k2, k3, k4, k5, k6];
            let y4 = combine(&y, h_try, &ks, &B4);
            let y5 = combine(&y, h_try, &ks, &B5);

            if !y5.iter().all(|v| v.is_finite()) {
                return Err(IntegrationError::NonFiniteState { lambda });
            }

            // Componentwise error ratio against mixed absolute/relative scale
            let mut ratio: f64 = 0.0;
            for i in 0..STATE_DIM {
                let scale =
                    self.abs_tolerance + self.rel_tolerance * y[i].abs().max(y5[i].abs());
                ratio = ratio.max((y5[i] - y4[i]).abs() / scale);
            }

            if ratio <= 1.0 {
                // Accepted: check the escape event before committing
                let crossed_up = (y[1] - threshold) < 0.0 && (y5[1] - threshold) >= 0.0;
                if crossed_up {
                    let f1 = geodesic_rhs(&y5, rs);
                    let (s_event, y_event) =
                        locate_crossing(&y, &k1, &y5, &f1, h_try, threshold);
                    lambdas.push(lambda + s_event * h_try);
                    states.push(PhotonState::from_array(&y_event));
                    escaped = true;
                    break;
                }

                y = y5;
                lambda += h_try;
                lambdas.push(lambda);
                states.push(PhotonState::from_array(&y));

                let factor = if ratio > 1e-12 {
                    (self.safety_factor * ratio.powf(-0.2)).clamp(0.2, 5.0)
                } else {
                    5.0
                };
                h = (h_try * factor).min(max_step);
            } else {
                // Rejected: shrink and retry
                let factor = (self.safety_factor * ratio.powf(-0.2)).clamp(0.2, 0.9);
                h = h_try * factor;
                if h < min_step {
                    return Err(IntegrationError::StepUnderflow { lambda });
                }
            }
        }

        Ok(Trajectory {
            escaped,
            lambdas,
            states,
        })
    }
}

// Intermediate stage state: y + h·Σ c_j·k_j
fn stage(
    y: &[f64; STATE_DIM],
    h: f64,
    terms: &[(f64, &[f64; STATE_DIM])],
) -> [f64; STATE_DIM] {
    let mut out = *y;
    for (c, k) in terms {
        for i in 0..STATE_DIM {
            out[i] += h * c * k[i];
        }
    }
    out
}

// Weighted combination of all six stages
fn combine(
    y: &[f64; STATE_DIM],
    h: f64,
    ks: &[[f64; STATE_DIM]; 6],
    b: &[f64; 6],
) -> [f64; STATE_DIM] {
    let mut out = *y;
    for (k, c) in ks.iter().zip(b) {
        if *c == 0.0 {
            continue;
        }
        for i in 0..STATE_DIM {
            out[i] += h * c * k[i];
        }
    }
    out
}

// Cubic Hermite dense output over one accepted step, s ∈ [0, 1]
fn hermite(
    y0: &[f64; STATE_DIM],
    f0: &[f64; STATE_DIM],
    y1: &[f64; STATE_DIM],
    f1: &[f64; STATE_DIM],
    h: f64,
    s: f64,
) -> [f64; STATE_DIM] {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    let mut out = [0.0; STATE_DIM];
    for i in 0..STATE_DIM {
        out[i] = h00 * y0[i] + h10 * h * f0[i] + h01 * y1[i] + h11 * h * f1[i];
    }
    out
}

// Bisect the dense interpolant for the radius-threshold crossing.
//
// Precondition: r(0) < threshold ≤ r(1). Returns the fractional position
// and the full interpolated state there.
fn locate_crossing(
    y0: &[f64; STATE_DIM],
    f0: &[f64; STATE_DIM],
    y1: &[f64; STATE_DIM],
    f1: &[f64; STATE_DIM],
    h: f64,
    threshold: f64,
) -> (f64, [f64; STATE_DIM]) {
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        let r_mid = hermite(y0, f0, y1, f1, h, mid)[1];
        if r_mid >= threshold {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (hi, hermite(y0, f0, y1, f1, h, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlackHole;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn launch(bh: &BlackHole, impact_parameter: f64) -> (PhotonState, f64, f64) {
        let rs = bh.schwarzschild_radius;
        let r0 = (1e4 * rs).max(1e6);
        let lambda_max = (2.0 * r0).max(1000.0);
        let dphi0 = impact_parameter / (r0 * r0);
        let photon =
            PhotonState::from_initial_conditions(r0, FRAC_PI_2, 0.0, -1.0, 0.0, dphi0, rs);
        (photon, r0, lambda_max)
    }

    #[test]
    fn test_escape_event_fires_on_increasing_crossing_only() {
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let (photon, r0, lambda_max) = launch(&bh, 100.0 * rs);

        let traj = Integrator::default()
            .trace(&photon, rs, lambda_max)
            .unwrap();

        assert!(traj.escaped, "a b = 100 r_s photon must escape");
        // Did not stop at the very first sample
        assert!(traj.len() > 2);
        assert!(*traj.lambdas.last().unwrap() > 0.5 * r0);
        // The photon really went below the threshold before coming back
        let r_min = traj
            .states
            .iter()
            .map(|s| s.r)
            .fold(f64::INFINITY, f64::min);
        assert!(r_min < ESCAPE_THRESHOLD * r0);
        // Final sample sits on the threshold, located via dense output
        let r_final = traj.final_state().r;
        assert!(
            (r_final - ESCAPE_THRESHOLD * r0).abs() < 1.0,
            "event radius off by {} m",
            (r_final - ESCAPE_THRESHOLD * r0).abs()
        );
    }

    #[test]
    fn test_escaping_photon_accumulates_deflection() {
        // Net bending shows up as |φ_final| exceeding the straight-line
        // sweep. At b = 10 r_s the weak-field estimate is 0.2 rad; the
        // traced value agrees to the accuracy this launch geometry allows.
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let (photon, _r0, lambda_max) = launch(&bh, 10.0 * rs);

        let traj = Integrator::default()
            .trace(&photon, rs, lambda_max)
            .unwrap();
        assert!(traj.escaped);

        let alpha = traj.final_state().phi.abs() - PI;
        assert!(
            (alpha - 0.2).abs() < 0.04,
            "deflection at b = 10 r_s was {alpha}, expected ~0.2"
        );
    }

    #[test]
    fn test_captured_photon_never_escapes() {
        // Below the photon sphere's critical impact parameter the ray
        // spirals in; the frozen near-horizon state must not fire the
        // escape event and must stay finite.
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let (photon, r0, lambda_max) = launch(&bh, 2.0 * rs);

        let traj = Integrator::default()
            .trace(&photon, rs, lambda_max)
            .unwrap();

        assert!(!traj.escaped);
        assert!(traj.final_state().r < ESCAPE_THRESHOLD * r0);
        assert!(traj.states.iter().all(|s| s.r.is_finite() && s.phi.is_finite()));
    }

    #[test]
    fn test_radial_plunge_is_truncated_not_escaped() {
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let (photon, _r0, lambda_max) = launch(&bh, 0.0);

        let traj = Integrator::default()
            .trace(&photon, rs, lambda_max)
            .unwrap();
        assert!(!traj.escaped);
        // φ never moves without angular velocity
        assert!(traj.final_state().phi.abs() < 1e-9);
    }

    #[test]
    fn test_short_lambda_max_returns_truncated_trajectory() {
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let (photon, _r0, _) = launch(&bh, 100.0 * rs);

        let lambda_max = 1000.0;
        let traj = Integrator::default()
            .trace(&photon, rs, lambda_max)
            .unwrap();

        assert!(!traj.escaped, "no escape possible within this span");
        let last = *traj.lambdas.last().unwrap();
        assert!(last <= lambda_max * (1.0 + 1e-9));
    }
}
