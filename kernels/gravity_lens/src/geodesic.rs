// Photon state and null geodesic equations in Schwarzschild spacetime

// ============================================================================
// GEODESIC STATE (PHOTON TRACKING)
// ============================================================================

// Number of components in the first-order geodesic system
pub const STATE_DIM: usize = 8;

// Factor above the Schwarzschild radius at which the metric is treated as
// numerically singular (f = 1 - r_s/r approaches zero)
pub const SINGULARITY_GUARD: f64 = 1.01;

// State of a photon during geodesic integration
//
// Physics: In Schwarzschild spacetime a photon's path is described by its
// position (t, r, θ, φ) and the derivatives of those coordinates with
// respect to the affine parameter λ. The second-order geodesic equations
// become a first-order system in these 8 variables.
//
// A state is created per trace call, owned by one integration run, and
// discarded when the run completes.
#[derive(Debug, Clone, Copy)]
pub struct PhotonState {
    // Coordinate time
    pub t: f64,

    // Radial coordinate (meters; NOT Euclidean distance near the hole)
    pub r: f64,

    // Polar angle θ ∈ [0, π]
    pub theta: f64,

    // Azimuthal angle φ (unwrapped - net angular travel matters for the
    // deflection readout, so φ is never reduced mod 2π)
    pub phi: f64,

    // Derivatives with respect to the affine parameter λ
    pub dt: f64,
    pub dr: f64,
    pub dtheta: f64,
    pub dphi: f64,
}

impl PhotonState {
    // Build an initial photon state from a spherical position and spatial
    // velocity, deriving dt/dλ from the null (photon) constraint
    //
    // Math: g_μν ẋ^μ ẋ^ν = 0 for light. In Schwarzschild coordinates with
    // f = 1 - r_s/r this gives
    //
    //   ṫ² = (ṙ²/f + r²(θ̇² + sin²θ·φ̇²)) / f
    //
    // The start radius must be outside the horizon for f to be positive.
    pub fn from_initial_conditions(
        r0: f64,
        theta0: f64,
        phi0: f64,
        dr0: f64,
        dtheta0: f64,
        dphi0: f64,
        schwarzschild_radius: f64,
    ) -> Self {
        assert!(r0 > schwarzschild_radius, "start radius must be outside the horizon");

        let f = 1.0 - schwarzschild_radius / r0;
        let sin_theta = theta0.sin();
        let angular = r0 * r0 * (dtheta0 * dtheta0 + sin_theta * sin_theta * dphi0 * dphi0);
        let dt0 = ((dr0 * dr0 / f + angular) / f).sqrt();

        Self {
            t: 0.0,
            r: r0,
            theta: theta0,
            phi: phi0,
            dt: dt0,
            dr: dr0,
            dtheta: dtheta0,
            dphi: dphi0,
        }
    }

    #[inline]
    pub fn as_array(&self) -> [f64; STATE_DIM] {
        [
            self.t, self.r, self.theta, self.phi, self.dt, self.dr, self.dtheta, self.dphi,
        ]
    }

    #[inline]
    pub fn from_array(v: &[f64; STATE_DIM]) -> Self {
        Self {
            t: v[0],
            r: v[1],
            theta: v[2],
            phi: v[3],
            dt: v[4],
            dr: v[5],
            dtheta: v[6],
            dphi: v[7],
        }
    }
}

// ============================================================================
// GEODESIC EQUATIONS OF MOTION
// ============================================================================

// Right-hand side of the geodesic ODE system
//
// Physics: d²x^μ/dλ² = -Γ^μ_αβ (dx^α/dλ)(dx^β/dλ) with the non-zero
// Christoffel symbols of the Schwarzschild metric in (t, r, θ, φ)
// coordinates:
//
//   Γ^t_tr = r_s / (2r(r - r_s))          Γ^r_tt = r_s·f / (2r²)
//   Γ^r_rr = -r_s / (2r(r - r_s))         Γ^r_θθ = -(r - r_s)
//   Γ^r_φφ = -(r - r_s)·sin²θ             Γ^θ_rθ = 1/r
//   Γ^θ_φφ = -sinθ·cosθ                   Γ^φ_rφ = 1/r
//   Γ^φ_θφ = cosθ/sinθ
//
// Near r ≤ 1.01·r_s the metric function f = 1 - r_s/r goes to zero and the
// symbols blow up; the zero vector is returned there so the integrator sees
// a frozen state instead of NaN/Inf.
pub fn geodesic_rhs(state: &[f64; STATE_DIM], schwarzschild_radius: f64) -> [f64; STATE_DIM] {
    let rs = schwarzschild_radius;
    let [_t, r, theta, _phi, dt, dr, dtheta, dphi] = *state;

    // Metric singularity guard: stop evolving rather than corrupt the state
    if r <= rs * SINGULARITY_GUARD {
        return [0.0; STATE_DIM];
    }

    let f = 1.0 - rs / r;
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();

    let g_t_tr = rs / (2.0 * r * (r - rs));
    let g_r_tt = rs * f / (2.0 * r * r);
    let g_r_rr = -rs / (2.0 * r * (r - rs));
    let g_r_thth = -(r - rs);
    let g_r_phph = -(r - rs) * sin_theta * sin_theta;
    let g_th_rth = 1.0 / r;
    let g_th_phph = -sin_theta * cos_theta;
    let g_ph_rph = 1.0 / r;
    // Pole guard: Γ^φ_θφ diverges at sinθ = 0
    let g_ph_thph = if sin_theta.abs() < 1e-12 {
        0.0
    } else {
        cos_theta / sin_theta
    };

    let d2t = -2.0 * g_t_tr * dt * dr;
    let d2r = -g_r_tt * dt * dt
        - g_r_rr * dr * dr
        - g_r_thth * dtheta * dtheta
        - g_r_phph * dphi * dphi;
    let d2theta = -2.0 * g_th_rth * dr * dtheta - g_th_phph * dphi * dphi;
    let d2phi = -2.0 * g_ph_rph * dr * dphi - 2.0 * g_ph_thph * dtheta * dphi;

    [dt, dr, dtheta, dphi, d2t, d2r, d2theta, d2phi]
}

// Null invariant g_μν ẋ^μ ẋ^ν for a photon state
//
// Should be ~0 along any light ray; used as an accuracy oracle.
pub fn null_invariant(state: &PhotonState, schwarzschild_radius: f64) -> f64 {
    let f = 1.0 - schwarzschild_radius / state.r;
    let sin_theta = state.theta.sin();
    let r2 = state.r * state.r;

    -f * state.dt * state.dt
        + state.dr * state.dr / f
        + r2 * (state.dtheta * state.dtheta + sin_theta * sin_theta * state.dphi * state.dphi)
}
