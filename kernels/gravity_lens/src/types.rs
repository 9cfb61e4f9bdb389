// Schwarzschild black hole model and the weak-field deflection law

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LensError;

// ============================================================================
// PHYSICAL CONSTANTS
// ============================================================================

// Gravitational constant (m³/kg·s²)
pub const G: f64 = 6.674e-11;

// Speed of light (m/s)
pub const C: f64 = 299_792_458.0;

// Solar mass (kg)
pub const SOLAR_MASS: f64 = 1.989e30;

// ============================================================================
// BLACK HOLE DEFINITION
// ============================================================================

// A non-rotating (Schwarzschild) black hole of given mass
//
// Physics: The mass is the only free parameter. Everything else follows
// from it - the event horizon sits at the Schwarzschild radius
// r_s = 2GM/c², and a light ray passing at impact parameter b is bent by
// approximately 4GM/(c²b) in the weak-field limit.
//
// The value is immutable: changing the mass means constructing a new
// black hole, so the derived radius can never go stale.
#[derive(Debug, Clone, Copy)]
pub struct BlackHole {
    // Mass in solar masses, as supplied by the caller
    pub mass_solar: f64,

    // Mass in kilograms
    pub mass_kg: f64,

    // Schwarzschild radius r_s = 2GM/c² (meters)
    // Strictly positive, linear in mass
    pub schwarzschild_radius: f64,
}

impl BlackHole {
    // Build a black hole from a mass in solar masses
    //
    // Rejects non-positive and non-finite masses: a zero, negative or NaN
    // radius would poison every downstream computation.
    pub fn new(mass_solar: f64) -> Result<Self, LensError> {
        if !mass_solar.is_finite() || mass_solar <= 0.0 {
            return Err(LensError::InvalidMass(mass_solar));
        }

        let mass_kg = mass_solar * SOLAR_MASS;
        let schwarzschild_radius = 2.0 * G * mass_kg / (C * C);

        Ok(Self {
            mass_solar,
            mass_kg,
            schwarzschild_radius,
        })
    }

    // Weak-field deflection angle for a ray with impact parameter b (meters)
    //
    // Math: Einstein's small-angle formula α = 4GM/(c²b), exact only in the
    // limit b ≫ r_s.
    //
    // A ray with b below the Schwarzschild radius is captured; the
    // returned INFINITY is the capture sentinel, never a finite wrong
    // value. Smaller impact parameter always means larger (or equal)
    // deflection.
    pub fn weak_field_deflection(&self, impact_parameter: f64) -> f64 {
        if impact_parameter < self.schwarzschild_radius {
            return f64::INFINITY;
        }

        4.0 * G * self.mass_kg / (C * C * impact_parameter)
    }
}

// ============================================================================
// LENSING METHOD
// ============================================================================

// Which deflection model drives a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensMethod {
    // Closed-form weak-field law evaluated per pixel (fast)
    Weak,

    // Full geodesic integration sampled at radial bins and interpolated
    // (slower, meaningful near the photon sphere)
    Geodesic,
}

impl LensMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Geodesic => "geodesic",
        }
    }
}

impl FromStr for LensMethod {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, LensError> {
        match s.to_ascii_lowercase().as_str() {
            "weak" => Ok(Self::Weak),
            "geodesic" => Ok(Self::Geodesic),
            _ => Err(LensError::UnknownMethod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_linear_in_mass() {
        let one = BlackHole::new(1.0).unwrap();
        let ten = BlackHole::new(10.0).unwrap();
        let rel = (ten.schwarzschild_radius - 10.0 * one.schwarzschild_radius).abs()
            / ten.schwarzschild_radius;
        assert!(rel < 1e-12, "radius must scale linearly with mass");
    }

    #[test]
    fn test_radius_for_ten_solar_masses() {
        // 2 * 6.674e-11 * 10 * 1.989e30 / c² ≈ 29.54 km
        let bh = BlackHole::new(10.0).unwrap();
        let km = bh.schwarzschild_radius / 1000.0;
        assert!(km > 29.5 && km < 29.6, "expected ~29.5 km, got {km}");
    }

    #[test]
    fn test_invalid_mass_rejected() {
        assert!(matches!(BlackHole::new(0.0), Err(LensError::InvalidMass(_))));
        assert!(matches!(BlackHole::new(-5.0), Err(LensError::InvalidMass(_))));
        assert!(matches!(
            BlackHole::new(f64::NAN),
            Err(LensError::InvalidMass(_))
        ));
    }

    #[test]
    fn test_weak_field_two_over_k() {
        // At b = k·r_s the deflection is exactly 2/k radians, mass-independent
        for mass in [1.0, 10.0, 1e6] {
            let bh = BlackHole::new(mass).unwrap();
            for k in [1.0, 2.0, 100.0] {
                let alpha = bh.weak_field_deflection(k * bh.schwarzschild_radius);
                assert!(
                    (alpha - 2.0 / k).abs() < 1e-12,
                    "mass {mass}, k {k}: got {alpha}"
                );
            }
        }
    }

    #[test]
    fn test_weak_field_decreasing_in_b() {
        let bh = BlackHole::new(10.0).unwrap();
        let rs = bh.schwarzschild_radius;
        let mut prev = f64::INFINITY;
        for k in 1..200 {
            let alpha = bh.weak_field_deflection(k as f64 * rs);
            assert!(alpha < prev, "deflection must strictly decrease in b");
            prev = alpha;
        }
    }

    #[test]
    fn test_weak_field_capture_sentinel() {
        let bh = BlackHole::new(10.0).unwrap();
        let alpha = bh.weak_field_deflection(0.5 * bh.schwarzschild_radius);
        assert!(alpha.is_infinite());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("weak".parse::<LensMethod>().unwrap(), LensMethod::Weak);
        assert_eq!(
            "GEODESIC".parse::<LensMethod>().unwrap(),
            LensMethod::Geodesic
        );
        assert!(matches!(
            "strong".parse::<LensMethod>(),
            Err(LensError::UnknownMethod(_))
        ));
    }
}
