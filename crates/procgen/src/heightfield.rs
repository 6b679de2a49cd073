//! Analytic rolling-hills height field.
//!
//! Both the ground grid and the river edges sample the same field, so the river
//! sits flush with the terrain it is draped over.

use glam::Vec3;

/// Elevation and surface normal at a world (x, z) position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub height: f32,
    pub normal: Vec3,
}

/// `amplitude · sin(x·frequency) · cos(z·frequency)`, with normals from central differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightField {
    /// Hill height.
    pub amplitude: f32,
    /// Hill frequency (radians per world unit).
    pub frequency: f32,
    /// Finite-difference step for normal estimation.
    pub epsilon: f32,
}

impl Default for HeightField {
    fn default() -> Self {
        Self {
            amplitude: 0.35,
            frequency: 0.35,
            epsilon: 0.05,
        }
    }
}

impl HeightField {
    /// Elevation at (x, z). Always within `[-amplitude, amplitude]`.
    #[inline]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.amplitude * (x * self.frequency).sin() * (z * self.frequency).cos()
    }

    /// Unit surface normal at (x, z).
    pub fn normal(&self, x: f32, z: f32) -> Vec3 {
        let eps = self.epsilon;
        let h_l = self.height(x - eps, z);
        let h_r = self.height(x + eps, z);
        let h_d = self.height(x, z - eps);
        let h_u = self.height(x, z + eps);

        let dx = Vec3::new(2.0 * eps, h_r - h_l, 0.0);
        let dz = Vec3::new(0.0, h_u - h_d, 2.0 * eps);

        dz.cross(dx).normalize()
    }

    pub fn sample(&self, x: f32, z: f32) -> HeightSample {
        HeightSample {
            height: self.height(x, z),
            normal: self.normal(x, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn height_is_deterministic_and_bounded() {
        let field = HeightField::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let x = rng.gen_range(-500.0..500.0);
            let z = rng.gen_range(-500.0..500.0);
            let h = field.height(x, z);
            assert_eq!(h, field.height(x, z));
            assert!(h.abs() <= field.amplitude + 1e-6, "height {h} out of bounds at ({x}, {z})");
        }
    }

    #[test]
    fn normal_is_unit_length_and_points_up() {
        let field = HeightField::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let x = rng.gen_range(-1000.0..1000.0);
            let z = rng.gen_range(-1000.0..1000.0);
            let n = field.normal(x, z);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal {n:?} not unit at ({x}, {z})");
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn flat_field_has_vertical_normal() {
        let field = HeightField {
            amplitude: 0.0,
            ..Default::default()
        };
        assert!((field.normal(3.0, -7.0) - Vec3::Y).length() < 1e-6);
    }

    /// On a rising slope in +x the normal must lean back toward -x.
    #[test]
    fn normal_leans_against_slope() {
        let field = HeightField::default();
        // d/dx of sin(x f) at x = 0 is positive; cos(0) = 1.
        let n = field.normal(0.0, 0.0);
        assert!(n.x < 0.0);
        assert!(n.z.abs() < 1e-5);
    }
}
