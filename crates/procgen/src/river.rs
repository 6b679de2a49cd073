//! River ribbon: a meandering strip draped over the height field.

use glam::{Vec2, Vec3};

use crate::heightfield::HeightField;
use crate::MeshVertex;

/// Shape of the river and its sampling along Z.
#[derive(Debug, Clone)]
pub struct RiverConfig {
    /// Samples along the centreline (S). Values below 2 are raised to 2.
    pub samples: u32,
    pub z_min: f32,
    pub z_max: f32,
    pub half_width: f32,
    /// Lift above the ground to avoid depth fighting.
    pub vertical_offset: f32,
    /// Meander amplitude in world X.
    pub amplitude: f32,
    /// Meander frequency along Z.
    pub frequency: f32,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            samples: 220,
            z_min: -18.0,
            z_max: 18.0,
            half_width: 1.6,
            vertical_offset: 0.03,
            amplitude: 3.0,
            frequency: 0.25,
        }
    }
}

impl RiverConfig {
    /// Centreline X at depth `z`.
    pub fn center_x(&self, z: f32) -> f32 {
        self.amplitude * (z * self.frequency).sin()
    }

    /// Analytic derivative dX/dZ of the centreline.
    pub fn center_dx_dz(&self, z: f32) -> f32 {
        self.amplitude * self.frequency * (z * self.frequency).cos()
    }

    /// Left and right edge points in world XZ at depth `z`.
    pub fn edges(&self, z: f32) -> (Vec2, Vec2) {
        let center = Vec2::new(self.center_x(z), z);
        let tangent = Vec2::new(self.center_dx_dz(z), 1.0).normalize();
        let perp = Vec2::new(-tangent.y, tangent.x);
        (
            center + perp * self.half_width,
            center - perp * self.half_width,
        )
    }
}

/// Triangle-strip river: vertex `2i` is the left edge, `2i + 1` the right edge of sample `i`.
#[derive(Debug, Clone)]
pub struct RiverMesh {
    pub vertices: Vec<MeshVertex>,
}

impl RiverMesh {
    pub fn generate(config: &RiverConfig, field: &HeightField) -> Self {
        if config.samples < 2 {
            log::warn!("River sample count {} raised to 2", config.samples);
        }
        let samples = config.samples.max(2);
        let up = Vec3::Y.to_array();

        let mut vertices = Vec::with_capacity(samples as usize * 2);
        for i in 0..samples {
            let t = i as f32 / (samples - 1) as f32;
            let z = config.z_min + t * (config.z_max - config.z_min);
            let (left, right) = config.edges(z);

            for edge in [left, right] {
                let y = field.height(edge.x, edge.y) + config.vertical_offset;
                vertices.push(MeshVertex {
                    position: [edge.x, y, edge.y],
                    normal: up,
                });
            }
        }

        log::debug!("River mesh: {} strip vertices", vertices.len());
        Self { vertices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// A strip of V vertices draws V - 2 triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_river() -> (RiverConfig, RiverMesh) {
        let config = RiverConfig {
            samples: 10,
            ..Default::default()
        };
        let mesh = RiverMesh::generate(&config, &HeightField::default());
        (config, mesh)
    }

    #[test]
    fn ten_samples_make_twenty_vertices() {
        let (_, mesh) = short_river();
        assert_eq!(mesh.vertex_count(), 20);
        assert_eq!(mesh.triangle_count(), 18);
    }

    #[test]
    fn edges_are_one_river_width_apart() {
        let (config, mesh) = short_river();
        for pair in mesh.vertices.chunks_exact(2) {
            let l = Vec2::new(pair[0].position[0], pair[0].position[2]);
            let r = Vec2::new(pair[1].position[0], pair[1].position[2]);
            assert!((l.distance(r) - 2.0 * config.half_width).abs() < 1e-4);
        }
    }

    #[test]
    fn river_sits_above_the_ground() {
        let field = HeightField::default();
        let config = RiverConfig::default();
        let mesh = RiverMesh::generate(&config, &field);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            assert!((y - field.height(x, z) - config.vertical_offset).abs() < 1e-6);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn centreline_meanders_with_its_derivative() {
        let config = RiverConfig::default();
        let h = 1e-3;
        for z in [-15.0, -4.0, 0.0, 2.5, 11.0] {
            let numeric = (config.center_x(z + h) - config.center_x(z - h)) / (2.0 * h);
            assert!((numeric - config.center_dx_dz(z)).abs() < 1e-2);
        }
        // Left edge sits on the -X side where the river runs straight along +Z.
        let (left, right) = config.edges(std::f32::consts::PI * 2.0);
        assert!(left.x < right.x);
    }

    #[test]
    fn span_covers_configured_range() {
        let (config, mesh) = short_river();
        let first_z = (mesh.vertices[0].position[2] + mesh.vertices[1].position[2]) * 0.5;
        let n = mesh.vertices.len();
        let last_z = (mesh.vertices[n - 2].position[2] + mesh.vertices[n - 1].position[2]) * 0.5;
        assert!((first_z - config.z_min).abs() < 1e-4);
        assert!((last_z - config.z_max).abs() < 1e-4);
    }
}
