//! Ground grid generation over the height field.

use crate::heightfield::HeightField;
use crate::MeshVertex;

/// Configuration for the ground grid.
#[derive(Debug, Clone)]
pub struct GroundConfig {
    /// Number of vertices per side (N). Values below 2 are raised to 2.
    pub resolution: u32,
    /// Size of the square in world units, centred on the origin.
    pub size: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            resolution: 120,
            size: 40.0,
        }
    }
}

/// Indexed triangle-list grid: N×N vertices, 2·(N-1)² triangles.
#[derive(Debug, Clone)]
pub struct GroundMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub resolution: u32,
}

impl GroundMesh {
    /// Generate the grid spanning `[-size/2, size/2]²` in world X/Z with Y from `field`.
    ///
    /// Each cell is split as `(i0, i2, i1)` then `(i1, i2, i3)` with row-major
    /// `i0 = z·N + x`, `i1 = i0 + 1`, `i2 = i0 + N`, `i3 = i2 + 1`, which is
    /// counter-clockwise seen from above.
    pub fn generate(config: &GroundConfig, field: &HeightField) -> Self {
        if config.resolution < 2 {
            log::warn!("Ground resolution {} raised to 2", config.resolution);
        }
        let n = config.resolution.max(2);
        let res = n as usize;
        let half = config.size * 0.5;

        let mut vertices = Vec::with_capacity(res * res);
        for z in 0..res {
            for x in 0..res {
                let u = x as f32 / (n - 1) as f32;
                let v = z as f32 / (n - 1) as f32;
                let world_x = -half + u * config.size;
                let world_z = -half + v * config.size;

                let sample = field.sample(world_x, world_z);
                vertices.push(MeshVertex {
                    position: [world_x, sample.height, world_z],
                    normal: sample.normal.to_array(),
                });
            }
        }

        let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
        for z in 0..(n - 1) {
            for x in 0..(n - 1) {
                let i0 = z * n + x;
                let i1 = i0 + 1;
                let i2 = i0 + n;
                let i3 = i2 + 1;

                indices.extend_from_slice(&[i0, i2, i1]);
                indices.extend_from_slice(&[i1, i2, i3]);
            }
        }

        log::debug!(
            "Ground mesh: {} vertices, {} triangles",
            vertices.len(),
            indices.len() / 3
        );

        Self {
            vertices,
            indices,
            resolution: n,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
