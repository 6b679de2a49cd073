//! Placement transform for hand-placed scenery.

use glam::{Mat3, Mat4, Vec3};

/// Translation plus per-axis scale. Scenery is never rotated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a transform with position and scale.
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self { position, scale }
    }

    /// Create the model matrix for this transform (scale first, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(self.scale)
    }

    /// Inverse-transpose of the upper 3x3, for transforming normals under non-uniform scale.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.to_matrix()).inverse().transpose()
    }
}
