//! Vertex types and layouts for rendering.

use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat3, Mat4};
use procgen::{Material, MeshVertex};

/// Lit-geometry vertex: position and normal. Texture coordinates come from world XZ.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

impl From<MeshVertex> for Vertex {
    fn from(v: MeshVertex) -> Self {
        Self::new(v.position, v.normal)
    }
}

/// Per-draw data for the lit pipeline, fed as a one-instance vertex stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model matrix (4x4), column-major.
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's upper 3x3, one padded column per row.
    pub normal_matrix: [[f32; 4]; 3],
    /// Flat colour (rgb), alpha unused.
    pub color: [f32; 4],
    /// x = use texture (0 or 1), y = texture scale, zw unused.
    pub material: [f32; 4],
}

impl InstanceData {
    pub fn new(model: Mat4, normal_matrix: Mat3, material: &Material) -> Self {
        let n = normal_matrix.to_cols_array_2d();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: [
                [n[0][0], n[0][1], n[0][2], 0.0],
                [n[1][0], n[1][1], n[1][2], 0.0],
                [n[2][0], n[2][1], n[2][2], 0.0],
            ],
            color: material.color.extend(1.0).to_array(),
            material: [
                if material.texture.is_some() { 1.0 } else { 0.0 },
                material.tex_scale,
                0.0,
                0.0,
            ],
        }
    }

    /// Instance for geometry already in world space (ground, river).
    pub fn world(material: &Material) -> Self {
        Self::new(Mat4::IDENTITY, Mat3::IDENTITY, material)
    }

    pub fn from_transform(transform: &Transform, material: &Material) -> Self {
        Self::new(transform.to_matrix(), transform.normal_matrix(), material)
    }

    pub fn uses_texture(&self) -> bool {
        self.material[0] > 0.5
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ROW: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix columns
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: ROW,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: ROW * 2,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: ROW * 3,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix columns
                wgpu::VertexAttribute {
                    offset: ROW * 4,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: ROW * 5,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: ROW * 6,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: ROW * 7,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Material
                wgpu::VertexAttribute {
                    offset: ROW * 8,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self::world(&Material::flat(glam::Vec3::ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use procgen::{ROCK_MATERIAL, RIVER_MATERIAL};

    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::layout().array_stride, 24);
        assert_eq!(std::mem::size_of::<InstanceData>(), 144);
        let layout = InstanceData::layout();
        assert_eq!(layout.array_stride, 144);
        let last = layout.attributes.last().map(|a| a.offset);
        assert_eq!(last, Some(128));
    }

    #[test]
    fn material_flags_are_packed() {
        let textured = InstanceData::world(&RIVER_MATERIAL);
        assert!(textured.uses_texture());
        assert_eq!(textured.material[1], 2.5);

        let flat = InstanceData::world(&RIVER_MATERIAL.untextured());
        assert!(!flat.uses_texture());
        assert_eq!([flat.color[0], flat.color[1], flat.color[2]], [0.08, 0.35, 0.65]);
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let t = Transform::from_position_scale(Vec3::new(3.0, 0.4, -4.0), Vec3::new(1.6, 0.8, 1.2));
        let inst = InstanceData::from_transform(&t, &ROCK_MATERIAL);
        assert_eq!([inst.model[3][0], inst.model[3][1], inst.model[3][2]], [3.0, 0.4, -4.0]);
        for col in inst.normal_matrix {
            assert_eq!(col[3], 0.0);
        }
        assert!((inst.normal_matrix[1][1] - 1.0 / 0.8).abs() < 1e-5);
    }
}
