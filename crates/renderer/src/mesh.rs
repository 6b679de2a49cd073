//! Mesh data structures and GPU upload.

use crate::vertex::Vertex;
use procgen::{GroundMesh, RiverMesh};
use std::ops::Range;
use wgpu::util::DeviceExt;

/// How a mesh's vertices assemble into triangles. Selects the pipeline it draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshTopology {
    /// Indexed triangle list.
    TriangleList,
    /// Unindexed triangle strip.
    TriangleStrip,
}

impl MeshTopology {
    pub fn primitive(self) -> wgpu::PrimitiveTopology {
        match self {
            MeshTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            MeshTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// A GPU mesh with a vertex buffer and, for triangle lists, an index buffer.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    pub num_vertices: u32,
    pub num_indices: u32,
    pub topology: MeshTopology,
}

impl Mesh {
    /// Create an indexed triangle-list mesh.
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer: Some(index_buffer),
            num_vertices: vertices.len() as u32,
            num_indices: indices.len() as u32,
            topology: MeshTopology::TriangleList,
        }
    }

    /// Create an unindexed triangle-strip mesh.
    pub fn strip(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            index_buffer: None,
            num_vertices: vertices.len() as u32,
            num_indices: 0,
            topology: MeshTopology::TriangleStrip,
        }
    }

    /// Create a unit cube centered at origin.
    pub fn cube(device: &wgpu::Device) -> Self {
        MeshData::cube().upload(device, "Cube")
    }

    /// Upload the generated ground grid.
    pub fn ground(device: &wgpu::Device, ground: &GroundMesh) -> Self {
        let vertices: Vec<Vertex> = ground.vertices.iter().copied().map(Vertex::from).collect();
        Self::new(device, "Ground", &vertices, &ground.indices)
    }

    /// Upload the river ribbon as a strip.
    pub fn river(device: &wgpu::Device, river: &RiverMesh) -> Self {
        let vertices: Vec<Vertex> = river.vertices.iter().copied().map(Vertex::from).collect();
        Self::strip(device, "River", &vertices)
    }

    /// Bind buffers and issue the draw. The instance stream must already be bound at slot 1.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, instances: Range<u32>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.num_indices, 0, instances);
            }
            None => pass.draw(0..self.num_vertices, instances),
        }
    }
}

/// Mesh data before GPU upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit cube centered at origin, 4 vertices per face so each face has a flat normal.
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
            Vertex::new([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
            // Back face
            Vertex::new([0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
            Vertex::new([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
            Vertex::new([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
            Vertex::new([0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
            // Top face
            Vertex::new([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
            Vertex::new([0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
            Vertex::new([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
            // Bottom face
            Vertex::new([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
            Vertex::new([0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
            Vertex::new([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
            // Right face
            Vertex::new([0.5, -0.5, 0.5], [1.0, 0.0, 0.0]),
            Vertex::new([0.5, -0.5, -0.5], [1.0, 0.0, 0.0]),
            Vertex::new([0.5, 0.5, -0.5], [1.0, 0.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]),
            // Left face
            Vertex::new([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0]),
            Vertex::new([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0]),
            Vertex::new([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0]),
        ];

        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0,       // Front
            4, 5, 6, 6, 7, 4,       // Back
            8, 9, 10, 10, 11, 8,    // Top
            12, 13, 14, 14, 15, 12, // Bottom
            16, 17, 18, 18, 19, 16, // Right
            20, 21, 22, 22, 23, 20, // Left
        ];

        Self { vertices, indices }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> Mesh {
        Mesh::new(device, label, &self.vertices, &self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_has_flat_outward_faces() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));

        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| cube.vertices[i as usize]);
            let normal = Vec3::from(a.normal);
            assert_eq!(a.normal, b.normal);
            assert_eq!(b.normal, c.normal);
            let centroid = (Vec3::from(a.position) + Vec3::from(b.position) + Vec3::from(c.position)) / 3.0;
            assert!(centroid.dot(normal) > 0.0);
            // counter-clockwise seen from outside
            let face = (Vec3::from(b.position) - Vec3::from(a.position))
                .cross(Vec3::from(c.position) - Vec3::from(a.position));
            assert!(face.dot(normal) > 0.0);
        }
    }

    #[test]
    fn topology_maps_to_wgpu() {
        assert_eq!(MeshTopology::TriangleList.primitive(), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(MeshTopology::TriangleStrip.primitive(), wgpu::PrimitiveTopology::TriangleStrip);
    }
}
