//! Procedural generation for the landscape: height field, terrain grid,
//! river ribbon and hand-placed scenery.

pub mod heightfield;
pub mod river;
pub mod scenery;
pub mod terrain;

pub use heightfield::*;
pub use river::*;
pub use scenery::*;
pub use terrain::*;

/// Vertex produced by the mesh builders (position + normal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}
