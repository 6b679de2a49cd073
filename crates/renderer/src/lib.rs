//! wgpu rendering for the landscape viewer: scene geometry, offscreen targets
//! and the bright/blur/composite post chain.

pub mod camera;
pub mod mesh;
pub mod pipeline;
pub mod post;
pub mod render_target;
pub mod renderer;
pub mod scene;
pub mod screenshot;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use mesh::*;
pub use pipeline::*;
pub use post::*;
pub use render_target::*;
pub use renderer::*;
pub use scene::*;
pub use screenshot::*;
pub use texture::*;
pub use vertex::*;
