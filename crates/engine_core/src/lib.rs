//! Core types shared by the viewer's subsystems.
//!
//! This crate provides the foundational types used by input handling,
//! scene generation and rendering:
//! - Frame timing
//! - Placement transforms for hand-placed scenery
//! - Per-frame mutable state (post-process parameters, light state)

pub mod light;
pub mod params;
pub mod time;
pub mod transform;

pub use light::*;
pub use params::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
