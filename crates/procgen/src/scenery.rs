//! Hand-placed trees and rocks, plus the surface materials every scene object uses.

use engine_core::Transform;
use glam::Vec3;

/// Image textures the landscape draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTexture {
    Grass,
    Water,
    Rock,
    Bark,
    Leaves,
}

impl SurfaceTexture {
    pub const ALL: [SurfaceTexture; 5] = [
        SurfaceTexture::Grass,
        SurfaceTexture::Water,
        SurfaceTexture::Rock,
        SurfaceTexture::Bark,
        SurfaceTexture::Leaves,
    ];

    /// File name looked up inside the texture directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SurfaceTexture::Grass => "grass.jpg",
            SurfaceTexture::Water => "water.jpg",
            SurfaceTexture::Rock => "rock.jpg",
            SurfaceTexture::Bark => "bark.jpg",
            SurfaceTexture::Leaves => "leaves.jpg",
        }
    }
}

/// Flat colour, optionally modulated by a world-XZ projected texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub texture: Option<SurfaceTexture>,
    /// Texture repeats per world unit.
    pub tex_scale: f32,
}

impl Material {
    pub const fn flat(color: Vec3) -> Self {
        Self {
            color,
            texture: None,
            tex_scale: 1.0,
        }
    }

    pub const fn textured(color: Vec3, texture: SurfaceTexture, tex_scale: f32) -> Self {
        Self {
            color,
            texture: Some(texture),
            tex_scale,
        }
    }

    /// Same colour without the texture.
    pub fn untextured(self) -> Self {
        Self::flat(self.color)
    }
}

pub const GROUND_MATERIAL: Material =
    Material::textured(Vec3::new(0.15, 0.55, 0.18), SurfaceTexture::Grass, 2.5);
pub const RIVER_MATERIAL: Material =
    Material::textured(Vec3::new(0.08, 0.35, 0.65), SurfaceTexture::Water, 2.5);
pub const TRUNK_MATERIAL: Material =
    Material::textured(Vec3::new(0.35, 0.22, 0.12), SurfaceTexture::Bark, 2.5);
pub const CROWN_MATERIAL: Material =
    Material::textured(Vec3::new(0.10, 0.45, 0.12), SurfaceTexture::Leaves, 1.5);
pub const ROCK_MATERIAL: Material =
    Material::textured(Vec3::new(0.45, 0.45, 0.48), SurfaceTexture::Rock, 1.0);

/// Number of stacked crown boxes per tree.
pub const CROWN_LAYERS: usize = 3;

/// A box trunk topped by shrinking stacked crown boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePlacement {
    /// Base of the trunk.
    pub position: Vec3,
    pub trunk_height: f32,
    pub crown_size: f32,
}

impl TreePlacement {
    pub const fn new(position: Vec3, trunk_height: f32, crown_size: f32) -> Self {
        Self {
            position,
            trunk_height,
            crown_size,
        }
    }

    pub fn trunk_transform(&self) -> Transform {
        Transform::from_position_scale(
            self.position + Vec3::new(0.0, self.trunk_height * 0.5, 0.0),
            Vec3::new(0.4, self.trunk_height, 0.4),
        )
    }

    /// Crown layers bottom-up. Layer `i` sits at `trunk_height + i·crown·0.45`
    /// and is `crown·(1 - 0.18·i)` wide.
    pub fn crown_transforms(&self) -> [Transform; CROWN_LAYERS] {
        std::array::from_fn(|i| {
            let i = i as f32;
            let y = self.trunk_height + i * (self.crown_size * 0.45);
            let s = self.crown_size * (1.0 - 0.18 * i);
            Transform::from_position_scale(self.position + Vec3::new(0.0, y, 0.0), Vec3::splat(s))
        })
    }
}

/// A scaled box resting on its base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RockPlacement {
    pub position: Vec3,
    pub scale: Vec3,
}

impl RockPlacement {
    pub const fn new(position: Vec3, scale: Vec3) -> Self {
        Self { position, scale }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_scale(
            self.position + Vec3::new(0.0, self.scale.y * 0.5, 0.0),
            self.scale,
        )
    }
}

/// All hand-placed scenery, in draw order.
#[derive(Debug, Clone, Default)]
pub struct Scenery {
    pub trees: Vec<TreePlacement>,
    pub rocks: Vec<RockPlacement>,
}

impl Scenery {
    /// The grove north of the river bend and its three rocks.
    pub fn default_landscape() -> Self {
        let trees = vec![
            TreePlacement::new(Vec3::new(-3.0, 0.0, -4.0), 2.6, 1.8),
            TreePlacement::new(Vec3::new(-1.2, 0.0, -5.5), 3.2, 2.2),
            TreePlacement::new(Vec3::new(1.0, 0.0, -4.2), 2.8, 2.0),
            TreePlacement::new(Vec3::new(2.6, 0.0, -5.0), 2.4, 1.7),
            TreePlacement::new(Vec3::new(0.5, 0.0, -6.8), 2.9, 2.0),
            TreePlacement::new(Vec3::new(-2.2, 0.0, -6.3), 2.5, 1.8),
        ];
        let rocks = vec![
            RockPlacement::new(Vec3::new(3.0, 0.0, -4.0), Vec3::new(1.6, 0.8, 1.2)),
            RockPlacement::new(Vec3::new(5.0, 0.0, -3.0), Vec3::new(0.9, 0.6, 0.7)),
            RockPlacement::new(Vec3::new(-8.0, 0.0, 2.0), Vec3::new(1.2, 0.7, 1.1)),
        ];
        Self { trees, rocks }
    }

    /// Box draws this scenery needs: one trunk plus crowns per tree, one per rock.
    pub fn box_count(&self) -> usize {
        self.trees.len() * (1 + CROWN_LAYERS) + self.rocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_landscape_has_six_trees_and_three_rocks() {
        let scenery = Scenery::default_landscape();
        assert_eq!(scenery.trees.len(), 6);
        assert_eq!(scenery.rocks.len(), 3);
        assert_eq!(scenery.box_count(), 27);
    }

    #[test]
    fn trunk_rests_on_its_base() {
        let tree = TreePlacement::new(Vec3::new(-3.0, 0.0, -4.0), 2.6, 1.8);
        let m = tree.trunk_transform().to_matrix();
        let bottom = m.transform_point3(Vec3::new(0.0, -0.5, 0.0));
        let top = m.transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert!((bottom - tree.position).length() < 1e-5);
        assert!((top.y - 2.6).abs() < 1e-5);
    }

    #[test]
    fn crowns_stack_upward_and_shrink() {
        let tree = TreePlacement::new(Vec3::ZERO, 3.2, 2.2);
        let crowns = tree.crown_transforms();
        assert!((crowns[0].position.y - 3.2).abs() < 1e-6);
        assert!((crowns[1].position.y - (3.2 + 0.99)).abs() < 1e-5);
        assert!((crowns[2].scale.x - 2.2 * 0.64).abs() < 1e-5);
        for pair in crowns.windows(2) {
            assert!(pair[1].position.y > pair[0].position.y);
            assert!(pair[1].scale.x < pair[0].scale.x);
        }
    }

    #[test]
    fn rock_bottom_touches_ground_plane() {
        for rock in Scenery::default_landscape().rocks {
            let bottom = rock.transform().to_matrix().transform_point3(Vec3::new(0.0, -0.5, 0.0));
            assert!(bottom.y.abs() < 1e-6);
        }
    }

    #[test]
    fn untextured_keeps_colour() {
        let m = GROUND_MATERIAL.untextured();
        assert_eq!(m.texture, None);
        assert_eq!(m.color, GROUND_MATERIAL.color);
    }

    #[test]
    fn texture_names_are_unique() {
        let names: std::collections::HashSet<_> =
            SurfaceTexture::ALL.iter().map(|t| t.file_name()).collect();
        assert_eq!(names.len(), SurfaceTexture::ALL.len());
    }
}
