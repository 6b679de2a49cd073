//! The landscape draw list and the lit scene pass.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use engine_core::LightState;
use procgen::{
    GroundConfig, GroundMesh, HeightField, RiverConfig, RiverMesh, Scenery, SurfaceTexture, CROWN_MATERIAL,
    GROUND_MATERIAL, RIVER_MATERIAL, ROCK_MATERIAL, TRUNK_MATERIAL,
};
use wgpu::util::DeviceExt;

use crate::camera::{Camera, SceneUniform};
use crate::mesh::{Mesh, MeshTopology};
use crate::pipeline::{create_lit_pipeline, create_sampled_texture_bind_group_layout, create_scene_bind_group_layout};
use crate::render_target::{RenderTargets, TargetId};
use crate::texture::{MipmapGenerator, Texture, TextureSlot};
use crate::vertex::InstanceData;

/// Which static mesh a draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Ground,
    River,
    Cube,
}

/// One draw call: a mesh, its single instance and the texture it samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshKind,
    pub instance: InstanceData,
    pub texture: Option<SurfaceTexture>,
}

impl DrawItem {
    fn new(mesh: MeshKind, instance: InstanceData, texture: Option<SurfaceTexture>) -> Self {
        Self {
            mesh,
            instance,
            texture,
        }
    }
}

/// Draws in frame order: ground (flat prepass when enabled, then textured),
/// river, each tree's trunk and crown layers, then rocks.
pub fn build_draw_list(scenery: &Scenery, ground_flat_prepass: bool) -> Vec<DrawItem> {
    let mut items = Vec::with_capacity(3 + scenery.box_count());

    if ground_flat_prepass {
        let flat = GROUND_MATERIAL.untextured();
        items.push(DrawItem::new(MeshKind::Ground, InstanceData::world(&flat), None));
    }
    items.push(DrawItem::new(
        MeshKind::Ground,
        InstanceData::world(&GROUND_MATERIAL),
        GROUND_MATERIAL.texture,
    ));
    items.push(DrawItem::new(
        MeshKind::River,
        InstanceData::world(&RIVER_MATERIAL),
        RIVER_MATERIAL.texture,
    ));

    for tree in &scenery.trees {
        items.push(DrawItem::new(
            MeshKind::Cube,
            InstanceData::from_transform(&tree.trunk_transform(), &TRUNK_MATERIAL),
            TRUNK_MATERIAL.texture,
        ));
        for crown in tree.crown_transforms() {
            items.push(DrawItem::new(
                MeshKind::Cube,
                InstanceData::from_transform(&crown, &CROWN_MATERIAL),
                CROWN_MATERIAL.texture,
            ));
        }
    }

    for rock in &scenery.rocks {
        items.push(DrawItem::new(
            MeshKind::Cube,
            InstanceData::from_transform(&rock.transform(), &ROCK_MATERIAL),
            ROCK_MATERIAL.texture,
        ));
    }

    items
}

/// Drop the texture from draws whose image failed to load, so they render flat.
pub fn strip_unbound_textures(items: &mut [DrawItem], is_bound: impl Fn(SurfaceTexture) -> bool) {
    for item in items.iter_mut() {
        if item.texture.is_some_and(|t| !is_bound(t)) {
            item.texture = None;
            item.instance.material[0] = 0.0;
        }
    }
}

/// Scene content and asset location.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub texture_dir: PathBuf,
    /// Draw the ground untextured first, then textured on top.
    pub ground_flat_prepass: bool,
    pub height_field: HeightField,
    pub ground: GroundConfig,
    pub river: RiverConfig,
    pub scenery: Scenery,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("textures"),
            ground_flat_prepass: true,
            height_field: HeightField::default(),
            ground: GroundConfig::default(),
            river: RiverConfig::default(),
            scenery: Scenery::default_landscape(),
        }
    }
}

/// Owns the scene geometry, textures and lit pipelines, and records the scene pass.
pub struct SceneRenderer {
    list_pipeline: wgpu::RenderPipeline,
    strip_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    texture_slots: HashMap<SurfaceTexture, TextureSlot>,
    texture_bind_groups: HashMap<SurfaceTexture, wgpu::BindGroup>,
    /// White pixel bound for untextured draws.
    untextured_bind_group: wgpu::BindGroup,
    _white: Texture,
    ground: Mesh,
    river: Mesh,
    cube: Mesh,
    draws: Vec<DrawItem>,
    instance_buffer: wgpu::Buffer,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: &SceneConfig) -> Result<Self> {
        let scene_layout = create_scene_bind_group_layout(device);
        let texture_layout = create_sampled_texture_bind_group_layout(device, "Surface Texture");
        let list_pipeline = create_lit_pipeline(device, &scene_layout, &texture_layout, MeshTopology::TriangleList.primitive());
        let strip_pipeline = create_lit_pipeline(device, &scene_layout, &texture_layout, MeshTopology::TriangleStrip.primitive());

        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform"),
            contents: bytemuck::bytes_of(&SceneUniform::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group = |texture: &Texture, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            })
        };

        let white = Texture::white_pixel(device, queue)?;
        let untextured_bind_group = texture_bind_group(&white, "Untextured Bind Group");

        let mipmaps = MipmapGenerator::new(device);
        let mut texture_slots = HashMap::new();
        let mut texture_bind_groups = HashMap::new();
        for surface in SurfaceTexture::ALL {
            let slot = TextureSlot::load(device, queue, &mipmaps, &config.texture_dir.join(surface.file_name()));
            if let Some(texture) = slot.texture() {
                texture_bind_groups.insert(surface, texture_bind_group(texture, surface.file_name()));
            }
            texture_slots.insert(surface, slot);
        }

        let ground = Mesh::ground(device, &GroundMesh::generate(&config.ground, &config.height_field));
        let river = Mesh::river(device, &RiverMesh::generate(&config.river, &config.height_field));
        let cube = Mesh::cube(device);

        let mut draws = build_draw_list(&config.scenery, config.ground_flat_prepass);
        strip_unbound_textures(&mut draws, |t| texture_slots.get(&t).is_some_and(TextureSlot::is_bound));
        let instances: Vec<InstanceData> = draws.iter().map(|d| d.instance).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!(
            "Scene ready: {} draws, ground {} triangles, river {} vertices",
            draws.len(),
            ground.num_indices / 3,
            river.num_vertices
        );

        Ok(Self {
            list_pipeline,
            strip_pipeline,
            scene_buffer,
            scene_bind_group,
            texture_slots,
            texture_bind_groups,
            untextured_bind_group,
            _white: white,
            ground,
            river,
            cube,
            draws,
            instance_buffer,
        })
    }

    /// Upload the camera and light for this frame.
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera, light: &LightState) {
        let uniform = SceneUniform::new(camera, light.position(), light.color);
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn draws(&self) -> &[DrawItem] {
        &self.draws
    }

    pub fn is_texture_bound(&self, texture: SurfaceTexture) -> bool {
        self.texture_slots.get(&texture).is_some_and(TextureSlot::is_bound)
    }

    fn mesh(&self, kind: MeshKind) -> &Mesh {
        match kind {
            MeshKind::Ground => &self.ground,
            MeshKind::River => &self.river,
            MeshKind::Cube => &self.cube,
        }
    }

    /// Clear the main target to white (depth to 1) and draw the landscape into it.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, targets: &RenderTargets) {
        let main = targets.get(TargetId::Main);
        let Some(depth_view) = main.depth_view() else {
            log::error!("{} has no depth attachment, skipping scene pass", TargetId::Main);
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: main.color_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        let mut bound_topology = None;
        for (i, item) in self.draws.iter().enumerate() {
            let mesh = self.mesh(item.mesh);
            if bound_topology != Some(mesh.topology) {
                pass.set_pipeline(match mesh.topology {
                    MeshTopology::TriangleList => &self.list_pipeline,
                    MeshTopology::TriangleStrip => &self.strip_pipeline,
                });
                bound_topology = Some(mesh.topology);
            }
            let bind_group = item
                .texture
                .and_then(|t| self.texture_bind_groups.get(&t))
                .unwrap_or(&self.untextured_bind_group);
            pass.set_bind_group(1, bind_group, &[]);
            let instance = i as u32;
            mesh.draw(&mut pass, instance..instance + 1);
        }
    }
}
