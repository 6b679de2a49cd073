//! Bright pass, ping-pong Gaussian blur and the grading composite.
//!
//! Each frame runs, in order: bright pass (main -> bright), `blur_passes`
//! alternating blur passes between the two ping-pong targets, then the
//! composite into the swap-chain view.

use bytemuck::{Pod, Zeroable};
use engine_core::PostProcessParams;
use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::pipeline::{
    create_blur_bind_group_layout, create_blur_pipeline, create_bright_bind_group_layout,
    create_bright_pipeline, create_composite_bind_group_layout, create_composite_pipeline,
};
use crate::render_target::{RenderTargets, TargetId};

/// Centre, ±1 and ±2 tap weights of the separable blur.
pub const BLUR_WEIGHTS: [f32; 3] = [0.227027, 0.1945946, 0.1216216];

/// Rec. 709 luma coefficients.
pub const LUMA: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Where a blur pass reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurSource {
    Bright,
    PingPong(usize),
}

impl BlurSource {
    pub fn target(self) -> TargetId {
        match self {
            BlurSource::Bright => TargetId::Bright,
            BlurSource::PingPong(i) => TargetId::ping_pong(i),
        }
    }
}

/// One blur pass: read `source`, write ping-pong `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurStep {
    pub source: BlurSource,
    pub target: usize,
    pub horizontal: bool,
}

/// The blur passes for one frame. The first pass is horizontal and reads the
/// bright target; every later pass reads what the previous one wrote.
pub fn blur_schedule(passes: u32) -> Vec<BlurStep> {
    let mut steps = Vec::with_capacity(passes as usize);
    let mut horizontal = true;
    for i in 0..passes {
        let target = if horizontal { 0 } else { 1 };
        let source = if i == 0 {
            BlurSource::Bright
        } else {
            BlurSource::PingPong(1 - target)
        };
        steps.push(BlurStep {
            source,
            target,
            horizontal,
        });
        horizontal = !horizontal;
    }
    steps
}

/// Target holding the finished bloom: ping-pong 1 after an even pass count,
/// 0 after an odd one, the bright target itself when there is no blur.
pub fn final_blur_source(passes: u32) -> BlurSource {
    match passes {
        0 => BlurSource::Bright,
        n if n % 2 == 0 => BlurSource::PingPong(1),
        _ => BlurSource::PingPong(0),
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BrightUniform {
    pub threshold: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BlurUniform {
    /// 1 / target size.
    pub texel_size: [f32; 2],
    /// 1 = horizontal, 0 = vertical.
    pub horizontal: f32,
    pub _pad: f32,
}

impl BlurUniform {
    pub fn new(width: u32, height: u32, horizontal: bool) -> Self {
        Self {
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            horizontal: if horizontal { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }
}

/// Must match `PostParams` in composite.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    pub exposure: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub vignette: f32,
    pub vignette_softness: f32,
    pub bloom_enabled: f32,
    pub bloom_strength: f32,
}

impl From<&PostProcessParams> for PostUniform {
    fn from(p: &PostProcessParams) -> Self {
        Self {
            exposure: p.exposure,
            brightness: p.brightness,
            contrast: p.contrast,
            saturation: p.saturation,
            vignette: p.vignette,
            vignette_softness: p.vignette_softness,
            bloom_enabled: if p.bloom_enabled { 1.0 } else { 0.0 },
            bloom_strength: p.bloom_strength,
        }
    }
}

pub fn luma(color: Vec3) -> f32 {
    color.dot(LUMA)
}

/// GLSL/WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// CPU mirror of bright.wgsl.
pub fn bright_pass_reference(color: Vec3, threshold: f32) -> Vec3 {
    if luma(color) > threshold {
        color
    } else {
        Vec3::ZERO
    }
}

/// CPU mirror of composite.wgsl for one pixel at `uv`.
pub fn composite_reference(scene: Vec3, bloom: Vec3, uv: Vec2, params: &PostProcessParams) -> Vec3 {
    let mut color = scene * params.exposure.exp2();
    color += Vec3::splat(params.brightness);
    color = (color - 0.5) * params.contrast + 0.5;
    let grey = Vec3::splat(luma(color));
    color = grey.lerp(color, params.saturation);
    let dist = uv.distance(Vec2::splat(0.5));
    color *= 1.0 - params.vignette * smoothstep(0.707 - params.vignette_softness, 0.707, dist);
    if params.bloom_enabled {
        color += bloom * params.bloom_strength;
    }
    color
}

/// GPU state for the three post stages.
pub struct PostProcessPipeline {
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bright_bind_group_layout: wgpu::BindGroupLayout,
    blur_bind_group_layout: wgpu::BindGroupLayout,
    composite_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bright_uniform_buffer: wgpu::Buffer,
    blur_uniform_h: wgpu::Buffer,
    blur_uniform_v: wgpu::Buffer,
    composite_uniform_buffer: wgpu::Buffer,
    blur_passes: u32,
}

impl PostProcessPipeline {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, blur_passes: u32) -> Self {
        let bright_bind_group_layout = create_bright_bind_group_layout(device);
        let blur_bind_group_layout = create_blur_bind_group_layout(device);
        let composite_bind_group_layout = create_composite_bind_group_layout(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let defaults = PostProcessParams::default();
        let bright_uniform_buffer = uniform(
            "Bright Uniform",
            bytemuck::bytes_of(&BrightUniform {
                threshold: defaults.bloom_threshold,
                _pad: [0.0; 3],
            }),
        );
        let blur_uniform_h = uniform("Blur Uniform H", bytemuck::bytes_of(&BlurUniform::new(1, 1, true)));
        let blur_uniform_v = uniform("Blur Uniform V", bytemuck::bytes_of(&BlurUniform::new(1, 1, false)));
        let composite_uniform_buffer = uniform("Composite Uniform", bytemuck::bytes_of(&PostUniform::from(&defaults)));

        Self {
            bright_pipeline: create_bright_pipeline(device, &bright_bind_group_layout),
            blur_pipeline: create_blur_pipeline(device, &blur_bind_group_layout),
            composite_pipeline: create_composite_pipeline(device, &composite_bind_group_layout, output_format),
            bright_bind_group_layout,
            blur_bind_group_layout,
            composite_bind_group_layout,
            sampler,
            bright_uniform_buffer,
            blur_uniform_h,
            blur_uniform_v,
            composite_uniform_buffer,
            blur_passes,
        }
    }

    /// Upload this frame's parameters and the blur texel size for a `width`x`height` target.
    pub fn prepare(&self, queue: &wgpu::Queue, params: &PostProcessParams, width: u32, height: u32) {
        let bright = BrightUniform {
            threshold: params.bloom_threshold,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.bright_uniform_buffer, 0, bytemuck::bytes_of(&bright));
        queue.write_buffer(&self.blur_uniform_h, 0, bytemuck::bytes_of(&BlurUniform::new(width, height, true)));
        queue.write_buffer(&self.blur_uniform_v, 0, bytemuck::bytes_of(&BlurUniform::new(width, height, false)));
        queue.write_buffer(&self.composite_uniform_buffer, 0, bytemuck::bytes_of(&PostUniform::from(params)));
    }

    fn filter_bind_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        source: &wgpu::TextureView,
        uniform: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        })
    }

    fn fullscreen_pass(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        view: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Encode the bright, blur and composite passes. Bind groups are built here
    /// every frame so they always see the targets' current storage.
    pub fn run(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        output_view: &wgpu::TextureView,
    ) {
        let bright_view = targets.get(TargetId::Bright).color_view();

        let bright_bind = self.filter_bind_group(
            device,
            "Bright Bind Group",
            &self.bright_bind_group_layout,
            targets.get(TargetId::Main).color_view(),
            &self.bright_uniform_buffer,
        );
        Self::fullscreen_pass(encoder, "Bright Pass", bright_view, &self.bright_pipeline, &bright_bind);

        for step in blur_schedule(self.blur_passes) {
            let (label, uniform) = if step.horizontal {
                ("Blur H Pass", &self.blur_uniform_h)
            } else {
                ("Blur V Pass", &self.blur_uniform_v)
            };
            let source = targets.get(step.source.target()).color_view();
            let bind = self.filter_bind_group(device, "Blur Bind Group", &self.blur_bind_group_layout, source, uniform);
            let target = targets.get(TargetId::ping_pong(step.target)).color_view();
            Self::fullscreen_pass(encoder, label, target, &self.blur_pipeline, &bind);
        }

        let bloom_view = targets.get(final_blur_source(self.blur_passes).target()).color_view();
        let composite_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.composite_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.get(TargetId::Main).color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.composite_uniform_buffer.as_entire_binding(),
                },
            ],
        });
        Self::fullscreen_pass(encoder, "Composite Pass", output_view, &self.composite_pipeline, &composite_bind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn ten_passes_end_in_ping_pong_one() {
        let steps = blur_schedule(10);
        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0].source, BlurSource::Bright);
        assert!(steps[0].horizontal);
        for pair in steps.windows(2) {
            // each pass reads what the previous one wrote, into the other target
            assert_eq!(pair[1].source, BlurSource::PingPong(pair[0].target));
            assert_ne!(pair[1].target, pair[0].target);
            assert_ne!(pair[1].horizontal, pair[0].horizontal);
        }
        let last = steps.last().map(|s| BlurSource::PingPong(s.target));
        assert_eq!(last, Some(BlurSource::PingPong(1)));
        assert_eq!(final_blur_source(10), BlurSource::PingPong(1));
    }

    #[test]
    fn final_target_alternates_with_pass_parity() {
        assert_eq!(final_blur_source(0), BlurSource::Bright);
        assert!(blur_schedule(0).is_empty());
        for passes in 1..12 {
            let last = blur_schedule(passes).last().map(|s| s.target);
            let expected = if passes % 2 == 0 { 1 } else { 0 };
            assert_eq!(last, Some(expected));
            assert_eq!(final_blur_source(passes), BlurSource::PingPong(expected));
        }
    }

    #[test]
    fn neutral_composite_is_identity() {
        let params = PostProcessParams::neutral();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let scene = Vec3::new(rng.gen(), rng.gen(), rng.gen()) * 4.0;
            let bloom = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            let uv = Vec2::new(rng.gen(), rng.gen());
            let out = composite_reference(scene, bloom, uv, &params);
            assert!((out - scene).abs().max_element() < 1e-5, "{scene} -> {out}");
        }
    }

    #[test]
    fn exposure_applies_before_brightness() {
        let params = PostProcessParams {
            exposure: 1.0,
            brightness: 0.25,
            ..PostProcessParams::neutral()
        };
        let out = composite_reference(Vec3::splat(0.25), Vec3::ZERO, Vec2::splat(0.5), &params);
        // (0.25 * 2) + 0.25, not (0.25 + 0.25) * 2
        assert!((out - Vec3::splat(0.75)).abs().max_element() < 1e-6);
    }

    #[test]
    fn vignette_darkens_corners_only() {
        let params = PostProcessParams {
            vignette: 1.0,
            vignette_softness: 0.35,
            ..PostProcessParams::neutral()
        };
        let scene = Vec3::splat(0.8);
        let centre = composite_reference(scene, Vec3::ZERO, Vec2::splat(0.5), &params);
        let corner = composite_reference(scene, Vec3::ZERO, Vec2::ZERO, &params);
        assert!((centre - scene).abs().max_element() < 1e-6);
        assert!(corner.max_element() < 0.01);
    }

    #[test]
    fn bloom_is_added_after_vignette() {
        let params = PostProcessParams {
            vignette: 1.0,
            bloom_enabled: true,
            bloom_strength: 0.5,
            ..PostProcessParams::neutral()
        };
        let out = composite_reference(Vec3::ZERO, Vec3::ONE, Vec2::ZERO, &params);
        assert!((out - Vec3::splat(0.5)).abs().max_element() < 1e-6);

        let off = PostProcessParams {
            bloom_enabled: false,
            ..params
        };
        assert_eq!(composite_reference(Vec3::ZERO, Vec3::ONE, Vec2::ZERO, &off), Vec3::ZERO);
    }

    #[test]
    fn saturation_zero_gives_luma_grey() {
        let params = PostProcessParams {
            saturation: 0.0,
            ..PostProcessParams::neutral()
        };
        let out = composite_reference(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec2::splat(0.5), &params);
        assert!((out - Vec3::splat(0.2126)).abs().max_element() < 1e-6);
    }

    #[test]
    fn bright_pass_is_strictly_above_threshold() {
        assert_eq!(bright_pass_reference(Vec3::ONE, 1.0), Vec3::ZERO);
        assert_eq!(bright_pass_reference(Vec3::splat(1.5), 1.0), Vec3::splat(1.5));
        assert_eq!(bright_pass_reference(Vec3::new(0.0, 0.0, 5.0), 1.0), Vec3::ZERO);
    }

    #[test]
    fn uniforms_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<BrightUniform>(), 16);
        assert_eq!(std::mem::size_of::<BlurUniform>(), 16);
        assert_eq!(std::mem::size_of::<PostUniform>(), 32);
        let blur = BlurUniform::new(800, 400, false);
        assert_eq!(blur.texel_size, [1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(blur.horizontal, 0.0);
    }

    #[test]
    fn default_params_enable_bloom_in_uniform() {
        let uniform = PostUniform::from(&PostProcessParams::default());
        assert_eq!(uniform.bloom_enabled, 1.0);
        assert_eq!(uniform.bloom_strength, 0.8);
        assert_eq!(uniform.vignette_softness, 0.35);
    }
}
