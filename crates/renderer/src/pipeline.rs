//! Bind group layouts and render pipeline factories.

use crate::render_target::HDR_FORMAT;
use crate::texture::Texture;
use crate::vertex::{InstanceData, Vertex};

/// Shared fullscreen-triangle vertex stage, prepended to every post shader.
const FULLSCREEN_SHADER: &str = include_str!("shaders/fullscreen.wgsl");
const LIT_SHADER: &str = include_str!("shaders/lit.wgsl");
const BLIT_SHADER: &str = include_str!("shaders/blit.wgsl");
const BRIGHT_SHADER: &str = include_str!("shaders/bright.wgsl");
const BLUR_SHADER: &str = include_str!("shaders/blur.wgsl");
const COMPOSITE_SHADER: &str = include_str!("shaders/composite.wgsl");

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Texture at binding 0, sampler at binding 1.
pub fn create_sampled_texture_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{label} Bind Group Layout")),
        entries: &[texture_entry(0), sampler_entry(1)],
    })
}

/// Camera and light uniform for the lit pass.
pub fn create_scene_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Scene Bind Group Layout"),
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
    })
}

/// Source texture, sampler and a pass uniform.
fn create_filter_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
        ],
    })
}

pub fn create_bright_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    create_filter_bind_group_layout(device, "Bright Bind Group Layout")
}

pub fn create_blur_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    create_filter_bind_group_layout(device, "Blur Bind Group Layout")
}

/// Scene colour, blurred bloom, a shared sampler and the grading uniform.
pub fn create_composite_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Composite Bind Group Layout"),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            sampler_entry(2),
            uniform_entry(3, wgpu::ShaderStages::FRAGMENT),
        ],
    })
}

/// Lit scene pipeline for one primitive topology. Culling is off: the river
/// strip alternates winding and the ground is seen from both sides.
/// Depth passes on equal so a second draw of the same geometry lands on top.
pub fn create_lit_pipeline(
    device: &wgpu::Device,
    scene_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Lit Shader"),
        source: wgpu::ShaderSource::Wgsl(LIT_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lit Pipeline Layout"),
        bind_group_layouts: &[scene_layout, texture_layout],
        push_constant_ranges: &[],
    });

    let label = match topology {
        wgpu::PrimitiveTopology::TriangleStrip => "Lit Strip Pipeline",
        _ => "Lit List Pipeline",
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout(), InstanceData::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Fullscreen-triangle pipeline with no depth, drawing `fragment_source`'s `fs_main`.
fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    fragment_source: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let source = format!("{FULLSCREEN_SHADER}\n{fragment_source}");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} Shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Plain copy, used to downsample mip levels.
pub fn create_blit_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    create_fullscreen_pipeline(device, "Blit", BLIT_SHADER, bind_group_layout, format)
}

pub fn create_bright_pipeline(device: &wgpu::Device, bind_group_layout: &wgpu::BindGroupLayout) -> wgpu::RenderPipeline {
    create_fullscreen_pipeline(device, "Bright", BRIGHT_SHADER, bind_group_layout, HDR_FORMAT)
}

pub fn create_blur_pipeline(device: &wgpu::Device, bind_group_layout: &wgpu::BindGroupLayout) -> wgpu::RenderPipeline {
    create_fullscreen_pipeline(device, "Blur", BLUR_SHADER, bind_group_layout, HDR_FORMAT)
}

/// Final grading pass, writing the swap-chain format.
pub fn create_composite_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    create_fullscreen_pipeline(device, "Composite", COMPOSITE_SHADER, bind_group_layout, output_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    #[test]
    fn post_shaders_share_the_fullscreen_stage() {
        for source in [BLIT_SHADER, BRIGHT_SHADER, BLUR_SHADER, COMPOSITE_SHADER] {
            assert!(source.contains("fn fs_main(in: FullscreenOutput)"));
            assert!(!source.contains("fn vs_fullscreen"));
        }
        assert!(FULLSCREEN_SHADER.contains("fn vs_fullscreen"));
    }

    #[test]
    fn every_pipeline_validates() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let scene = create_scene_bind_group_layout(&device);
        let sampled = create_sampled_texture_bind_group_layout(&device, "Test");
        create_lit_pipeline(&device, &scene, &sampled, wgpu::PrimitiveTopology::TriangleList);
        create_lit_pipeline(&device, &scene, &sampled, wgpu::PrimitiveTopology::TriangleStrip);
        create_blit_pipeline(&device, &sampled, wgpu::TextureFormat::Rgba8Unorm);
        create_bright_pipeline(&device, &create_bright_bind_group_layout(&device));
        create_blur_pipeline(&device, &create_blur_bind_group_layout(&device));
        create_composite_pipeline(
            &device,
            &create_composite_bind_group_layout(&device),
            wgpu::TextureFormat::Bgra8Unorm,
        );

        let error = pollster::block_on(device.pop_error_scope());
        assert!(error.is_none(), "pipeline validation failed: {error:?}");
    }
}
