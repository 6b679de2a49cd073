//! Image textures: decoding, upload, mipmap generation and the depth attachment helper.

use std::path::Path;

/// Errors that can occur while loading a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("texture {width}x{height} exceeds the device limit of {limit}")]
    ExceedsLimit { width: u32, height: u32, limit: u32 },
}

/// Reject sizes the device cannot allocate before they reach `create_texture`.
pub fn check_dimensions(width: u32, height: u32, max_dimension: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    if width > max_dimension || height > max_dimension {
        return Err(TextureError::ExceedsLimit {
            width,
            height,
            limit: max_dimension,
        });
    }
    Ok(())
}

/// Number of mip levels down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Sampled colour format for image textures.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A GPU texture with its view and sampler.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub dimensions: (u32, u32),
    pub mip_level_count: u32,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Decode an image file, flip it vertically and upload it with a full mip chain.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmaps: &MipmapGenerator,
        path: &Path,
    ) -> Result<Self, TextureError> {
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        // Planar UVs follow a bottom-left image origin.
        let rgba = image.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "texture".to_string());
        Self::from_rgba8(device, queue, Some(mipmaps), &label, &rgba, width, height)
    }

    /// Upload tightly packed RGBA8 pixels. Mipmaps are generated when `mipmaps` is given.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmaps: Option<&MipmapGenerator>,
        label: &str,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, TextureError> {
        check_dimensions(width, height, device.limits().max_texture_dimension_2d)?;
        let mip_levels = if mipmaps.is_some() {
            mip_level_count(width, height)
        } else {
            1
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        if let Some(generator) = mipmaps {
            generator.generate(device, queue, &texture, mip_levels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::info!("Loaded texture '{label}' ({width}x{height}, {mip_levels} mips)");

        Ok(Self {
            texture,
            view,
            sampler,
            dimensions: (width, height),
            mip_level_count: mip_levels,
        })
    }

    /// 1x1 opaque white texture, bound wherever a draw has no usable image.
    pub fn white_pixel(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, TextureError> {
        Self::from_rgba8(device, queue, None, "White Pixel", &[255, 255, 255, 255], 1, 1)
    }

    /// Combined depth/stencil attachment.
    pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }
}

/// An image texture that may have failed to load. Draws using an unbound slot render untextured.
pub enum TextureSlot {
    Bound(Texture),
    Unbound,
}

impl TextureSlot {
    /// Load `path`, logging and returning [`TextureSlot::Unbound`] on failure.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmaps: &MipmapGenerator,
        path: &Path,
    ) -> Self {
        match Texture::load(device, queue, mipmaps, path) {
            Ok(texture) => TextureSlot::Bound(texture),
            Err(e) => {
                log::warn!("Texture {} unavailable, drawing untextured: {e}", path.display());
                TextureSlot::Unbound
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, TextureSlot::Bound(_))
    }

    pub fn texture(&self) -> Option<&Texture> {
        match self {
            TextureSlot::Bound(texture) => Some(texture),
            TextureSlot::Unbound => None,
        }
    }
}

/// Fills mip levels 1.. of an [`IMAGE_FORMAT`] texture by repeated fullscreen blits.
pub struct MipmapGenerator {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl MipmapGenerator {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = crate::pipeline::create_sampled_texture_bind_group_layout(device, "Blit");
        let pipeline = crate::pipeline::create_blit_pipeline(device, &bind_group_layout, IMAGE_FORMAT);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }

    pub fn generate(&self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture, mip_count: u32) {
        if mip_count < 2 {
            return;
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mipmap Encoder"),
        });

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mipmap Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mipmap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
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
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Create a test GPU device and queue. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Test Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .ok()
    })
}
