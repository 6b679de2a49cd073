//! Main renderer managing wgpu state and the per-frame pass sequence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use engine_core::{LightState, PostProcessParams};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::camera::Camera;
use crate::post::PostProcessPipeline;
use crate::render_target::RenderTargets;
use crate::scene::{SceneConfig, SceneRenderer};
use crate::screenshot::PendingScreenshot;

/// Renderer construction options.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub vsync: bool,
    pub blur_passes: u32,
    pub scene: SceneConfig,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            blur_passes: 10,
            scene: SceneConfig::default(),
        }
    }
}

/// Whether a frame reached the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The surface was unavailable this frame; nothing was drawn.
    Skipped,
}

/// Pick the swap-chain format: the first non-sRGB format, else whatever comes first.
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

pub fn present_mode_for(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Latest size reported by the window, applied at the next frame boundary.
#[derive(Debug, Default)]
pub struct PendingResize(Option<PhysicalSize<u32>>);

impl PendingResize {
    /// Queue `size`, replacing any earlier request.
    pub fn request(&mut self, size: PhysicalSize<u32>) {
        self.0 = Some(size);
    }

    /// Take the queued size. Zero-sized requests (minimised window) are dropped.
    pub fn take(&mut self) -> Option<(u32, u32)> {
        let size = self.0.take()?;
        if size.width == 0 || size.height == 0 {
            log::debug!("Ignoring zero-sized resize ({}x{})", size.width, size.height);
            return None;
        }
        Some((size.width, size.height))
    }
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub window: Arc<Window>,

    targets: RenderTargets,
    scene: SceneRenderer,
    post: PostProcessPipeline,

    pending_resize: PendingResize,
}

impl Renderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>, settings: RendererSettings) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats)
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        // Readback for screenshots needs COPY_SRC; not every platform offers it.
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if surface_caps.usages.contains(wgpu::TextureUsages::COPY_SRC) {
            usage |= wgpu::TextureUsages::COPY_SRC;
        } else {
            log::warn!("Surface does not support COPY_SRC, screenshots are disabled");
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode_for(settings.vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface {}x{} {:?}, {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        let targets = RenderTargets::new(&device, config.width, config.height).map_err(|e| {
            log::error!("Render target creation failed: {e}");
            e
        })?;
        if !targets.is_complete(&device) {
            bail!("Render targets incomplete after creation");
        }

        let scene = SceneRenderer::new(&device, &queue, &settings.scene)?;
        let post = PostProcessPipeline::new(&device, surface_format, settings.blur_passes);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            window,
            targets,
            scene,
            post,
            pending_resize: PendingResize::default(),
        })
    }

    /// Queue a resize. Only the most recent request is kept.
    pub fn request_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.pending_resize.request(new_size);
    }

    /// Apply a queued resize to the surface and every render target.
    /// Returns the new size when one was applied.
    pub fn apply_pending_resize(&mut self) -> Result<Option<(u32, u32)>> {
        let Some((width, height)) = self.pending_resize.take() else {
            return Ok(None);
        };

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.targets.resize(&self.device, width, height).map_err(|e| {
            log::error!("Render target resize failed: {e}");
            e
        })?;
        if !self.targets.is_complete(&self.device) {
            bail!("Render targets incomplete after resize to {}x{}", width, height);
        }
        Ok(Some((width, height)))
    }

    /// Draw one frame: scene, bright pass, blur, composite, present.
    /// When `screenshot` is set, the presented image is also written there as PNG.
    pub fn render(
        &mut self,
        camera: &Camera,
        light: &LightState,
        params: &PostProcessParams,
        screenshot: Option<PathBuf>,
    ) -> Result<FrameOutcome> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Reconfigured with the targets at the next frame boundary.
                log::debug!("Surface lost or outdated, queueing resize");
                self.request_resize(self.window.inner_size());
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out, skipping frame");
                return Ok(FrameOutcome::Skipped);
            }
            Err(e) => return Err(anyhow!("Surface error: {e}")),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        let (width, height) = self.targets.size();
        self.scene.update(&self.queue, camera, light);
        self.post.prepare(&self.queue, params, width, height);

        self.scene.render(&mut encoder, &self.targets);
        self.post.run(&self.device, &mut encoder, &self.targets, &view);

        let pending = screenshot.and_then(|path| {
            PendingScreenshot::record(&self.device, &mut encoder, &output.texture, path)
                .map_err(|e| log::warn!("Screenshot dropped: {e}"))
                .ok()
        });

        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(pending) = pending {
            match pending.finish(&self.device) {
                Ok(path) => log::info!("Screenshot written to {}", path.display()),
                Err(e) => log::error!("Screenshot failed: {e}"),
            }
        }

        output.present();
        Ok(FrameOutcome::Presented)
    }

    /// Get surface dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
