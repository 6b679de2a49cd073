//! Offscreen render targets: the HDR scene target, the bright-pass target and
//! the two ping-pong blur targets.
//!
//! Targets are addressed by [`TargetId`]. A resize swaps the textures inside each
//! slot, so an id stays valid across resizes; anything that samples a target
//! builds its bind group per frame.

use std::fmt;

use crate::texture::Texture;

/// Colour format of every offscreen target.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Usages a colour target needs: drawn into, then sampled by the next pass.
pub const TARGET_USAGES: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Stable handle for one offscreen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    /// Lit scene colour plus depth/stencil.
    Main,
    /// Pixels above the bloom threshold.
    Bright,
    PingPong0,
    PingPong1,
}

impl TargetId {
    pub const ALL: [TargetId; 4] = [
        TargetId::Main,
        TargetId::Bright,
        TargetId::PingPong0,
        TargetId::PingPong1,
    ];

    /// Ping-pong target by index (0 or 1).
    pub fn ping_pong(index: usize) -> Self {
        if index % 2 == 0 {
            TargetId::PingPong0
        } else {
            TargetId::PingPong1
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetId::Main => "Main Target",
            TargetId::Bright => "Bright Target",
            TargetId::PingPong0 => "Ping-Pong Target 0",
            TargetId::PingPong1 => "Ping-Pong Target 1",
        }
    }

    /// Only the scene target carries a depth/stencil attachment.
    pub fn has_depth(self) -> bool {
        matches!(self, TargetId::Main)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a target could not be (re)allocated.
#[derive(Debug, thiserror::Error)]
pub enum RenderTargetError {
    #[error("refusing to allocate a {width}x{height} target")]
    ZeroSized { width: u32, height: u32 },

    #[error("{target} at {width}x{height} exceeds the device limit of {limit}")]
    ExceedsLimit {
        target: TargetId,
        width: u32,
        height: u32,
        limit: u32,
    },

    #[error("{target}: format {format:?} is not both renderable and sampleable")]
    FormatUnsupported {
        target: TargetId,
        format: wgpu::TextureFormat,
    },

    #[error("{target}: allocation failed: {message}")]
    Validation { target: TargetId, message: String },
}

/// Completeness check that needs no GPU: size, device limit and format usages.
pub fn check_complete(
    target: TargetId,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    device_features: wgpu::Features,
    max_dimension: u32,
) -> Result<(), RenderTargetError> {
    if width == 0 || height == 0 {
        return Err(RenderTargetError::ZeroSized { width, height });
    }
    if width > max_dimension || height > max_dimension {
        return Err(RenderTargetError::ExceedsLimit {
            target,
            width,
            height,
            limit: max_dimension,
        });
    }
    let allowed = format.guaranteed_format_features(device_features).allowed_usages;
    if !allowed.contains(TARGET_USAGES) {
        return Err(RenderTargetError::FormatUnsupported { target, format });
    }
    Ok(())
}

/// Depth/stencil attachment of the scene target.
pub struct DepthAttachment {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Attachments allocated for a resize, not yet swapped in.
struct StagedStorage {
    color: wgpu::Texture,
    depth: Option<DepthAttachment>,
    width: u32,
    height: u32,
}

/// One offscreen colour target, with depth for [`TargetId::Main`].
pub struct RenderTarget {
    id: TargetId,
    format: wgpu::TextureFormat,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: Option<DepthAttachment>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, id: TargetId, width: u32, height: u32) -> Result<Self, RenderTargetError> {
        let (color, depth) = allocate(device, id, HDR_FORMAT, width, height)?;
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Allocated {id} ({width}x{height})");
        Ok(Self {
            id,
            format: HDR_FORMAT,
            color,
            color_view,
            depth,
            width,
            height,
        })
    }

    /// Allocate replacement attachments without touching the current ones.
    fn stage(&self, device: &wgpu::Device, width: u32, height: u32) -> Result<StagedStorage, RenderTargetError> {
        let (color, depth) = allocate(device, self.id, self.format, width, height)?;
        Ok(StagedStorage {
            color,
            depth,
            width,
            height,
        })
    }

    fn commit(&mut self, storage: StagedStorage) {
        self.color_view = storage.color.create_view(&wgpu::TextureViewDescriptor::default());
        self.color = storage.color;
        self.depth = storage.depth;
        self.width = storage.width;
        self.height = storage.height;
        log::debug!("Resized {} to {}x{}", self.id, self.width, self.height);
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|d| &d.view)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the attachments still satisfy the device's limits and format support.
    pub fn is_complete(&self, device: &wgpu::Device) -> bool {
        let color_size = (self.color.width(), self.color.height());
        let depth_ok = match (&self.depth, self.id.has_depth()) {
            (Some(depth), true) => (depth.texture.width(), depth.texture.height()) == color_size,
            (None, false) => true,
            _ => false,
        };
        depth_ok
            && color_size == (self.width, self.height)
            && check_complete(
                self.id,
                self.width,
                self.height,
                self.format,
                device.features(),
                device.limits().max_texture_dimension_2d,
            )
            .is_ok()
    }
}

/// Allocate colour (and depth for the scene target) inside error scopes so
/// allocation failures surface as errors instead of device-lost callbacks.
fn allocate(
    device: &wgpu::Device,
    id: TargetId,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> Result<(wgpu::Texture, Option<DepthAttachment>), RenderTargetError> {
    check_complete(
        id,
        width,
        height,
        format,
        device.features(),
        device.limits().max_texture_dimension_2d,
    )?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(id.label()),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: TARGET_USAGES,
        view_formats: &[],
    });
    let depth = id.has_depth().then(|| {
        let texture = Texture::create_depth_texture(device, width, height, "Main Depth");
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        DepthAttachment { texture, view }
    });

    let out_of_memory = pollster::block_on(device.pop_error_scope());
    let validation = pollster::block_on(device.pop_error_scope());
    if let Some(error) = out_of_memory.or(validation) {
        let error = RenderTargetError::Validation {
            target: id,
            message: error.to_string(),
        };
        log::error!("{error}");
        return Err(error);
    }
    Ok((color, depth))
}

/// What [`RenderTargets::resize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Zero-sized request, nothing touched.
    Skipped,
    /// Already at that size.
    Unchanged,
    Resized,
}

/// The four offscreen targets the frame renders through, always at one shared size.
pub struct RenderTargets {
    main: RenderTarget,
    bright: RenderTarget,
    ping_pong: [RenderTarget; 2],
    width: u32,
    height: u32,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, RenderTargetError> {
        let targets = Self {
            main: RenderTarget::new(device, TargetId::Main, width, height)?,
            bright: RenderTarget::new(device, TargetId::Bright, width, height)?,
            ping_pong: [
                RenderTarget::new(device, TargetId::PingPong0, width, height)?,
                RenderTarget::new(device, TargetId::PingPong1, width, height)?,
            ],
            width,
            height,
        };
        log::info!("Render targets ready at {width}x{height}");
        Ok(targets)
    }

    /// Reallocate every target at the new size. Zero dimensions (a minimised
    /// window) are ignored, as is a request for the current size. All four
    /// targets are allocated before any is replaced, so a failure leaves every
    /// target at the previous size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<ResizeOutcome, RenderTargetError> {
        if width == 0 || height == 0 {
            log::debug!("Skipping zero-sized target resize ({width}x{height})");
            return Ok(ResizeOutcome::Skipped);
        }
        if (width, height) == (self.width, self.height) {
            return Ok(ResizeOutcome::Unchanged);
        }
        let staged = TargetId::ALL
            .iter()
            .map(|&id| self.get(id).stage(device, width, height))
            .collect::<Result<Vec<_>, _>>()?;
        for (target, storage) in self.iter_mut().zip(staged) {
            target.commit(storage);
        }
        self.width = width;
        self.height = height;
        Ok(ResizeOutcome::Resized)
    }

    pub fn get(&self, id: TargetId) -> &RenderTarget {
        match id {
            TargetId::Main => &self.main,
            TargetId::Bright => &self.bright,
            TargetId::PingPong0 => &self.ping_pong[0],
            TargetId::PingPong1 => &self.ping_pong[1],
        }
    }

    /// Targets in [`TargetId::ALL`] order.
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderTarget> {
        let [a, b] = &mut self.ping_pong;
        [&mut self.main, &mut self.bright, a, b].into_iter()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_complete(&self, device: &wgpu::Device) -> bool {
        TargetId::ALL.iter().all(|&id| {
            let target = self.get(id);
            target.size() == (self.width, self.height) && target.is_complete(device)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    #[test]
    fn ping_pong_ids_alternate() {
        assert_eq!(TargetId::ping_pong(0), TargetId::PingPong0);
        assert_eq!(TargetId::ping_pong(1), TargetId::PingPong1);
        assert_eq!(TargetId::ping_pong(4), TargetId::PingPong0);
        assert!(TargetId::Main.has_depth());
        assert!(TargetId::ALL[1..].iter().all(|id| !id.has_depth()));
    }

    #[test]
    fn zero_size_is_never_complete() {
        let result = check_complete(TargetId::Main, 0, 720, HDR_FORMAT, wgpu::Features::empty(), 8192);
        assert!(matches!(result, Err(RenderTargetError::ZeroSized { width: 0, height: 720 })));
    }

    #[test]
    fn oversized_target_reports_limit() {
        let result = check_complete(TargetId::Bright, 9000, 100, HDR_FORMAT, wgpu::Features::empty(), 8192);
        match result {
            Err(RenderTargetError::ExceedsLimit { target, limit, .. }) => {
                assert_eq!(target, TargetId::Bright);
                assert_eq!(limit, 8192);
            }
            other => panic!("expected limit error, got {other:?}"),
        }
    }

    #[test]
    fn shared_exponent_format_is_not_renderable() {
        let result = check_complete(
            TargetId::PingPong1,
            64,
            64,
            wgpu::TextureFormat::Rgb9e5Ufloat,
            wgpu::Features::empty(),
            8192,
        );
        assert!(matches!(result, Err(RenderTargetError::FormatUnsupported { target: TargetId::PingPong1, .. })));
        assert!(check_complete(TargetId::Main, 1600, 1200, HDR_FORMAT, wgpu::Features::empty(), 8192).is_ok());
    }

    #[test]
    fn resize_twice_is_idempotent() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut targets = RenderTargets::new(&device, 64, 48).expect("targets");
        assert!(targets.is_complete(&device));

        assert_eq!(targets.resize(&device, 80, 60).expect("resize"), ResizeOutcome::Resized);
        let complete = targets.is_complete(&device);
        let sizes: Vec<_> = TargetId::ALL.iter().map(|&id| targets.get(id).size()).collect();

        assert_eq!(targets.resize(&device, 80, 60).expect("resize"), ResizeOutcome::Unchanged);
        let again: Vec<_> = TargetId::ALL.iter().map(|&id| targets.get(id).size()).collect();
        assert_eq!(sizes, again);
        assert_eq!(targets.is_complete(&device), complete);
        assert!(complete);
        assert!(sizes.iter().all(|&s| s == (80, 60)));
    }

    #[test]
    fn failed_resize_leaves_every_target_at_old_size() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut targets = RenderTargets::new(&device, 48, 32).expect("targets");
        let too_wide = device.limits().max_texture_dimension_2d + 1;

        let result = targets.resize(&device, too_wide, 32);
        assert!(matches!(result, Err(RenderTargetError::ExceedsLimit { .. })));
        assert_eq!(targets.size(), (48, 32));
        for id in TargetId::ALL {
            assert_eq!(targets.get(id).size(), (48, 32), "{id} changed size");
            assert_eq!(targets.get(id).color_texture().width(), 48);
        }
        assert!(targets.is_complete(&device));
    }

    #[test]
    fn iteration_follows_target_id_order() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut targets = RenderTargets::new(&device, 8, 8).expect("targets");
        let ids: Vec<_> = targets.iter_mut().map(|t| t.id()).collect();
        assert_eq!(ids, TargetId::ALL.to_vec());
    }

    #[test]
    fn zero_size_resize_keeps_storage() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut targets = RenderTargets::new(&device, 32, 32).expect("targets");
        assert_eq!(targets.resize(&device, 0, 32).expect("resize"), ResizeOutcome::Skipped);
        assert_eq!(targets.size(), (32, 32));
        assert_eq!(targets.get(TargetId::Main).color_texture().width(), 32);
        assert!(targets.get(TargetId::Main).depth_view().is_some());
        assert!(targets.get(TargetId::Bright).depth_view().is_none());
    }
}
