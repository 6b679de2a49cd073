//! Surface readback to PNG.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors that can occur while capturing a screenshot.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("surface format {0:?} has no 8-bit RGBA readback")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("surface was configured without COPY_SRC")]
    NotReadable,

    #[error("readback failed: {0}")]
    Readback(String),

    #[error("failed to write {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of the readback buffer, rounded up to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip the per-row padding, keeping rows top-down.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(padded_row as usize).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    pixels
}

/// In-place BGRA -> RGBA.
pub fn swizzle_bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Whether `format` reads back as 4 bytes per pixel and if so, whether it is BGRA.
fn readback_layout(format: wgpu::TextureFormat) -> Result<bool, ScreenshotError> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok(false),
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(true),
        other => Err(ScreenshotError::UnsupportedFormat(other)),
    }
}

/// `dir/screenshot-<unix seconds>.png`.
pub fn screenshot_path(dir: &Path, unix_seconds: u64) -> PathBuf {
    dir.join(format!("screenshot-{unix_seconds}.png"))
}

/// [`screenshot_path`] stamped with the current time.
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    screenshot_path(dir, secs)
}

/// Encode tightly packed RGBA8 pixels as PNG.
pub fn save_png(path: &Path, rgba: &[u8], width: u32, height: u32) -> Result<(), ScreenshotError> {
    image::save_buffer_with_format(path, rgba, width, height, image::ColorType::Rgba8, image::ImageFormat::Png)
        .map_err(|source| ScreenshotError::Encode {
            path: path.display().to_string(),
            source,
        })
}

/// A surface copy recorded into a frame's encoder, waiting for the frame to be submitted.
pub struct PendingScreenshot {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_row: u32,
    bgra: bool,
    path: PathBuf,
}

impl PendingScreenshot {
    /// Record a copy of `texture` into a mappable buffer.
    pub fn record(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        path: PathBuf,
    ) -> Result<Self, ScreenshotError> {
        if !texture.usage().contains(wgpu::TextureUsages::COPY_SRC) {
            return Err(ScreenshotError::NotReadable);
        }
        let bgra = readback_layout(texture.format())?;
        let (width, height) = (texture.width(), texture.height());
        let padded_row = padded_bytes_per_row(width);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screenshot Readback"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(Self {
            buffer,
            width,
            height,
            padded_row,
            bgra,
            path,
        })
    }

    /// Map the buffer (blocking), convert to RGBA rows and write the PNG.
    /// Call after the encoder holding the copy has been submitted.
    pub fn finish(self, device: &wgpu::Device) -> Result<PathBuf, ScreenshotError> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ScreenshotError::Readback(e.to_string())),
            Err(e) => return Err(ScreenshotError::Readback(e.to_string())),
        }

        let mut pixels = {
            let mapped = slice.get_mapped_range();
            unpad_rows(&mapped, self.width, self.height, self.padded_row)
        };
        self.buffer.unmap();

        if self.bgra {
            swizzle_bgra_to_rgba(&mut pixels);
        }
        save_png(&self.path, &pixels, self.width, self.height)?;
        Ok(self.path)
    }
}
