//! Offscreen render target with CPU readback
//!
//! Owns a colour and a depth texture of the same size. Allocation is
//! checked against the device's 2D texture limit and against the largest
//! buffer the readback may use, then wrapped in error scopes, so an
//! oversized capture surfaces as an error instead of a device-lost panic.

/// Colour format of every render target
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Depth format shared by the scene pipelines
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Errors from allocating, rendering into or reading back a target
#[derive(Debug)]
pub enum CaptureError {
    /// Width or height is zero
    Empty { width: u32, height: u32 },
    /// Requested size exceeds what the device can allocate
    TooLarge { width: u32, height: u32, max: u32 },
    /// The readback buffer for this size exceeds the device's buffer limit
    ReadbackTooLarge { width: u32, height: u32, bytes: u64, max: u64 },
    /// The backend rejected the allocation (out of memory or validation)
    Allocation(String),
    /// Staging buffer could not be mapped
    Readback(String),
    /// PNG encoding failed
    Encode(String),
    /// Any other render failure
    Render(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Empty { width, height } => {
                write!(f, "Render target {}x{} has zero area", width, height)
            }
            CaptureError::TooLarge { width, height, max } => write!(
                f,
                "Render target {}x{} exceeds device limit of {} pixels per side",
                width, height, max
            ),
            CaptureError::ReadbackTooLarge {
                width,
                height,
                bytes,
                max,
            } => write!(
                f,
                "Reading back {}x{} needs {} bytes, device buffer limit is {}",
                width, height, bytes, max
            ),
            CaptureError::Allocation(msg) => write!(f, "Failed to allocate render target: {}", msg),
            CaptureError::Readback(msg) => write!(f, "Failed to read back pixels: {}", msg),
            CaptureError::Encode(msg) => write!(f, "Failed to encode image: {}", msg),
            CaptureError::Render(msg) => write!(f, "Render failed: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Bytes per row of a readback buffer, padded to the copy alignment
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Size of the staging buffer needed to read back a `width` x `height` target
pub fn readback_bytes(width: u32, height: u32) -> u64 {
    padded_bytes_per_row(width) as u64 * height as u64
}

fn check_readback(device: &wgpu::Device, width: u32, height: u32) -> Result<(), CaptureError> {
    let bytes = readback_bytes(width, height);
    let max = device.limits().max_buffer_size;
    if bytes > max {
        return Err(CaptureError::ReadbackTooLarge {
            width,
            height,
            bytes,
            max,
        });
    }
    Ok(())
}

/// Offscreen colour + depth target
pub struct RenderTarget {
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Allocate a target of the given size
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Empty { width, height });
        }
        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(CaptureError::TooLarge { width, height, max });
        }
        check_readback(device, width, height)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Render Target Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Render Target Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = out_of_memory.or(validation) {
            return Err(CaptureError::Allocation(error.to_string()));
        }

        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            color_texture,
            color_view,
            depth_view,
            width,
            height,
        })
    }

    /// Reallocate at a new size; a no-op when the size is unchanged.
    /// On failure the previous allocation is kept.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), CaptureError> {
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        *self = Self::new(device, width, height)?;
        log::debug!("Render target resized to {}x{}", width, height);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Copy the colour texture to the CPU as tightly packed RGBA8 rows
    pub fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>, CaptureError> {
        check_readback(device, self.width, self.height)?;

        let unpadded_bytes_per_row = self.width * 4;
        let padded_bytes_per_row = padded_bytes_per_row(self.width);

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Staging Buffer"),
            size: readback_bytes(self.width, self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = out_of_memory.or(validation) {
            return Err(CaptureError::Allocation(error.to_string()));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Copy Encoder"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        // Map buffer and read data
        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(CaptureError::Readback(e.to_string())),
            Err(e) => return Err(CaptureError::Readback(e.to_string())),
        }

        // Read data and remove padding
        let data = buffer_slice.get_mapped_range();
        let row_len = unpadded_bytes_per_row as usize;
        let mut pixels = Vec::with_capacity(row_len * self.height as usize);

        for row in data.chunks_exact(padded_bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        drop(data);
        staging_buffer.unmap();

        Ok(pixels)
    }
}
