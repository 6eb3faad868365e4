//! wgpu instance, adapter and device setup shared by the windowed and
//! headless renderers

use crate::render::target::CaptureError;

/// Errors raised while acquiring a GPU device
#[derive(Debug)]
pub enum GpuError {
    /// Window surface could not be created
    Surface(wgpu::CreateSurfaceError),
    /// No adapter satisfied the request
    NoAdapter,
    /// The adapter refused to create a device
    Device(wgpu::RequestDeviceError),
    /// The surface reports no usable format or alpha mode for this adapter
    IncompatibleSurface,
    /// The initial render target could not be allocated
    Target(CaptureError),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::Surface(e) => write!(f, "Failed to create surface: {}", e),
            GpuError::NoAdapter => write!(f, "No suitable GPU adapter found"),
            GpuError::Device(e) => write!(f, "Failed to create device: {}", e),
            GpuError::IncompatibleSurface => write!(f, "Surface is not supported by the adapter"),
            GpuError::Target(e) => write!(f, "{}", e),
        }
    }
}

impl From<CaptureError> for GpuError {
    fn from(error: CaptureError) -> Self {
        GpuError::Target(error)
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Surface(e) => Some(e),
            GpuError::NoAdapter | GpuError::IncompatibleSurface => None,
            GpuError::Device(e) => Some(e),
            GpuError::Target(e) => Some(e),
        }
    }
}

/// Create a wgpu instance over every available backend
pub fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Pick the surface format (sRGB preferred) and alpha mode
pub fn surface_format(
    caps: &wgpu::SurfaceCapabilities,
) -> Result<(wgpu::TextureFormat, wgpu::CompositeAlphaMode), GpuError> {
    let format = caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or(caps.formats.first())
        .copied()
        .ok_or(GpuError::IncompatibleSurface)?;
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .ok_or(GpuError::IncompatibleSurface)?;
    Ok((format, alpha_mode))
}

/// Request an adapter (optionally compatible with a surface) and its device
pub async fn request_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
    label: &str,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), GpuError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;

    let info = adapter.get_info();
    log::info!("Using adapter {} ({:?})", info.name, info.backend);

    // Ask for the adapter's own texture limit so large captures fit
    let required_limits = wgpu::Limits {
        max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
        ..wgpu::Limits::default()
    };

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits,
                label: Some(label),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(GpuError::Device)?;

    Ok((adapter, device, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>, alpha_modes: Vec<wgpu::CompositeAlphaMode>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes,
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn test_surface_format_prefers_srgb() {
        let caps = caps(
            vec![wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb],
            vec![wgpu::CompositeAlphaMode::Opaque],
        );
        let (format, alpha) = surface_format(&caps).unwrap();
        assert_eq!(format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(alpha, wgpu::CompositeAlphaMode::Opaque);
    }

    #[test]
    fn test_surface_format_falls_back_to_first() {
        let caps = caps(vec![wgpu::TextureFormat::Rgba16Float], vec![wgpu::CompositeAlphaMode::Auto]);
        assert_eq!(surface_format(&caps).unwrap().0, wgpu::TextureFormat::Rgba16Float);
    }

    #[test]
    fn test_empty_capabilities_are_an_error() {
        let no_formats = caps(vec![], vec![wgpu::CompositeAlphaMode::Opaque]);
        assert!(matches!(surface_format(&no_formats), Err(GpuError::IncompatibleSurface)));

        let no_alpha = caps(vec![wgpu::TextureFormat::Bgra8UnormSrgb], vec![]);
        assert!(matches!(surface_format(&no_alpha), Err(GpuError::IncompatibleSurface)));
    }
}
