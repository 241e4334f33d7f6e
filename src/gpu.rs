//! Core GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu surface, device, queue and surface
//! configuration for one window. It is created once at startup and borrowed by
//! every render pass.
//!
//! Creation is fallible: a missing adapter or a surface that cannot be
//! configured is reported as an [`Error`](crate::Error) so the binaries can
//! exit with a non-zero status.

use std::sync::Arc;
use winit::window::Window;

use crate::color::ColorEncoding;
use crate::error::{Error, Result};

/// wgpu resources bound to a window.
///
/// Fields are public so passes can reach the raw wgpu API.
pub struct GpuContext {
    /// The surface frames are presented to.
    pub surface: wgpu::Surface<'static>,
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    /// Adapter description, kept for startup diagnostics.
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Creates a GPU context for a window.
    ///
    /// Picks a primary backend, requests a default adapter compatible with
    /// the window surface, creates the device and configures the surface with
    /// Fifo presentation and, when available, a format of the requested
    /// encoding.
    pub fn new(window: Arc<Window>, encoding: ColorEncoding) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let adapter_info = adapter.get_info();
        log::debug!("Selected adapter: {:?}", adapter_info);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Tumble Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats, encoding)
            .ok_or(Error::UnsupportedSurface)?;
        if !encoding.matches(surface_format) {
            log::warn!(
                "No {:?} surface format available, using {:?}",
                encoding,
                surface_format
            );
        }
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_info,
        })
    }

    /// Reconfigures the surface for a new window size.
    ///
    /// Zero-sized dimensions (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Gets the next surface texture to draw into.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// other failures are logged and the frame skipped.
    pub fn acquire_frame(&self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(e) => {
                log::warn!("Failed to get surface texture: {}", e);
                None
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Encoding of the configured surface format.
    pub fn encoding(&self) -> ColorEncoding {
        ColorEncoding::of(self.config.format)
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Logs the adapter and backend in use, plus the starting viewport.
    pub fn log_startup_info(&self) {
        let info = &self.adapter_info;
        log::info!("Vendor: {:#06x}", info.vendor);
        log::info!("Renderer: {}", info.name);
        log::info!("Backend: {:?}", info.backend);
        log::info!("Driver: {} {}", info.driver, info.driver_info);
        log::info!(
            "Starting viewport: (width: {}, height: {})",
            self.width(),
            self.height()
        );
    }
}

/// First format with the requested encoding, else the first format offered.
pub(crate) fn pick_surface_format(
    formats: &[wgpu::TextureFormat],
    encoding: ColorEncoding,
) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| encoding.matches(**f))
        .or_else(|| formats.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    const OFFERED: [TextureFormat; 2] =
        [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];

    #[test]
    fn direct_encoding_skips_srgb_formats() {
        assert_eq!(
            pick_surface_format(&OFFERED, ColorEncoding::Direct),
            Some(TextureFormat::Bgra8Unorm)
        );
        assert_eq!(
            pick_surface_format(&OFFERED, ColorEncoding::Srgb),
            Some(TextureFormat::Bgra8UnormSrgb)
        );
    }

    #[test]
    fn falls_back_to_first_format() {
        let only_srgb = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(
            pick_surface_format(&only_srgb, ColorEncoding::Direct),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(pick_surface_format(&[], ColorEncoding::Srgb), None);
    }
}
