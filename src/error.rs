//! Error types for window, GPU and asset startup.
//!
//! Every fallible step happens once, before the first frame. The frame loop
//! itself performs no fallible I/O.

use thiserror::Error;

/// Errors raised while bringing up a demo.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("could not open window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("could not create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("could not create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface does not support any texture format")]
    UnsupportedSurface,

    #[error("could not load image '{path}': {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_error_names_the_file() {
        let source = image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = Error::Image {
            path: "stone_texture.png".to_string(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("stone_texture.png"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn unsupported_surface_message() {
        assert_eq!(
            Error::UnsupportedSurface.to_string(),
            "surface does not support any texture format"
        );
    }
}
