/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    /// Yellow of the light marker sphere.
    pub const LAMP: Color = Color::rgb(1.0, 0.9, 0.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How color values stored in a texture or surface relate to what is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorEncoding {
    /// Stored sRGB-encoded; shaders read and write linear values.
    #[default]
    Srgb,
    /// Stored as is; shader values reach the screen unconverted.
    Direct,
}

impl ColorEncoding {
    pub fn of(format: wgpu::TextureFormat) -> Self {
        if format.is_srgb() {
            ColorEncoding::Srgb
        } else {
            ColorEncoding::Direct
        }
    }

    pub fn matches(self, format: wgpu::TextureFormat) -> bool {
        Self::of(format) == self
    }

    /// RGBA8 texture format with this encoding.
    pub fn rgba8_format(self) -> wgpu::TextureFormat {
        match self {
            ColorEncoding::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorEncoding::Direct => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_format_follows_encoding() {
        assert_eq!(
            ColorEncoding::Srgb.rgba8_format(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            ColorEncoding::Direct.rgba8_format(),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }

    #[test]
    fn matches_checks_the_srgb_suffix() {
        assert!(ColorEncoding::Srgb.matches(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert!(!ColorEncoding::Srgb.matches(wgpu::TextureFormat::Bgra8Unorm));
        assert!(ColorEncoding::Direct.matches(wgpu::TextureFormat::Bgra8Unorm));
    }
}
