use crate::color::ColorEncoding;
use crate::error::{Error, Result};
use crate::gpu::GpuContext;

/// How a texture is loaded and sampled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureOptions {
    /// Flip rows so the first image row ends up at `v = 1`.
    pub flip_vertically: bool,
    /// Magnification/minification filter.
    pub filter: wgpu::FilterMode,
    /// Should match the encoding of the surface it is drawn to.
    pub encoding: ColorEncoding,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            filter: wgpu::FilterMode::Linear,
            encoding: ColorEncoding::Srgb,
        }
    }
}

impl TextureOptions {
    pub fn flipped(mut self) -> Self {
        self.flip_vertically = true;
        self
    }

    pub fn with_encoding(mut self, encoding: ColorEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
        options: TextureOptions,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: options.encoding.rgba8_format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: options.filter,
            min_filter: options.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// A 1×1 opaque white texture, bound when a mesh has no texture of its own.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(
            gpu,
            &[255, 255, 255, 255],
            1,
            1,
            "White Texture",
            TextureOptions::default(),
        )
    }

    /// Load a texture from an image file. Decoding blocks the calling thread.
    pub fn from_file(gpu: &GpuContext, path: &str, options: TextureOptions) -> Result<Self> {
        let img = image::open(path).map_err(|source| Error::Image {
            path: path.to_string(),
            source,
        })?;
        let rgba = decode_rgba(img, options);
        let (width, height) = rgba.dimensions();
        log::info!("Loaded texture '{}' ({}x{})", path, width, height);
        Ok(Self::from_rgba(gpu, &rgba, width, height, path, options))
    }
}

/// Converts a decoded image to tightly packed RGBA8, flipping if requested.
pub(crate) fn decode_rgba(img: image::DynamicImage, options: TextureOptions) -> image::RgbaImage {
    let img = if options.flip_vertically {
        img.flipv()
    } else {
        img
    };
    img.to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_image() -> image::DynamicImage {
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 255]));
        image::DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn rgb_images_gain_opaque_alpha() {
        let rgba = decode_rgba(two_row_image(), TextureOptions::default());
        assert_eq!(rgba.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(rgba.get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn flipped_load_swaps_rows() {
        let rgba = decode_rgba(two_row_image(), TextureOptions::default().flipped());
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(rgba.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn default_options_use_linear_filtering() {
        let options = TextureOptions::default();
        assert!(!options.flip_vertically);
        assert_eq!(options.filter, wgpu::FilterMode::Linear);
        assert_eq!(options.encoding, ColorEncoding::Srgb);
    }

    #[test]
    fn builder_keeps_other_options() {
        let options = TextureOptions::default()
            .flipped()
            .with_encoding(ColorEncoding::Direct);
        assert!(options.flip_vertically);
        assert_eq!(options.encoding, ColorEncoding::Direct);
        assert_eq!(options.filter, wgpu::FilterMode::Linear);
    }
}
