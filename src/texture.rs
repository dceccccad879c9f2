use crate::loader::ImageData;

#[derive(Debug)]
pub struct Texture
{
        pub texture: wgpu::Texture,
        pub view: wgpu::TextureView,
        pub sampler: wgpu::Sampler,
}

impl Texture
{
        pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

        /// Create a 1x1 white texture to use as a fallback
        pub fn create_dummy(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
        ) -> Self
        {
                Self::solid(device, queue, [255, 255, 255, 255], "Dummy White Texture")
        }

        /// Stand-in environment used until (or instead of) a decoded map.
        pub fn neutral_environment(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
        ) -> Self
        {
                Self::solid(device, queue, [128, 128, 128, 255], "Neutral Environment")
        }

        fn solid(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                rgba: [u8; 4],
                label: &str,
        ) -> Self
        {
                Self::from_rgba(device, queue, 1, 1, &rgba, label)
        }

        /// Uploads `image`, downscaling it first if either side exceeds the
        /// device's texture size limit.
        pub fn from_image(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                image: &ImageData,
                label: &str,
        ) -> Self
        {
                let max_dim = device.limits().max_texture_dimension_2d;

                let (width, height) = fit_within(image.width, image.height, max_dim);

                if (width, height) == (image.width, image.height)
                {
                        return Self::from_rgba(device, queue, image.width, image.height, &image.rgba, label);
                }

                log::warn!(
                        "{label}: {}x{} exceeds the {max_dim}px texture limit, downscaling to {width}x{height}",
                        image.width,
                        image.height
                );

                match downscale(image, width, height)
                {
                        Some(resized) => Self::from_rgba(device, queue, width, height, &resized.rgba, label),
                        None =>
                        {
                                log::warn!("{label}: pixel data too short to resize, using a neutral texture");
                                Self::solid(device, queue, [128, 128, 128, 255], label)
                        }
                }
        }

        fn from_rgba(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                width: u32,
                height: u32,
                rgba: &[u8],
                label: &str,
        ) -> Self
        {
                let size = wgpu::Extent3d {
                        width: width.max(1),
                        height: height.max(1),
                        depth_or_array_layers: 1,
                };

                let texture = Self::create_texture(device, label, size);

                Self::write_texture_to_queue(queue, &texture, rgba, size);

                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

                let sampler = Self::create_sampler(device);

                Self {
                        texture,
                        view,
                        sampler,
                }
        }

        fn create_texture(
                device: &wgpu::Device,
                label: &str,
                size: wgpu::Extent3d,
        ) -> wgpu::Texture
        {
                device.create_texture(&wgpu::TextureDescriptor {
                        label: Some(label),
                        size,
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::Rgba8UnormSrgb,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                        view_formats: &[],
                })
        }

        fn write_texture_to_queue(
                queue: &wgpu::Queue,
                texture: &wgpu::Texture,
                rgba: &[u8],
                size: wgpu::Extent3d,
        )
        {
                let expected = (4 * size.width * size.height) as usize;

                if rgba.len() < expected
                {
                        log::warn!(
                                "Texture data too short ({} < {} bytes), leaving it blank",
                                rgba.len(),
                                expected
                        );
                        return;
                }

                queue.write_texture(
                        wgpu::TexelCopyTextureInfo {
                                aspect: wgpu::TextureAspect::All,
                                texture,
                                mip_level: 0,
                                origin: wgpu::Origin3d::ZERO,
                        },
                        &rgba[..expected],
                        wgpu::TexelCopyBufferLayout {
                                offset: 0,
                                bytes_per_row: Some(4 * size.width),
                                rows_per_image: Some(size.height),
                        },
                        size,
                );
        }

        fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler
        {
                device.create_sampler(&wgpu::SamplerDescriptor {
                        address_mode_u: wgpu::AddressMode::Repeat,
                        address_mode_v: wgpu::AddressMode::ClampToEdge,
                        address_mode_w: wgpu::AddressMode::Repeat,
                        mag_filter: wgpu::FilterMode::Linear,
                        min_filter: wgpu::FilterMode::Linear,
                        mipmap_filter: wgpu::FilterMode::Linear,
                        ..Default::default()
                })
        }

        pub fn create_depth_texture(
                device: &wgpu::Device,
                config: &wgpu::SurfaceConfiguration,
                label: &str,
        ) -> Self
        {
                Self::depth(device, config.width, config.height, label)
        }

        /// Square depth target the directional light renders into.
        pub fn create_shadow_map(
                device: &wgpu::Device,
                size: u32,
        ) -> Self
        {
                let size = size.min(device.limits().max_texture_dimension_2d);

                Self::depth(device, size, size, "Shadow Map")
        }

        fn depth(
                device: &wgpu::Device,
                width: u32,
                height: u32,
                label: &str,
        ) -> Self
        {
                let size = wgpu::Extent3d {
                        width: width.max(1),
                        height: height.max(1),
                        depth_or_array_layers: 1,
                };

                let texture = device.create_texture(&wgpu::TextureDescriptor {
                        label: Some(label),
                        size,
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: Self::DEPTH_FORMAT,
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                                | wgpu::TextureUsages::TEXTURE_BINDING,
                        view_formats: &[],
                });

                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                        address_mode_u: wgpu::AddressMode::ClampToEdge,
                        address_mode_v: wgpu::AddressMode::ClampToEdge,
                        address_mode_w: wgpu::AddressMode::ClampToEdge,
                        mag_filter: wgpu::FilterMode::Linear,
                        min_filter: wgpu::FilterMode::Linear,
                        mipmap_filter: wgpu::FilterMode::Nearest,
                        compare: Some(wgpu::CompareFunction::LessEqual),
                        lod_min_clamp: 0.0,
                        lod_max_clamp: 100.0,
                        ..Default::default()
                });

                Self {
                        texture,
                        view,
                        sampler,
                }
        }
}

/// Largest size with the same aspect ratio whose sides fit in `max_dim`.
pub fn fit_within(
        width: u32,
        height: u32,
        max_dim: u32,
) -> (u32, u32)
{
        let largest = width.max(height);

        if largest <= max_dim || max_dim == 0
        {
                return (width, height);
        }

        let scale = max_dim as f64 / largest as f64;

        let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dim);

        (fit(width), fit(height))
}

/// Resamples `image` to `width` x `height`. `None` if its pixel data does not
/// match its declared size.
pub fn downscale(
        image: &ImageData,
        width: u32,
        height: u32,
) -> Option<ImageData>
{
        let buffer = image::RgbaImage::from_raw(image.width, image.height, image.rgba.clone())?;

        let resized = image::imageops::resize(&buffer, width, height, image::imageops::FilterType::Triangle);

        Some(ImageData {
                width,
                height,
                rgba: resized.into_raw(),
        })
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn oversized_equirect_fits_webgl_limit()
        {
                assert_eq!(fit_within(4096, 2048, 2048), (2048, 1024));
                assert_eq!(fit_within(1024, 8192, 2048), (256, 2048));
        }

        #[test]
        fn textures_within_limit_keep_their_size()
        {
                assert_eq!(fit_within(2048, 1024, 2048), (2048, 1024));
                assert_eq!(fit_within(1, 1, 2048), (1, 1));
        }

        #[test]
        fn extreme_aspect_never_collapses_to_zero()
        {
                assert_eq!(fit_within(10_000, 1, 2048), (2048, 1));
        }

        #[test]
        fn downscale_produces_matching_pixel_data()
        {
                let image = ImageData {
                        width: 8,
                        height: 4,
                        rgba: vec![200; 8 * 4 * 4],
                };

                let resized = downscale(&image, 4, 2).unwrap();

                assert_eq!((resized.width, resized.height), (4, 2));
                assert_eq!(resized.rgba.len(), 4 * 2 * 4);
                assert!(resized.rgba.iter().all(|&b| b == 200));
        }

        #[test]
        fn short_pixel_data_is_not_resized()
        {
                let image = ImageData {
                        width: 8,
                        height: 4,
                        rgba: vec![0; 10],
                };

                assert!(downscale(&image, 4, 2).is_none());
        }
}
