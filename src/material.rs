use crate::loader::ImageData;
use crate::texture::Texture;
use wgpu::util::DeviceExt;

#[derive(Debug, Clone)]
pub struct MaterialData
{
        pub name: String,
        pub base_color_factor: [f32; 4],
        pub metallic_factor: f32,
        pub roughness_factor: f32,
        /// Index into the asset's image list.
        pub base_color_texture_index: Option<usize>,
}

impl Default for MaterialData
{
        fn default() -> Self
        {
                Self {
                        name: "default".to_string(),
                        base_color_factor: [1.0, 1.0, 1.0, 1.0],
                        metallic_factor: 1.0,
                        roughness_factor: 1.0,
                        base_color_texture_index: None,
                }
        }
}

#[derive(Debug)]
pub struct Material
{
        pub name: String,
        pub base_color_texture: Texture,
        pub material_bind_group: wgpu::BindGroup,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialProperties
{
        pub base_color_factor: [f32; 4],
        pub metallic_factor: f32,
        pub roughness_factor: f32,
        // Padding to meet WGSL alignment requirements (16 bytes)
        pub _padding: [f32; 2],
}

impl Material
{
        pub fn upload(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                data: &MaterialData,
                images: &[ImageData],
                layout: &wgpu::BindGroupLayout,
        ) -> Self
        {
                let base_color_texture = data
                        .base_color_texture_index
                        .and_then(|idx| images.get(idx))
                        .map(|image| {
                                Texture::from_image(
                                        device,
                                        queue,
                                        image,
                                        &format!("{} base color", data.name),
                                )
                        })
                        .unwrap_or_else(|| Texture::create_dummy(device, queue));

                let properties = MaterialProperties {
                        base_color_factor: data.base_color_factor,
                        metallic_factor: data.metallic_factor,
                        roughness_factor: data.roughness_factor,
                        _padding: [0.0; 2],
                };

                let properties_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Material Properties Buffer"),
                        contents: bytemuck::cast_slice(&[properties]),
                        usage: wgpu::BufferUsages::UNIFORM,
                });

                let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout,
                        entries: &[
                                wgpu::BindGroupEntry {
                                        binding: 0,
                                        resource: wgpu::BindingResource::TextureView(
                                                &base_color_texture.view,
                                        ),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 1,
                                        resource: wgpu::BindingResource::Sampler(
                                                &base_color_texture.sampler,
                                        ),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 2,
                                        resource: properties_buffer.as_entire_binding(),
                                },
                        ],
                        label: Some(&format!("{} Material Bind Group", data.name)),
                });

                Self {
                        name: data.name.clone(),
                        base_color_texture,
                        material_bind_group,
                }
        }
}

pub fn create_material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout
{
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                        // Base color texture
                        wgpu::BindGroupLayoutEntry {
                                binding: 0,
                                visibility: wgpu::ShaderStages::FRAGMENT,
                                ty: wgpu::BindingType::Texture {
                                        sample_type: wgpu::TextureSampleType::Float {
                                                filterable: true,
                                        },
                                        view_dimension: wgpu::TextureViewDimension::D2,
                                        multisampled: false,
                                },
                                count: None,
                        },
                        // Base color sampler
                        wgpu::BindGroupLayoutEntry {
                                binding: 1,
                                visibility: wgpu::ShaderStages::FRAGMENT,
                                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                                count: None,
                        },
                        // Material properties uniform
                        wgpu::BindGroupLayoutEntry {
                                binding: 2,
                                visibility: wgpu::ShaderStages::FRAGMENT,
                                ty: wgpu::BindingType::Buffer {
                                        ty: wgpu::BufferBindingType::Uniform,
                                        has_dynamic_offset: false,
                                        min_binding_size: None,
                                },
                                count: None,
                        },
                ],
                label: Some("material_bind_group_layout"),
        })
}
