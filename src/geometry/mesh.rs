use crate::geometry::vertex::ModelVertex;
use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::{BufferInitDescriptor, DeviceExt};

/// CPU-side primitive as read from a glTF document.
#[derive(Debug, Clone)]
pub struct MeshData
{
        pub name: String,
        pub vertices: Vec<ModelVertex>,
        pub indices: Vec<u32>,
        pub material_id: Option<usize>,
        /// Accumulated node transform inside the asset.
        pub transform: Matrix4<f32>,
}

impl Default for MeshData
{
        fn default() -> Self
        {
                Self {
                        name: String::new(),
                        vertices: Vec::new(),
                        indices: Vec::new(),
                        material_id: None,
                        transform: Matrix4::identity(),
                }
        }
}

/// GPU-side primitive.
#[derive(Debug)]
pub struct Mesh
{
        pub name: String,
        pub vertex_buffer: wgpu::Buffer,
        pub index_buffer: wgpu::Buffer,
        pub num_elements: u32,
        pub material: usize,
        pub local_transform: Matrix4<f32>,
        /// Holds `node transform * local transform`, rewritten every frame.
        pub transform_buffer: wgpu::Buffer,
        pub transform_bind_group: wgpu::BindGroup,
}

impl Mesh
{
        pub fn upload(
                device: &wgpu::Device,
                data: &MeshData,
                transform_bind_group_layout: &wgpu::BindGroupLayout,
        ) -> Self
        {
                let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
                        label: Some(&format!("mesh::{}::vertex_buffer", data.name)),
                        contents: bytemuck::cast_slice(&data.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                });

                let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
                        label: Some(&format!("mesh::{}::index_buffer", data.name)),
                        contents: bytemuck::cast_slice(&data.indices),
                        usage: wgpu::BufferUsages::INDEX,
                });

                let transform: [[f32; 4]; 4] = data.transform.into();

                let transform_buffer = device.create_buffer_init(&BufferInitDescriptor {
                        label: Some(&format!("mesh::{}::transform_buffer", data.name)),
                        contents: bytemuck::cast_slice(&transform),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

                let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: transform_bind_group_layout,
                        entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: transform_buffer.as_entire_binding(),
                        }],
                        label: Some(&format!("mesh::{}::transform_bind_group", data.name)),
                });

                Self {
                        name: data.name.clone(),
                        vertex_buffer,
                        index_buffer,
                        num_elements: data.indices.len() as u32,
                        material: data.material_id.unwrap_or(0),
                        local_transform: data.transform,
                        transform_buffer,
                        transform_bind_group,
                }
        }

        pub fn write_transform(
                &self,
                queue: &wgpu::Queue,
                node_transform: Matrix4<f32>,
        )
        {
                let world: [[f32; 4]; 4] = (node_transform * self.local_transform).into();

                queue.write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&world));
        }
}

pub fn create_transform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout
{
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                        },
                        count: None,
                }],
                label: Some("transform_bind_group_layout"),
        })
}
