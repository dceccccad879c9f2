use crate::geometry::mesh::Mesh;
use crate::loader::AssetData;
use crate::material::{Material, MaterialData};
use cgmath::Matrix4;
use std::ops::Range;

/// GPU copy of one scene node's asset.
#[derive(Debug)]
pub struct Model
{
        pub name: String,
        pub meshes: Vec<Mesh>,
        pub materials: Vec<Material>,
}

impl Model
{
        pub fn upload(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                asset: &AssetData,
                material_bind_group_layout: &wgpu::BindGroupLayout,
                transform_bind_group_layout: &wgpu::BindGroupLayout,
        ) -> Self
        {
                let mut materials: Vec<Material> = asset
                        .materials
                        .iter()
                        .map(|data| {
                                Material::upload(
                                        device,
                                        queue,
                                        data,
                                        &asset.images,
                                        material_bind_group_layout,
                                )
                        })
                        .collect();

                // Primitives without a material (or with a dangling index) draw
                // with the last slot, which is the default material.
                let fallback = materials.len();

                materials.push(Material::upload(
                        device,
                        queue,
                        &MaterialData::default(),
                        &asset.images,
                        material_bind_group_layout,
                ));

                let meshes = asset
                        .meshes
                        .iter()
                        .map(|data| {
                                let mut mesh = Mesh::upload(device, data, transform_bind_group_layout);

                                if data.material_id.is_none_or(|id| id >= fallback)
                                {
                                        mesh.material = fallback;
                                }

                                mesh
                        })
                        .collect::<Vec<_>>();

                log::info!(
                        "Uploaded {}: {} meshes, {} materials",
                        asset.name,
                        meshes.len(),
                        materials.len()
                );

                Self {
                        name: asset.name.clone(),
                        meshes,
                        materials,
                }
        }

        pub fn write_transform(
                &self,
                queue: &wgpu::Queue,
                node_transform: Matrix4<f32>,
        )
        {
                for mesh in &self.meshes
                {
                        mesh.write_transform(queue, node_transform);
                }
        }

        pub fn material_for(
                &self,
                mesh: &Mesh,
        ) -> &Material
        {
                &self.materials[mesh.material.min(self.materials.len() - 1)]
        }
}

pub trait DrawModel<'a>
{
        fn draw_mesh(
                &mut self,
                mesh: &'a Mesh,
        );

        fn draw_mesh_instanced(
                &mut self,
                mesh: &'a Mesh,
                instances: Range<u32>,
        );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
        'b: 'a,
{
        fn draw_mesh(
                &mut self,
                mesh: &'b Mesh,
        )
        {
                self.draw_mesh_instanced(mesh, 0..1);
        }

        fn draw_mesh_instanced(
                &mut self,
                mesh: &'b Mesh,
                instances: Range<u32>,
        )
        {
                self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..mesh.num_elements, 0, instances);
        }
}
