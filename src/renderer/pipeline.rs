use crate::geometry::vertex::{LineVertex, ModelVertex, Vertex};
use crate::texture::Texture;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum PipelineKind
{
        /// Depth-only pass from the directional light.
        Shadow,
        /// Lit, shadowed and tone-mapped meshes.
        Geometry,
        /// Unlit debug lines.
        Helper,
}

#[derive(Debug)]
pub struct PipelineManager
{
        pub render_pipelines: HashMap<PipelineKind, wgpu::RenderPipeline>,
}

impl PipelineManager
{
        pub fn new() -> Self
        {
                Self {
                        render_pipelines: HashMap::new(),
                }
        }

        pub fn get(
                &self,
                kind: PipelineKind,
        ) -> Option<&wgpu::RenderPipeline>
        {
                self.render_pipelines.get(&kind)
        }

        fn new_render_pipeline_layout(
                device: &wgpu::Device,
                label: &str,
                bind_groups: &[&wgpu::BindGroupLayout],
        ) -> wgpu::PipelineLayout
        {
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some(label),
                        bind_group_layouts: bind_groups,
                        push_constant_ranges: &[],
                })
        }

        /// Bind groups: camera, mesh transform, material, lighting.
        pub fn build_geometry_pipeline(
                &mut self,
                device: &wgpu::Device,
                format: wgpu::TextureFormat,
                bind_groups: &[&wgpu::BindGroupLayout],
        )
        {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("Geometry Shader"),
                        source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
                });

                let layout =
                        Self::new_render_pipeline_layout(device, "Geometry Pipeline Layout", bind_groups);

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Geometry Pipeline"),
                        layout: Some(&layout),
                        vertex: wgpu::VertexState {
                                module: &shader,
                                entry_point: Some("vs_main"),
                                buffers: &[ModelVertex::desc()],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                                module: &shader,
                                entry_point: Some("fs_main"),
                                targets: &[Some(wgpu::ColorTargetState {
                                        format,
                                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                                        write_mask: wgpu::ColorWrites::ALL,
                                })],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState {
                                topology: wgpu::PrimitiveTopology::TriangleList,
                                strip_index_format: None,
                                front_face: wgpu::FrontFace::Ccw,
                                cull_mode: Some(wgpu::Face::Back),
                                polygon_mode: wgpu::PolygonMode::Fill,
                                conservative: false,
                                unclipped_depth: false,
                        },
                        depth_stencil: Some(wgpu::DepthStencilState {
                                format: Texture::DEPTH_FORMAT,
                                depth_write_enabled: true,
                                depth_compare: wgpu::CompareFunction::Less,
                                stencil: wgpu::StencilState::default(),
                                bias: wgpu::DepthBiasState::default(),
                        }),
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                });

                self.render_pipelines
                        .insert(PipelineKind::Geometry, pipeline);
        }

        /// Bind groups: light camera, mesh transform.
        pub fn build_shadow_pipeline(
                &mut self,
                device: &wgpu::Device,
                bind_groups: &[&wgpu::BindGroupLayout],
        )
        {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("Shadow Shader"),
                        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
                });

                let layout =
                        Self::new_render_pipeline_layout(device, "Shadow Pipeline Layout", bind_groups);

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Shadow Pipeline"),
                        layout: Some(&layout),
                        vertex: wgpu::VertexState {
                                module: &shader,
                                entry_point: Some("vs_main"),
                                buffers: &[ModelVertex::desc()],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: None,
                        primitive: wgpu::PrimitiveState {
                                topology: wgpu::PrimitiveTopology::TriangleList,
                                strip_index_format: None,
                                front_face: wgpu::FrontFace::Ccw,
                                cull_mode: None,
                                polygon_mode: wgpu::PolygonMode::Fill,
                                conservative: false,
                                unclipped_depth: false,
                        },
                        depth_stencil: Some(wgpu::DepthStencilState {
                                format: Texture::DEPTH_FORMAT,
                                depth_write_enabled: true,
                                depth_compare: wgpu::CompareFunction::LessEqual,
                                stencil: wgpu::StencilState::default(),
                                bias: wgpu::DepthBiasState {
                                        constant: 2,
                                        slope_scale: 2.0,
                                        clamp: 0.0,
                                },
                        }),
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                });

                self.render_pipelines.insert(PipelineKind::Shadow, pipeline);
        }

        /// Bind groups: camera.
        pub fn build_helper_pipeline(
                &mut self,
                device: &wgpu::Device,
                format: wgpu::TextureFormat,
                bind_groups: &[&wgpu::BindGroupLayout],
        )
        {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("Helper Shader"),
                        source: wgpu::ShaderSource::Wgsl(include_str!("helper.wgsl").into()),
                });

                let layout =
                        Self::new_render_pipeline_layout(device, "Helper Pipeline Layout", bind_groups);

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Helper Pipeline"),
                        layout: Some(&layout),
                        vertex: wgpu::VertexState {
                                module: &shader,
                                entry_point: Some("vs_main"),
                                buffers: &[LineVertex::desc()],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                                module: &shader,
                                entry_point: Some("fs_main"),
                                targets: &[Some(wgpu::ColorTargetState {
                                        format,
                                        blend: Some(wgpu::BlendState::REPLACE),
                                        write_mask: wgpu::ColorWrites::ALL,
                                })],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState {
                                topology: wgpu::PrimitiveTopology::LineList,
                                ..Default::default()
                        },
                        depth_stencil: Some(wgpu::DepthStencilState {
                                format: Texture::DEPTH_FORMAT,
                                depth_write_enabled: false,
                                depth_compare: wgpu::CompareFunction::LessEqual,
                                stencil: wgpu::StencilState::default(),
                                bias: wgpu::DepthBiasState::default(),
                        }),
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                });

                self.render_pipelines.insert(PipelineKind::Helper, pipeline);
        }
}
