use crate::model::{DrawModel, Model};
use crate::renderer::pipeline::{PipelineKind, PipelineManager};
use crate::scene::{NodeId, Scene};
use crate::texture::Texture;
use derivative::Derivative;
use std::collections::HashMap;

/// Everything a pass may read while recording one frame.
pub struct FrameContext<'a>
{
        pub view: &'a wgpu::TextureView,
        pub depth: &'a Texture,
        pub shadow_map: &'a Texture,
        pub pipelines: &'a PipelineManager,
        pub camera: &'a wgpu::BindGroup,
        pub light_camera: &'a wgpu::BindGroup,
        pub lighting: &'a wgpu::BindGroup,
        pub models: &'a HashMap<NodeId, Model>,
        pub helper_vertices: &'a wgpu::Buffer,
        pub helper_vertex_count: u32,
        pub scene: &'a Scene,
}

impl FrameContext<'_>
{
        /// Models whose node is currently visible.
        fn visible_models(&self) -> impl Iterator<Item = &Model>
        {
                self.models.iter().filter_map(move |(id, model)| {
                        self.scene
                                .node(*id)
                                .filter(|node| node.visible)
                                .map(|_| model)
                })
        }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct RenderGraph
{
        #[derivative(Debug = "ignore")]
        pub passes: Vec<Box<dyn RenderPass>>,
}

impl RenderGraph
{
        pub fn new() -> Self
        {
                Self {
                        passes: Vec::new(),
                }
        }

        /// Shadow, background, geometry, helper.
        pub fn showcase() -> Self
        {
                let mut graph = Self::new();

                graph.add_pass(Box::new(ShadowPass::new("shadow_pass")));
                graph.add_pass(Box::new(BackgroundPass::new("background_pass")));
                graph.add_pass(Box::new(GeometryPass::new("geometry_pass")));
                graph.add_pass(Box::new(HelperPass::new("helper_pass")));

                graph
        }

        pub fn add_pass(
                &mut self,
                pass: Box<dyn RenderPass>,
        )
        {
                self.passes.push(pass);
        }

        pub fn execute(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        )
        {
                for pass in self.passes.iter_mut()
                {
                        if pass.enabled()
                        {
                                pass.record(encoder, frame);
                        }
                }
        }

        pub fn pass_names(&self) -> Vec<&str>
        {
                self.passes.iter().map(|p| p.name()).collect()
        }
}

pub trait RenderPass
{
        fn name(&self) -> &str;

        fn ui(
                &mut self,
                ui: &mut egui::Ui,
        );

        fn enabled(&self) -> bool;

        fn set_enabled(
                &mut self,
                value: bool,
        );

        fn record(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        );
}

macro_rules! pass_common {
        () => {
                fn name(&self) -> &str
                {
                        self.name.as_str()
                }

                fn enabled(&self) -> bool
                {
                        self.enabled
                }

                fn set_enabled(
                        &mut self,
                        value: bool,
                )
                {
                        self.enabled = value;
                }
        };
}

/// Renders the scene depth from the directional light.
#[derive(Debug)]
pub struct ShadowPass
{
        pub name: String,
        pub enabled: bool,
}

impl ShadowPass
{
        pub fn new(name: &str) -> Self
        {
                Self {
                        name: name.to_string(),
                        enabled: true,
                }
        }
}

impl RenderPass for ShadowPass
{
        pass_common!();

        fn ui(
                &mut self,
                ui: &mut egui::Ui,
        )
        {
                ui.label(&self.name);
                ui.label("Depth only, directional light view");
        }

        fn record(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        )
        {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(&self.name),
                        color_attachments: &[],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                view: &frame.shadow_map.view,
                                depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                });

                // The map is still cleared so a hidden light casts nothing.
                if !frame.scene.directional.visible
                {
                        return;
                }

                let Some(pipeline) = frame.pipelines.get(PipelineKind::Shadow)
                else
                {
                        return;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, frame.light_camera, &[]);

                for model in frame.visible_models()
                {
                        for mesh in model.meshes.iter()
                        {
                                render_pass.set_bind_group(1, &mesh.transform_bind_group, &[]);
                                render_pass.draw_mesh(mesh);
                        }
                }
        }
}

/// Clears the frame to the scene background colour.
#[derive(Debug)]
pub struct BackgroundPass
{
        pub name: String,
        pub enabled: bool,
}

impl BackgroundPass
{
        pub fn new(name: &str) -> Self
        {
                Self {
                        name: name.to_string(),
                        enabled: true,
                }
        }
}

impl RenderPass for BackgroundPass
{
        pass_common!();

        fn ui(
                &mut self,
                ui: &mut egui::Ui,
        )
        {
                ui.label(&self.name);
                ui.label("LoadOp: Clear");
        }

        fn record(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        )
        {
                let [r, g, b] = frame.scene.background;

                let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(&self.name),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: frame.view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(wgpu::Color {
                                                r: r as f64,
                                                g: g as f64,
                                                b: b as f64,
                                                a: 1.0,
                                        }),
                                        store: wgpu::StoreOp::Store,
                                },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                view: &frame.depth.view,
                                depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                });
        }
}

/// Lit scene geometry.
#[derive(Debug)]
pub struct GeometryPass
{
        pub name: String,
        pub enabled: bool,
}

impl GeometryPass
{
        pub fn new(name: &str) -> Self
        {
                Self {
                        name: name.to_string(),
                        enabled: true,
                }
        }
}

impl RenderPass for GeometryPass
{
        pass_common!();

        fn ui(
                &mut self,
                ui: &mut egui::Ui,
        )
        {
                ui.label(&self.name);
                ui.label("LoadOp: Load, tone mapped");
        }

        fn record(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        )
        {
                let Some(pipeline) = frame.pipelines.get(PipelineKind::Geometry)
                else
                {
                        return;
                };

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(&self.name),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: frame.view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                view: &frame.depth.view,
                                depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                });

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, frame.camera, &[]);
                render_pass.set_bind_group(3, frame.lighting, &[]);

                for model in frame.visible_models()
                {
                        for mesh in model.meshes.iter()
                        {
                                render_pass.set_bind_group(1, &mesh.transform_bind_group, &[]);
                                render_pass.set_bind_group(
                                        2,
                                        &model.material_for(mesh).material_bind_group,
                                        &[],
                                );

                                render_pass.draw_mesh(mesh);
                        }
                }
        }
}

/// Directional light helper lines.
#[derive(Debug)]
pub struct HelperPass
{
        pub name: String,
        pub enabled: bool,
}

impl HelperPass
{
        pub fn new(name: &str) -> Self
        {
                Self {
                        name: name.to_string(),
                        enabled: true,
                }
        }
}

impl RenderPass for HelperPass
{
        pass_common!();

        fn ui(
                &mut self,
                ui: &mut egui::Ui,
        )
        {
                ui.label(&self.name);
                ui.label("Line list, depth tested");
        }

        fn record(
                &mut self,
                encoder: &mut wgpu::CommandEncoder,
                frame: &FrameContext,
        )
        {
                if !frame.scene.directional.helper_visible || frame.helper_vertex_count == 0
                {
                        return;
                }

                let Some(pipeline) = frame.pipelines.get(PipelineKind::Helper)
                else
                {
                        return;
                };

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(&self.name),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: frame.view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                view: &frame.depth.view,
                                depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                });

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, frame.camera, &[]);
                render_pass.set_vertex_buffer(0, frame.helper_vertices.slice(..));
                render_pass.draw(0..frame.helper_vertex_count, 0..1);
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn showcase_graph_orders_passes()
        {
                let graph = RenderGraph::showcase();

                assert_eq!(
                        graph.pass_names(),
                        vec!["shadow_pass", "background_pass", "geometry_pass", "helper_pass"]
                );
                assert!(graph.passes.iter().all(|p| p.enabled()));
        }
}
