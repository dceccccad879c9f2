//! GPU side of the viewport.
//!
//! [`Renderer`] owns the device, the swapchain, the render graph and the GPU
//! copies of scene nodes. It reads the CPU [`Scene`] every frame and never
//! writes to it.

pub mod graph;
pub mod pipeline;
pub mod surface;

use crate::camera::{Camera, CameraUniform, OPENGL_TO_WGPU_MATRIX};
use crate::geometry::mesh::create_transform_bind_group_layout;
use crate::geometry::vertex::LineVertex;
use crate::loader::ImageData;
use crate::material::create_material_bind_group_layout;
use crate::model::Model;
use crate::renderer::graph::{FrameContext, RenderGraph};
use crate::renderer::pipeline::PipelineManager;
use crate::renderer::surface::SurfaceManager;
use crate::scene::{DirectionalLight, NodeId, Scene};
use crate::texture::Texture;
use crate::ui::panel::DebugPanel;
use crate::ui::renderer::GuiRenderer;
use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3, ortho};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

const HELPER_VERTEX_CAPACITY: usize = 8;

/// Half extent of the square the shadow camera covers.
const SHADOW_EXTENT: f32 = 6.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform
{
        pub light_view_proj: [[f32; 4]; 4],
        pub ambient: [f32; 4],
        pub directional: [f32; 4],
        pub direction: [f32; 4],
        /// x: exposure, y: environment loaded, z: shadows enabled.
        pub params: [f32; 4],
}

impl LightingUniform
{
        pub fn from_scene(scene: &Scene) -> Self
        {
                let ambient = scene.ambient.color.map(|c| c * scene.ambient.intensity);
                let directional = scene.directional.color.map(|c| c * scene.directional.intensity);
                let visible = if scene.directional.visible { 1.0 } else { 0.0 };
                let direction = light_direction(&scene.directional);

                Self {
                        light_view_proj: light_view_proj(scene.directional.position).into(),
                        ambient: [ambient[0], ambient[1], ambient[2], 1.0],
                        directional: [directional[0], directional[1], directional[2], visible],
                        direction: [direction.x, direction.y, direction.z, 0.0],
                        params: [
                                scene.environment.exposure,
                                if scene.environment.loaded { 1.0 } else { 0.0 },
                                visible,
                                0.0,
                        ],
                }
        }
}

/// Unit vector from the origin towards the light.
pub fn light_direction(light: &DirectionalLight) -> Vector3<f32>
{
        let v = light.position.to_vec();

        if v.magnitude2() == 0.0
        {
                Vector3::unit_y()
        }
        else
        {
                v.normalize()
        }
}

/// Orthographic view-projection of the directional light aimed at the origin.
pub fn light_view_proj(position: Point3<f32>) -> Matrix4<f32>
{
        let dir = position.to_vec();
        let distance = dir.magnitude().max(0.1);

        let up = if dir.x.abs() < 1e-4 && dir.z.abs() < 1e-4
        {
                Vector3::unit_z()
        }
        else
        {
                Vector3::unit_y()
        };

        let view = Matrix4::look_at_rh(position, Point3::origin(), up);
        let projection = ortho(
                -SHADOW_EXTENT,
                SHADOW_EXTENT,
                -SHADOW_EXTENT,
                SHADOW_EXTENT,
                0.1,
                distance + SHADOW_EXTENT * 2.0,
        );

        OPENGL_TO_WGPU_MATRIX * projection * view
}

/// A line from the light to the origin plus a small cross at the light.
pub fn helper_lines(light: &DirectionalLight) -> Vec<LineVertex>
{
        let p: [f32; 3] = light.position.into();
        let color = [1.0, 0.85, 0.2];
        let s = 0.25;

        let v = |position: [f32; 3]| LineVertex {
                position,
                color,
        };

        vec![
                v(p),
                v([0.0, 0.0, 0.0]),
                v([p[0] - s, p[1], p[2]]),
                v([p[0] + s, p[1], p[2]]),
                v([p[0], p[1] - s, p[2]]),
                v([p[0], p[1] + s, p[2]]),
                v([p[0], p[1], p[2] - s]),
                v([p[0], p[1], p[2] + s]),
        ]
}

#[derive(Debug)]
pub struct Renderer
{
        window: Arc<Window>,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: SurfaceManager,
        pipeline_manager: PipelineManager,
        render_graph: RenderGraph,
        gui: GuiRenderer,

        camera_buffer: wgpu::Buffer,
        camera_bind_group: wgpu::BindGroup,
        light_camera_buffer: wgpu::Buffer,
        light_camera_bind_group: wgpu::BindGroup,

        lighting_buffer: wgpu::Buffer,
        lighting_layout: wgpu::BindGroupLayout,
        lighting_bind_group: wgpu::BindGroup,
        environment: Texture,
        shadow_map: Texture,

        material_layout: wgpu::BindGroupLayout,
        transform_layout: wgpu::BindGroupLayout,
        models: HashMap<NodeId, Model>,

        helper_buffer: wgpu::Buffer,
        helper_vertex_count: u32,

        /// Backing-buffer pixels per physical window pixel.
        surface_scale: f32,
}

impl Renderer
{
        pub async fn new(
                window: Arc<Window>,
                camera: &Camera,
                shadow_map_size: u32,
        ) -> anyhow::Result<Self>
        {
                let instance = Self::instance();

                #[cfg(not(target_arch = "wasm32"))]
                Self::log_all_adapters(&instance);

                let surface = instance.create_surface(window.clone())?;

                let adapter = Self::adapter(&instance, &surface).await?;

                log::info!("Adapter Info: {:#?}", adapter.get_info());

                let (device, queue) = Self::device_queue(&adapter).await?;

                let surface = SurfaceManager::new(surface, &adapter, &device, &window);

                let camera_layout = Camera::get_bind_group_layout(&device);
                let transform_layout = create_transform_bind_group_layout(&device);
                let material_layout = create_material_bind_group_layout(&device);
                let lighting_layout = Self::lighting_bind_group_layout(&device);

                let camera_buffer = camera.get_buffer(&device);
                let camera_bind_group = Camera::get_bind_group(&device, &camera_layout, &camera_buffer);

                let light_camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Light Camera Buffer"),
                        contents: bytemuck::cast_slice(&[CameraUniform::new()]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let light_camera_bind_group =
                        Camera::get_bind_group(&device, &camera_layout, &light_camera_buffer);

                let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Lighting Buffer"),
                        size: size_of::<LightingUniform>() as wgpu::BufferAddress,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                });

                let environment = Texture::neutral_environment(&device, &queue);
                let shadow_map = Texture::create_shadow_map(&device, shadow_map_size);

                let lighting_bind_group = Self::lighting_bind_group(
                        &device,
                        &lighting_layout,
                        &lighting_buffer,
                        &environment,
                        &shadow_map,
                );

                let mut pipeline_manager = PipelineManager::new();

                pipeline_manager.build_shadow_pipeline(&device, &[&camera_layout, &transform_layout]);
                pipeline_manager.build_geometry_pipeline(
                        &device,
                        surface.format(),
                        &[&camera_layout, &transform_layout, &material_layout, &lighting_layout],
                );
                pipeline_manager.build_helper_pipeline(&device, surface.format(), &[&camera_layout]);

                let helper_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Helper Vertex Buffer"),
                        size: (HELPER_VERTEX_CAPACITY * size_of::<LineVertex>()) as wgpu::BufferAddress,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                });

                let gui = GuiRenderer::new(&device, surface.format(), None, 1, &window);

                Ok(Self {
                        window,
                        adapter,
                        device,
                        queue,
                        surface,
                        pipeline_manager,
                        render_graph: RenderGraph::showcase(),
                        gui,
                        camera_buffer,
                        camera_bind_group,
                        light_camera_buffer,
                        light_camera_bind_group,
                        lighting_buffer,
                        lighting_layout,
                        lighting_bind_group,
                        environment,
                        shadow_map,
                        material_layout,
                        transform_layout,
                        models: HashMap::new(),
                        helper_buffer,
                        helper_vertex_count: 0,
                        surface_scale: 1.0,
                })
        }

        fn instance() -> wgpu::Instance
        {
                wgpu::Instance::new(&wgpu::InstanceDescriptor {
                        #[cfg(not(target_arch = "wasm32"))]
                        backends: wgpu::Backends::PRIMARY,
                        #[cfg(target_arch = "wasm32")]
                        backends: wgpu::Backends::GL,
                        ..Default::default()
                })
        }

        #[cfg(not(target_arch = "wasm32"))]
        fn log_all_adapters(instance: &wgpu::Instance)
        {
                log::info!("All Available Adapters:");

                instance.enumerate_adapters(wgpu::Backends::all())
                        .iter()
                        .for_each(|a| log::info!("\t{:?}", a.get_info()));
        }

        async fn adapter(
                instance: &wgpu::Instance,
                surface: &wgpu::Surface<'_>,
        ) -> anyhow::Result<wgpu::Adapter>
        {
                let adapter = instance
                        .request_adapter(&wgpu::RequestAdapterOptions {
                                power_preference: wgpu::PowerPreference::HighPerformance,
                                compatible_surface: Some(surface),
                                force_fallback_adapter: false,
                        })
                        .await
                        .map_err(|e| anyhow::anyhow!(e))?;

                Ok(adapter)
        }

        async fn device_queue(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)>
        {
                let device_queue = adapter
                        .request_device(&wgpu::DeviceDescriptor {
                                label: None,
                                required_features: wgpu::Features::empty(),
                                // WebGL doesn't support all of wgpu's features.
                                required_limits: if cfg!(target_arch = "wasm32")
                                {
                                        wgpu::Limits::downlevel_webgl2_defaults()
                                }
                                else
                                {
                                        wgpu::Limits::default()
                                },
                                memory_hints: Default::default(),
                                trace: wgpu::Trace::Off,
                        })
                        .await?;

                Ok(device_queue)
        }

        fn lighting_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout
        {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        entries: &[
                                wgpu::BindGroupLayoutEntry {
                                        binding: 0,
                                        visibility: wgpu::ShaderStages::VERTEX
                                                | wgpu::ShaderStages::FRAGMENT,
                                        ty: wgpu::BindingType::Buffer {
                                                ty: wgpu::BufferBindingType::Uniform,
                                                has_dynamic_offset: false,
                                                min_binding_size: None,
                                        },
                                        count: None,
                                },
                                // Environment map
                                wgpu::BindGroupLayoutEntry {
                                        binding: 1,
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
                                wgpu::BindGroupLayoutEntry {
                                        binding: 2,
                                        visibility: wgpu::ShaderStages::FRAGMENT,
                                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                                        count: None,
                                },
                                // Shadow map
                                wgpu::BindGroupLayoutEntry {
                                        binding: 3,
                                        visibility: wgpu::ShaderStages::FRAGMENT,
                                        ty: wgpu::BindingType::Texture {
                                                sample_type: wgpu::TextureSampleType::Depth,
                                                view_dimension: wgpu::TextureViewDimension::D2,
                                                multisampled: false,
                                        },
                                        count: None,
                                },
                                wgpu::BindGroupLayoutEntry {
                                        binding: 4,
                                        visibility: wgpu::ShaderStages::FRAGMENT,
                                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                                        count: None,
                                },
                        ],
                        label: Some("lighting_bind_group_layout"),
                })
        }

        fn lighting_bind_group(
                device: &wgpu::Device,
                layout: &wgpu::BindGroupLayout,
                buffer: &wgpu::Buffer,
                environment: &Texture,
                shadow_map: &Texture,
        ) -> wgpu::BindGroup
        {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout,
                        entries: &[
                                wgpu::BindGroupEntry {
                                        binding: 0,
                                        resource: buffer.as_entire_binding(),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 1,
                                        resource: wgpu::BindingResource::TextureView(&environment.view),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 2,
                                        resource: wgpu::BindingResource::Sampler(&environment.sampler),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 3,
                                        resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 4,
                                        resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                                },
                        ],
                        label: Some("lighting_bind_group"),
                })
        }

        /// Replaces the neutral environment with a decoded map.
        pub fn set_environment(
                &mut self,
                image: &ImageData,
        )
        {
                self.environment = Texture::from_image(&self.device, &self.queue, image, "Environment Map");

                self.lighting_bind_group = Self::lighting_bind_group(
                        &self.device,
                        &self.lighting_layout,
                        &self.lighting_buffer,
                        &self.environment,
                        &self.shadow_map,
                );

                log::info!("Environment map applied ({}x{})", image.width, image.height);
        }

        /// Resizes the backing buffer, returning the size actually used.
        pub fn resize(
                &mut self,
                backing: PhysicalSize<u32>,
                surface_scale: f32,
        ) -> PhysicalSize<u32>
        {
                self.surface_scale = surface_scale;

                self.surface.resize(&self.device, backing)
        }

        pub fn handle_gui_input(
                &mut self,
                event: &WindowEvent,
        ) -> bool
        {
                self.gui.handle_input(&self.window, event)
        }

        pub fn window(&self) -> &Arc<Window>
        {
                &self.window
        }

        pub fn adapter_name(&self) -> String
        {
                self.adapter.get_info().name
        }

        /// Brings GPU copies in line with the scene: uploads new nodes and
        /// rewrites transforms, camera and lighting uniforms.
        pub fn sync(
                &mut self,
                scene: &Scene,
                camera: &Camera,
        )
        {
                for (id, node) in scene.nodes()
                {
                        let model = self.models.entry(id).or_insert_with(|| {
                                Model::upload(
                                        &self.device,
                                        &self.queue,
                                        &node.asset,
                                        &self.material_layout,
                                        &self.transform_layout,
                                )
                        });

                        model.write_transform(&self.queue, node.transform.matrix());
                }

                self.queue
                        .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera.uniform]));

                let lighting = LightingUniform::from_scene(scene);

                let light_camera = CameraUniform {
                        view_position: scene.directional.position.to_homogeneous().into(),
                        view_proj: lighting.light_view_proj,
                };

                self.queue.write_buffer(
                        &self.light_camera_buffer,
                        0,
                        bytemuck::cast_slice(&[light_camera]),
                );
                self.queue
                        .write_buffer(&self.lighting_buffer, 0, bytemuck::cast_slice(&[lighting]));

                self.helper_vertex_count = if scene.directional.helper_visible
                {
                        let lines = helper_lines(&scene.directional);
                        self.queue
                                .write_buffer(&self.helper_buffer, 0, bytemuck::cast_slice(&lines));
                        lines.len() as u32
                }
                else
                {
                        0
                };
        }

        /// Draws the scene and the panel into the next swapchain image.
        pub fn render(
                &mut self,
                scene: &Scene,
                panel: &mut DebugPanel,
        ) -> anyhow::Result<()>
        {
                // Nothing to draw into until the first resize configured the surface.
                if !self.surface.is_surface_configured
                {
                        return Ok(());
                }

                let (output, view, mut encoder) = self.surface.acquire_frame(&self.device)?;

                {
                        let frame = FrameContext {
                                view: &view,
                                depth: &self.surface.depth,
                                shadow_map: &self.shadow_map,
                                pipelines: &self.pipeline_manager,
                                camera: &self.camera_bind_group,
                                light_camera: &self.light_camera_bind_group,
                                lighting: &self.lighting_bind_group,
                                models: &self.models,
                                helper_vertices: &self.helper_buffer,
                                helper_vertex_count: self.helper_vertex_count,
                                scene,
                        };

                        self.render_graph.execute(&mut encoder, &frame);
                }

                let pixels_per_point = self.window.scale_factor() as f32 * panel.ui_scale;

                self.gui.begin_frame(&self.window, pixels_per_point);

                panel.show(self.gui.context(), scene, &mut self.render_graph);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                        size_in_pixels: [
                                self.surface.configuration.width,
                                self.surface.configuration.height,
                        ],
                        pixels_per_point: pixels_per_point * self.surface_scale,
                };

                self.gui.end_frame_and_draw(
                        &self.device,
                        &self.queue,
                        &mut encoder,
                        &self.window,
                        &view,
                        screen_descriptor,
                )?;

                self.queue.submit(std::iter::once(encoder.finish()));

                output.present();

                Ok(())
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::config::LightingConfig;
        use cgmath::Transform;

        #[test]
        fn lighting_uniform_premultiplies_intensity()
        {
                let mut scene = Scene::new(&LightingConfig::default());
                scene.ambient.color = [1.0, 0.5, 0.0];
                scene.ambient.intensity = 2.0;
                scene.environment.exposure = 1.5;

                let uniform = LightingUniform::from_scene(&scene);

                assert_eq!(&uniform.ambient[..3], &[2.0, 1.0, 0.0]);
                assert_eq!(uniform.params[0], 1.5);
                assert_eq!(uniform.params[1], 0.0);
        }

        #[test]
        fn hidden_light_contributes_nothing()
        {
                let mut scene = Scene::new(&LightingConfig::default());
                scene.directional.visible = false;

                let uniform = LightingUniform::from_scene(&scene);

                assert_eq!(uniform.directional[3], 0.0);
                assert_eq!(uniform.params[2], 0.0);
        }

        #[test]
        fn shadow_camera_sees_the_origin()
        {
                let m = light_view_proj(Point3::new(3.0, 5.0, 4.0));
                let p = m.transform_point(Point3::origin());

                assert!(p.x.abs() < 1e-4);
                assert!(p.y.abs() < 1e-4);
                assert!(p.z > 0.0 && p.z < 1.0);
        }

        #[test]
        fn overhead_light_still_has_a_view()
        {
                let m = light_view_proj(Point3::new(0.0, 10.0, 0.0));
                let p = m.transform_point(Point3::origin());

                assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        }

        #[test]
        fn helper_runs_from_light_to_origin()
        {
                let scene = Scene::new(&LightingConfig::default());
                let lines = helper_lines(&scene.directional);

                assert_eq!(lines.len(), HELPER_VERTEX_CAPACITY);
                assert_eq!(lines[0].position, [3.0, 5.0, 4.0]);
                assert_eq!(lines[1].position, [0.0, 0.0, 0.0]);
        }
}
