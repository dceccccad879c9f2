use crate::texture::Texture;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

#[derive(Debug)]
pub struct SurfaceManager
{
        pub surface: wgpu::Surface<'static>,
        pub configuration: wgpu::SurfaceConfiguration,
        pub depth: Texture,
        pub is_surface_configured: bool,
}

impl SurfaceManager
{
        pub fn new(
                surface: wgpu::Surface<'static>,
                adapter: &wgpu::Adapter,
                device: &wgpu::Device,
                window: &Arc<Window>,
        ) -> Self
        {
                let capabilities = surface.get_capabilities(adapter);

                let format = capabilities
                        .formats
                        .iter()
                        .find(|f| f.is_srgb())
                        .copied()
                        .unwrap_or(capabilities.formats[0]);

                let size = window.inner_size();

                let configuration = wgpu::SurfaceConfiguration {
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                        format,
                        width: size.width.max(1),
                        height: size.height.max(1),
                        present_mode: wgpu::PresentMode::AutoVsync,
                        desired_maximum_frame_latency: 2,
                        alpha_mode: capabilities.alpha_modes[0],
                        view_formats: vec![],
                };

                let depth = Texture::create_depth_texture(device, &configuration, "depth_texture");

                Self {
                        surface,
                        configuration,
                        depth,
                        is_surface_configured: false,
                }
        }

        pub fn format(&self) -> wgpu::TextureFormat
        {
                self.configuration.format
        }

        /// Reconfigures the swapchain. Zero sizes are ignored and oversized
        /// ones are clamped to the device limit.
        pub fn resize(
                &mut self,
                device: &wgpu::Device,
                new_size: PhysicalSize<u32>,
        ) -> PhysicalSize<u32>
        {
                if new_size.width == 0 || new_size.height == 0
                {
                        return PhysicalSize::new(self.configuration.width, self.configuration.height);
                }

                let max_dim = device.limits().max_texture_dimension_2d;

                self.configuration.width = new_size.width.min(max_dim);
                self.configuration.height = new_size.height.min(max_dim);

                self.surface.configure(device, &self.configuration);
                self.depth = Texture::create_depth_texture(device, &self.configuration, "depth_texture");
                self.is_surface_configured = true;

                PhysicalSize::new(self.configuration.width, self.configuration.height)
        }

        pub fn acquire_frame(
                &self,
                device: &wgpu::Device,
        ) -> anyhow::Result<(wgpu::SurfaceTexture, wgpu::TextureView, wgpu::CommandEncoder)>
        {
                let output = self.surface.get_current_texture().map_err(|e| match e
                {
                        // Reconfigure the surface if it's lost or outdated
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated =>
                        {
                                self.surface.configure(device, &self.configuration);
                                anyhow::anyhow!("Surface {e}, reconfigured")
                        }
                        e => anyhow::anyhow!(e),
                })?;

                let view = output
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());

                let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Main Render Encoder"),
                });

                Ok((output, view, encoder))
        }
}
