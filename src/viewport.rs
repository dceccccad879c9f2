use crate::camera::Camera;
use crate::config::Config;
use crate::loader;
use crate::renderer::Renderer;
use crate::scene::{self, Scene, SceneRoot};
use crate::ui::panel::DebugPanel;
use std::sync::Arc;
use std::time::Duration;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

/// Device pixel ratios above this are clamped.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Owns the scene, the camera and, once a window exists, the renderer.
///
/// Everything except the renderer works without a GPU so sizing and pointer
/// math can be exercised headless.
pub struct Viewport
{
        config: Config,
        scene: SceneRoot,
        camera: Camera,
        panel: DebugPanel,
        renderer: Option<Renderer>,

        logical_size: (f64, f64),
        scale_factor: f64,
        pixel_ratio: f64,
        resize_count: u32,
}

impl Viewport
{
        pub fn new(config: &Config) -> Self
        {
                Self {
                        config: config.clone(),
                        scene: scene::new_root(Scene::new(&config.lighting)),
                        camera: Camera::new(&config.camera),
                        panel: DebugPanel::new(config.ui.show_panel, config.ui.scale)
                                .with_toggle_key(config.input.panel_key),
                        renderer: None,
                        logical_size: (0.0, 0.0),
                        scale_factor: 1.0,
                        pixel_ratio: 1.0,
                        resize_count: 0,
                }
        }

        /// Creates the GPU renderer for `window` and applies the environment map.
        ///
        /// A missing or undecodable environment is logged and the neutral
        /// fallback stays bound; only renderer creation can fail.
        pub async fn initialize(
                &mut self,
                window: Arc<Window>,
        ) -> anyhow::Result<()>
        {
                let renderer = Renderer::new(
                        window.clone(),
                        &self.camera,
                        self.config.lighting.shadow_map_size,
                )
                .await?;

                log::info!("Renderer ready on {}", renderer.adapter_name());

                self.renderer = Some(renderer);

                match loader::load_environment(&self.config.assets.root, &self.config.assets.environment)
                        .await
                {
                        Ok(image) =>
                        {
                                if let Some(renderer) = self.renderer.as_mut()
                                {
                                        renderer.set_environment(&image);
                                }

                                scene::lock(&self.scene).environment.loaded = true;
                        }
                        Err(e) =>
                        {
                                log::warn!("Environment map unavailable, using neutral lighting: {e}");
                        }
                }

                self.handle_resize(window.inner_size(), window.scale_factor());

                Ok(())
        }

        pub fn scene(&self) -> SceneRoot
        {
                self.scene.clone()
        }

        pub fn camera(&self) -> &Camera
        {
                &self.camera
        }

        pub fn panel(&self) -> &DebugPanel
        {
                &self.panel
        }

        pub fn panel_mut(&mut self) -> &mut DebugPanel
        {
                &mut self.panel
        }

        pub fn window(&self) -> Option<&Arc<Window>>
        {
                self.renderer.as_ref().map(|r| r.window())
        }

        pub fn logical_size(&self) -> (f64, f64)
        {
                self.logical_size
        }

        pub fn pixel_ratio(&self) -> f64
        {
                self.pixel_ratio
        }

        pub fn resize_count(&self) -> u32
        {
                self.resize_count
        }

        pub fn step_animations(
                &mut self,
                dt: Duration,
        )
        {
                scene::lock(&self.scene).step_animations(dt);
        }

        /// Lets the panel see a window event first. Returns true if it took it.
        pub fn gui_event(
                &mut self,
                event: &WindowEvent,
        ) -> bool
        {
                match self.renderer.as_mut()
                {
                        Some(renderer) => renderer.handle_gui_input(event),
                        None => false,
                }
        }

        /// Renders one frame of the current scene from the current camera.
        pub fn update_frame(&mut self)
        {
                let mut scene = scene::lock(&self.scene);

                self.panel.apply_pending(&mut scene);

                let Some(renderer) = self.renderer.as_mut()
                else
                {
                        return;
                };

                renderer.sync(&scene, &self.camera);

                if let Err(e) = renderer.render(&scene, &mut self.panel)
                {
                        log::error!("Unable to render: {e}");
                }
        }

        /// Matches the camera and drawing buffer to a new window size.
        ///
        /// `size` is in physical pixels. The camera aspect follows the logical
        /// size while the backing buffer uses the scale factor capped at
        /// [`MAX_PIXEL_RATIO`]. Zero-sized windows are ignored.
        pub fn handle_resize(
                &mut self,
                size: PhysicalSize<u32>,
                scale_factor: f64,
        )
        {
                if size.width == 0 || size.height == 0
                {
                        log::debug!("Ignoring zero-sized resize");
                        return;
                }

                let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };

                let logical = size.to_logical::<f64>(scale_factor);

                self.scale_factor = scale_factor;
                self.logical_size = (logical.width, logical.height);
                self.pixel_ratio = scale_factor.min(MAX_PIXEL_RATIO);

                self.camera
                        .resize(logical.width as f32, logical.height as f32);

                let backing = PhysicalSize::new(
                        (logical.width * self.pixel_ratio).round().max(1.0) as u32,
                        (logical.height * self.pixel_ratio).round().max(1.0) as u32,
                );

                if let Some(renderer) = self.renderer.as_mut()
                {
                        let used = renderer.resize(backing, (self.pixel_ratio / scale_factor) as f32);

                        log::debug!(
                                "Viewport {:.0}x{:.0} @ {:.2}x, buffer {}x{}",
                                logical.width,
                                logical.height,
                                self.pixel_ratio,
                                used.width,
                                used.height
                        );
                }

                self.resize_count += 1;
        }

        /// Maps a pointer position in logical pixels to [-1, 1] on both axes,
        /// with +y pointing up.
        pub fn normalize_pointer(
                &self,
                x: f64,
                y: f64,
        ) -> Option<(f32, f32)>
        {
                let (w, h) = self.logical_size;

                if w <= 0.0 || h <= 0.0
                {
                        return None;
                }

                let nx = (x / w) * 2.0 - 1.0;
                let ny = -(y / h) * 2.0 + 1.0;

                Some((nx as f32, ny as f32))
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        fn viewport() -> Viewport
        {
                Viewport::new(&Config::default())
        }

        #[test]
        fn aspect_follows_logical_size()
        {
                let mut v = viewport();

                v.handle_resize(PhysicalSize::new(1600, 900), 1.0);

                assert!((v.camera().aspect() - 1600.0 / 900.0).abs() < 1e-6);
                assert_eq!(v.logical_size(), (1600.0, 900.0));
        }

        #[test]
        fn high_density_displays_are_capped()
        {
                let mut v = viewport();

                v.handle_resize(PhysicalSize::new(3000, 1500), 3.0);

                assert_eq!(v.pixel_ratio(), MAX_PIXEL_RATIO);
                assert_eq!(v.logical_size(), (1000.0, 500.0));
                assert!((v.camera().aspect() - 2.0).abs() < 1e-6);
        }

        #[test]
        fn low_density_displays_keep_their_ratio()
        {
                let mut v = viewport();

                v.handle_resize(PhysicalSize::new(800, 600), 1.5);

                assert_eq!(v.pixel_ratio(), 1.5);
        }

        #[test]
        fn zero_size_is_ignored()
        {
                let mut v = viewport();

                v.handle_resize(PhysicalSize::new(800, 600), 1.0);
                let aspect = v.camera().aspect();

                v.handle_resize(PhysicalSize::new(0, 600), 1.0);

                assert_eq!(v.camera().aspect(), aspect);
                assert_eq!(v.resize_count(), 1);
        }

        #[test]
        fn pointer_maps_to_unit_square()
        {
                let mut v = viewport();

                assert_eq!(v.normalize_pointer(10.0, 10.0), None);

                v.handle_resize(PhysicalSize::new(200, 100), 1.0);

                assert_eq!(v.normalize_pointer(0.0, 0.0), Some((-1.0, 1.0)));
                assert_eq!(v.normalize_pointer(200.0, 100.0), Some((1.0, -1.0)));
                assert_eq!(v.normalize_pointer(100.0, 50.0), Some((0.0, 0.0)));
        }

        #[test]
        fn panel_hint_uses_configured_key()
        {
                let mut config = Config::default();
                config.input.panel_key = winit::keyboard::KeyCode::KeyP;

                let v = Viewport::new(&config);

                assert_eq!(v.panel().hint(), "Press [P] to toggle the settings panel");
        }

        #[test]
        fn frame_without_renderer_applies_panel_edits()
        {
                use crate::ui::bindings::FieldValue;

                let mut v = viewport();

                v.panel_mut()
                        .queue_edit("Background", "Color", FieldValue::Color([0.0, 1.0, 0.0]));
                v.update_frame();

                assert_eq!(scene::lock(&v.scene()).background, [0.0, 1.0, 0.0]);
        }
}
