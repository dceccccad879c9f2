//! Showcase runtime.
//!
//! [`Orchestrator`] is the winit application: it creates the window, runs
//! the startup chain, translates window events into [`InputEvent`]s and
//! drives the per-frame update.
//!
//! # Platform differences
//! - **Native**: the startup future is driven to completion inside
//!   `resumed` with `pollster`.
//! - **WASM**: the startup future is spawned with `spawn_local` and the
//!   finished [`Stage`] arrives through an [`EventLoopProxy`] user event.
//!
//! [`EventLoopProxy`]: winit::event_loop::EventLoopProxy

use crate::config::Config;
use crate::display::DisplayObject;
use crate::input::InputEvent;
use crate::input::manager::InputManager;
use crate::viewport::Viewport;
use derivative::Derivative;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[cfg(target_arch = "wasm32")]
use winit::platform::web::EventLoopExtWebSys;

/// The viewport and the object on display, built once a window exists.
pub struct Stage
{
        pub viewport: Viewport,
        pub display: DisplayObject,
}

impl Stage
{
        /// Builds the CPU side only. Nothing is drawn until the viewport is
        /// initialized with a window.
        pub fn new(config: &Config) -> Self
        {
                let viewport = Viewport::new(config);
                let display = DisplayObject::new(viewport.scene(), config.display.clone());

                Self {
                        viewport,
                        display,
                }
        }
}

/// Startup chain: viewport, then the displayed asset.
///
/// A failed asset load is logged and the stage still comes up with an empty
/// scene; only GPU initialization is fatal.
pub async fn bootstrap(
        window: Arc<Window>,
        config: Config,
) -> anyhow::Result<Stage>
{
        let mut stage = Stage::new(&config);

        stage.viewport.initialize(window).await?;

        match stage
                .display
                .load(&config.assets.root, &config.assets.model)
                .await
        {
                Ok(id) => log::info!("Displaying {} as {:?}", config.assets.model, id),
                Err(e) => log::error!("Failed to load {}: {e}", config.assets.model),
        }

        Ok(stage)
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Orchestrator
{
        /// On browser environments, an [`EventLoopProxy`] is needed
        /// to send the stage back into the event loop asynchronously.
        ///
        /// [`EventLoopProxy`]: winit::event_loop::EventLoopProxy
        #[cfg(target_arch = "wasm32")]
        #[derivative(Debug = "ignore")]
        proxy: Option<winit::event_loop::EventLoopProxy<Stage>>,

        config: Config,

        #[derivative(Debug = "ignore")]
        stage: Option<Stage>,

        input: InputManager<Stage>,

        sender: Sender<InputEvent>,

        #[derivative(Debug = "ignore")]
        receiver: Receiver<InputEvent>,

        last_frame: Option<instant::Instant>,
}

impl Orchestrator
{
        pub fn new(
                config: Config,
                #[cfg(target_arch = "wasm32")] event_loop: &EventLoop<Stage>,
        ) -> Self
        {
                let (sender, receiver) = channel();

                Self {
                        #[cfg(target_arch = "wasm32")]
                        proxy: Some(event_loop.create_proxy()),
                        config,
                        stage: None,
                        input: InputManager::new(),
                        sender,
                        receiver,
                        last_frame: None,
                }
        }

        pub fn stage(&self) -> Option<&Stage>
        {
                self.stage.as_ref()
        }

        /// Takes ownership of a finished stage and wires up input.
        pub fn attach_stage(
                &mut self,
                stage: Stage,
        )
        {
                self.stage = Some(stage);
                self.install_listeners();
        }

        /// Rebuilds every input handler and the panel's binding table from
        /// scratch.
        pub fn install_listeners(&mut self)
        {
                let keys = self.config.input.clone();

                let mut input = InputManager::new();

                input.on_resize(|stage: &mut Stage, size, scale_factor| {
                        stage.viewport.handle_resize(size, scale_factor)
                });

                input.on_pointer(|stage: &mut Stage, x, y| {
                        if let Some((nx, ny)) = stage.viewport.normalize_pointer(x, y)
                        {
                                stage.display.set_orientation_target(nx, ny);
                        }
                });

                input.on_key(keys.reveal_key, |stage: &mut Stage| stage.display.reveal());
                input.on_key(keys.conceal_key, |stage: &mut Stage| stage.display.conceal());
                input.on_key(keys.panel_key, |stage: &mut Stage| {
                        stage.viewport.panel_mut().toggle()
                });

                log::debug!("Installed {} input listeners", input.listener_count());

                self.input = input;

                if let Some(stage) = self.stage.as_mut()
                {
                        stage.viewport.panel_mut().rebuild();
                }
        }

        pub fn send(
                &self,
                event: InputEvent,
        )
        {
                // The receiver lives as long as `self`.
                let _ = self.sender.send(event);
        }

        /// Dispatches queued input in arrival order. Returns how many events
        /// had a handler.
        pub fn process_input(&mut self) -> usize
        {
                let Some(stage) = self.stage.as_mut()
                else
                {
                        return 0;
                };

                self.receiver
                        .try_iter()
                        .filter(|event| self.input.dispatch(event, stage))
                        .count()
        }

        /// One tick of the showcase.
        pub fn frame(&mut self)
        {
                let now = instant::Instant::now();

                let dt = self
                        .last_frame
                        .map(|last| now.duration_since(last))
                        .unwrap_or(Duration::ZERO);

                self.last_frame = Some(now);

                self.process_input();

                let Some(stage) = self.stage.as_mut()
                else
                {
                        return;
                };

                stage.viewport.step_animations(dt);
                stage.viewport.update_frame();
                stage.display.advance();

                if let Some(window) = stage.viewport.window()
                {
                        window.request_redraw();
                }
        }

        fn window_attributes(&self) -> winit::window::WindowAttributes
        {
                #[allow(unused_mut)]
                let mut window_attributes =
                        Window::default_attributes().with_title(self.config.window_title.clone());

                #[cfg(target_arch = "wasm32")]
                {
                        use wasm_bindgen::JsCast;
                        use winit::platform::web::WindowAttributesExtWebSys;

                        const CANVAS_ID: &str = "canvas";

                        let canvas = web_sys::window()
                                .and_then(|w| w.document())
                                .and_then(|d| d.get_element_by_id(CANVAS_ID))
                                .map(|c| c.unchecked_into());

                        if canvas.is_none()
                        {
                                log::warn!("No element with id \"{CANVAS_ID}\", winit will create one");
                        }

                        window_attributes = window_attributes.with_canvas(canvas);
                }

                window_attributes
        }
}

impl ApplicationHandler<Stage> for Orchestrator
{
        /// Creates the window and runs the startup chain.
        fn resumed(
                &mut self,
                event_loop: &ActiveEventLoop,
        )
        {
                if self.stage.is_some()
                {
                        log::info!("Already resumed, skipping initialization.");
                        return;
                }

                let window = match event_loop.create_window(self.window_attributes())
                {
                        Ok(window) => Arc::new(window),
                        Err(e) =>
                        {
                                log::error!("Unable to create window: {e}");
                                event_loop.exit();
                                return;
                        }
                };

                #[cfg(not(target_arch = "wasm32"))]
                {
                        match pollster::block_on(bootstrap(window, self.config.clone()))
                        {
                                Ok(stage) => self.attach_stage(stage),
                                Err(e) =>
                                {
                                        log::error!("Unable to initialize viewport: {e}");
                                        event_loop.exit();
                                }
                        }
                }

                #[cfg(target_arch = "wasm32")]
                {
                        if let Some(proxy) = self.proxy.take()
                        {
                                let config = self.config.clone();

                                wasm_bindgen_futures::spawn_local(async move {
                                        match bootstrap(window, config).await
                                        {
                                                Ok(stage) =>
                                                {
                                                        if proxy.send_event(stage).is_err()
                                                        {
                                                                log::error!("Event loop closed before startup finished");
                                                        }
                                                }
                                                Err(e) => log::error!("Unable to initialize viewport: {e}"),
                                        }
                                });
                        }
                }
        }

        /// Receives the stage built asynchronously on WASM.
        fn user_event(
                &mut self,
                _event_loop: &ActiveEventLoop,
                stage: Stage,
        )
        {
                if let Some(window) = stage.viewport.window()
                {
                        window.request_redraw();
                }

                self.attach_stage(stage);
        }

        fn window_event(
                &mut self,
                event_loop: &ActiveEventLoop,
                _window_id: WindowId,
                event: WindowEvent,
        )
        {
                let Some(stage) = self.stage.as_mut()
                else
                {
                        return;
                };

                let consumed = stage.viewport.gui_event(&event);

                match event
                {
                        WindowEvent::CloseRequested => event_loop.exit(),
                        WindowEvent::Resized(size) =>
                        {
                                let scale_factor = stage
                                        .viewport
                                        .window()
                                        .map(|w| w.scale_factor())
                                        .unwrap_or(1.0);

                                self.send(InputEvent::Resized {
                                        size,
                                        scale_factor,
                                });
                        }
                        WindowEvent::ScaleFactorChanged {
                                scale_factor,
                                ..
                        } =>
                        {
                                if let Some(size) = stage.viewport.window().map(|w| w.inner_size())
                                {
                                        self.send(InputEvent::Resized {
                                                size,
                                                scale_factor,
                                        });
                                }
                        }
                        WindowEvent::RedrawRequested => self.frame(),
                        WindowEvent::CursorMoved {
                                position,
                                ..
                        } if !consumed =>
                        {
                                let scale_factor = stage
                                        .viewport
                                        .window()
                                        .map(|w| w.scale_factor())
                                        .unwrap_or(1.0);

                                let logical = position.to_logical::<f64>(scale_factor);

                                self.send(InputEvent::PointerMoved {
                                        x: logical.x,
                                        y: logical.y,
                                });
                        }
                        WindowEvent::KeyboardInput {
                                event:
                                        KeyEvent {
                                                physical_key: PhysicalKey::Code(code),
                                                state,
                                                repeat: false,
                                                ..
                                        },
                                ..
                        } if state.is_pressed() && !consumed =>
                        {
                                #[cfg(not(target_arch = "wasm32"))]
                                if code == KeyCode::Escape
                                {
                                        log::info!("Escape pressed, exiting.");
                                        event_loop.exit();
                                        return;
                                }

                                self.send(InputEvent::KeyPressed(code));
                        }
                        _ =>
                        {}
                }
        }
}

/// Owns the event loop and the [`Orchestrator`] until the loop exits.
pub struct EngineRunner
{
        pub orchestrator: Orchestrator,

        pub event_loop: EventLoop<Stage>,
}

impl EngineRunner
{
        pub fn new(config: Config) -> anyhow::Result<Self>
        {
                let event_loop = EventLoop::<Stage>::with_user_event().build()?;

                let orchestrator = Orchestrator::new(
                        config,
                        #[cfg(target_arch = "wasm32")]
                        &event_loop,
                );

                Ok(Self {
                        orchestrator,
                        event_loop,
                })
        }

        /// Runs the event loop.
        ///
        /// Native builds block until the window closes; on WASM the loop is
        /// handed to the browser and this returns immediately.
        pub fn run(self) -> anyhow::Result<()>
        {
                #[allow(unused_mut)]
                let mut orchestrator = self.orchestrator;

                #[cfg(target_arch = "wasm32")]
                self.event_loop.spawn_app(orchestrator);

                #[cfg(not(target_arch = "wasm32"))]
                self.event_loop.run_app(&mut orchestrator)?;

                Ok(())
        }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests
{
        use super::*;
        use crate::loader::tests::fixture_root;
        use crate::scene;
        use winit::dpi::PhysicalSize;

        fn orchestrator(config: Config) -> Orchestrator
        {
                let mut orchestrator = Orchestrator::new(config.clone());
                orchestrator.attach_stage(Stage::new(&config));
                orchestrator
        }

        fn resized(
                width: u32,
                height: u32,
        ) -> InputEvent
        {
                InputEvent::Resized {
                        size: PhysicalSize::new(width, height),
                        scale_factor: 1.0,
                }
        }

        #[test]
        fn reinstalling_does_not_stack_resize_handlers()
        {
                let mut o = orchestrator(Config::default());

                o.install_listeners();
                o.install_listeners();

                o.send(resized(640, 480));
                assert_eq!(o.process_input(), 1);

                let stage = o.stage().unwrap();
                assert_eq!(stage.viewport.resize_count(), 1);
        }

        #[test]
        fn panel_key_toggles_panel()
        {
                let mut config = Config::default();
                config.ui.show_panel = true;
                let mut o = orchestrator(config.clone());

                assert!(o.stage().unwrap().viewport.panel().visible);

                o.send(InputEvent::KeyPressed(config.input.panel_key));
                o.send(InputEvent::KeyPressed(KeyCode::KeyQ));

                assert_eq!(o.process_input(), 1);
                assert!(!o.stage().unwrap().viewport.panel().visible);

                o.send(InputEvent::KeyPressed(config.input.panel_key));
                o.process_input();

                assert!(o.stage().unwrap().viewport.panel().visible);
        }

        #[test]
        fn frames_advance_tweens_by_elapsed_time()
        {
                let mut config = Config::default();
                config.display.transition_secs = 0.01;
                config.assets.root = fixture_root("engine_tween");
                config.assets.model = "triangle.gltf".to_string();

                let mut stage = Stage::new(&config);
                pollster::block_on(stage.display.load(&config.assets.root, &config.assets.model))
                        .unwrap();

                let id = stage.display.asset().unwrap();
                let scene = stage.viewport.scene();

                let mut o = Orchestrator::new(config.clone());
                o.attach_stage(stage);

                o.send(InputEvent::KeyPressed(config.input.conceal_key));
                o.frame();

                let y = scene::lock(&scene).node(id).unwrap().transform.position.y;
                assert!(y > config.display.hidden_offset);

                std::thread::sleep(Duration::from_millis(30));
                o.frame();

                let y = scene::lock(&scene).node(id).unwrap().transform.position.y;
                assert_eq!(y, config.display.hidden_offset);
        }

        #[test]
        fn input_before_stage_is_held()
        {
                let config = Config::default();
                let mut o = Orchestrator::new(config.clone());

                o.send(resized(300, 200));
                assert_eq!(o.process_input(), 0);

                o.attach_stage(Stage::new(&config));
                assert_eq!(o.process_input(), 1);
                assert_eq!(o.stage().unwrap().viewport.logical_size(), (300.0, 200.0));
        }

        #[test]
        fn pointer_drives_orientation_end_to_end()
        {
                let mut config = Config::default();
                config.display.sensitivity = 0.2;
                config.display.smoothness = 0.1;
                config.display.transition_secs = 0.0;
                config.assets.root = fixture_root("engine_e2e");
                config.assets.model = "triangle.gltf".to_string();

                let mut stage = Stage::new(&config);
                pollster::block_on(stage.display.load(&config.assets.root, &config.assets.model))
                        .unwrap();

                let mut o = Orchestrator::new(config.clone());
                o.attach_stage(stage);

                o.send(resized(200, 100));
                // Bottom-right corner: (1, -1) once normalized.
                o.send(InputEvent::PointerMoved { x: 200.0, y: 100.0 });
                o.frame();

                let orientation = o.stage().unwrap().display.orientation();

                assert!((orientation.target.x + 0.2).abs() < 1e-6);
                assert!((orientation.target.y - 0.2).abs() < 1e-6);
                assert!((orientation.current.x + 0.02).abs() < 1e-6);
                assert!((orientation.current.y - 0.02).abs() < 1e-6);
        }
}
