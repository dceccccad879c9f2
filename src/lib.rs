pub mod animation;
pub mod camera;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod loader;
pub mod material;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod texture;
pub mod ui;
pub mod utils;
pub mod viewport;

/// WebAssembly (WASM) architecture note:
///
/// We target `wasm32` only: browsers implement a 32-bit memory model and
/// `wasm-bindgen`, `web-sys` and `wgpu` support only 32-bit targets.
///
/// Using `#[cfg(target_arch = "wasm32")]` keeps WASM-specific imports and
/// bindings out of native binaries.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub use crate::config::Config;

/// Sets up logging and configuration, then runs the showcase until its
/// window closes.
pub fn run() -> anyhow::Result<()>
{
        utils::bootstrap::config_logging();

        let config = utils::bootstrap::create_config();

        utils::bootstrap::show_start_message(&config);

        #[cfg(not(target_arch = "wasm32"))]
        let exit_config = config.clone();

        let runner = engine::EngineRunner::new(config)?;

        runner.run()?;

        #[cfg(not(target_arch = "wasm32"))]
        {
                let msg = utils::exit::get_exit_message(&exit_config);

                if !msg.is_empty()
                {
                        log::info!("{msg}");
                }
        }

        Ok(())
}

/// WebAssembly entry point.
///
/// The browser calls this once the module is initialized, thanks to the
/// [`wasm_bindgen(start)`] attribute. It replaces `main` on wasm targets.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_wasm() -> Result<(), JsValue>
{
        run().map_err(|e| JsValue::from_str(&e.to_string()))
}
