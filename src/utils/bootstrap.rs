use crate::config::Config;

pub fn show_start_message(config: &Config)
{
        if !config.show_start_message
        {
                return;
        }

        let banner = r#"

   ░██████  ░██                                                                      
  ░██   ░██ ░██                                                                      
 ░██        ░████████   ░███████  ░██    ░██    ░██  ░███████   ░██████    ░███████  
  ░████████ ░██    ░██ ░██    ░██ ░██    ░██    ░██ ░██    ░██       ░██  ░██        
         ░██░██    ░██ ░██    ░██  ░██  ░████  ░██  ░██        ░███████   ░███████  
  ░██   ░██ ░██    ░██ ░██    ░██   ░██░██ ░██░██   ░██    ░██ ░██   ░██        ░██ 
   ░██████  ░██    ░██  ░███████     ░███   ░███     ░███████   ░█████░██  ░███████  

 Interactive 3D product showcase built with wgpu and Rust.

            "#;

        log::info!("{banner}");
        log::info!(
                "Model: {}/{}, environment: {}/{}",
                config.assets.root,
                config.assets.model,
                config.assets.root,
                config.assets.environment
        );
}

pub fn config_logging()
{
        #[cfg(not(target_arch = "wasm32"))]
        {
                // A second init (e.g. from a test harness) is harmless.
                let _ = env_logger::Builder::from_env(
                        env_logger::Env::default().default_filter_or("info"),
                )
                .try_init();

                log::info!("Running on native.");
        }

        #[cfg(target_arch = "wasm32")]
        {
                console_error_panic_hook::set_once();

                if console_log::init_with_level(log::Level::Info).is_err()
                {
                        return;
                }

                log::info!("Running on wasm32.");
        }
}

pub fn create_config() -> Config
{
        Config::from_file().unwrap_or_else(|err| {
                log::warn!("Failed to load config: {err}, falling back to default");
                Config::default()
        })
}
