use crate::animation::Easing;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// File looked up next to the manifest, then in the working directory.
pub const CONFIG_FILE: &str = "showcase.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
        pub show_start_message: bool,
        pub show_exit_message: bool,
        pub window_title: String,
        pub assets: AssetConfig,
        pub camera: CameraConfig,
        pub display: DisplayConfig,
        pub lighting: LightingConfig,
        pub input: InputConfig,
        pub ui: UiConfig,
}

impl Default for Config
{
        fn default() -> Self
        {
                Self {
                        show_start_message: true,
                        show_exit_message: true,
                        window_title: "Showcase".to_string(),
                        assets: AssetConfig::default(),
                        camera: CameraConfig::default(),
                        display: DisplayConfig::default(),
                        lighting: LightingConfig::default(),
                        input: InputConfig::default(),
                        ui: UiConfig::default(),
                }
        }
}

impl Config
{
        /// Reads [`CONFIG_FILE`] from disk.
        ///
        /// Browsers have no file system, so wasm builds always fail here and
        /// the caller falls back to [`Config::default`].
        #[cfg(not(target_arch = "wasm32"))]
        pub fn from_file() -> anyhow::Result<Self>
        {
                let mut candidates = Vec::new();

                if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR")
                {
                        candidates.push(std::path::Path::new(&dir).join(CONFIG_FILE));
                }

                candidates.push(std::path::PathBuf::from(CONFIG_FILE));

                let path = candidates
                        .into_iter()
                        .find(|p| p.exists())
                        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE} not found"))?;

                log::info!("Loading config from {}", path.display());

                let text = std::fs::read_to_string(&path)?;

                Self::from_toml(&text)
        }

        #[cfg(target_arch = "wasm32")]
        pub fn from_file() -> anyhow::Result<Self>
        {
                anyhow::bail!("no file system on wasm32")
        }

        pub fn from_toml(text: &str) -> anyhow::Result<Self>
        {
                let config: Config = toml::from_str(text)?;

                config.validate()?;

                Ok(config)
        }

        pub fn validate(&self) -> anyhow::Result<()>
        {
                let smoothness = self.display.smoothness;

                if !(smoothness > 0.0 && smoothness <= 1.0)
                {
                        anyhow::bail!("display.smoothness must be in (0, 1], got {smoothness}");
                }

                if !self.display.sensitivity.is_finite()
                {
                        anyhow::bail!("display.sensitivity must be finite");
                }

                if self.display.transition_secs < 0.0
                {
                        anyhow::bail!("display.transition_secs must not be negative");
                }

                Ok(())
        }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig
{
        /// Directory on native, URL path prefix on the web.
        pub root: String,
        pub model: String,
        pub environment: String,
}

impl Default for AssetConfig
{
        fn default() -> Self
        {
                Self {
                        root: "resources".to_string(),
                        model: "crown.glb".to_string(),
                        environment: "environment.jpg".to_string(),
                }
        }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig
{
        pub position: [f32; 3],
        pub fovy_degrees: f32,
        pub znear: f32,
        pub zfar: f32,
}

impl Default for CameraConfig
{
        fn default() -> Self
        {
                Self {
                        position: [0.0, 0.0, 6.0],
                        fovy_degrees: 45.0,
                        znear: 0.1,
                        zfar: 100.0,
                }
        }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig
{
        /// Radians of rotation per unit of normalized pointer offset.
        pub sensitivity: f32,
        /// Fraction of the remaining distance covered each frame.
        pub smoothness: f32,
        pub initial_position: [f32; 3],
        pub initial_scale: f32,
        pub visible_offset: f32,
        pub hidden_offset: f32,
        pub transition_secs: f32,
        pub easing: Easing,
}

impl Default for DisplayConfig
{
        fn default() -> Self
        {
                Self {
                        sensitivity: 0.2,
                        smoothness: 0.1,
                        initial_position: [0.0, 0.0, 0.0],
                        initial_scale: 1.0,
                        visible_offset: 0.0,
                        hidden_offset: -4.0,
                        transition_secs: 1.2,
                        easing: Easing::CubicInOut,
                }
        }
}

/// Initial values of the panel-editable viewport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig
{
        pub background: [f32; 3],
        pub ambient_color: [f32; 3],
        pub ambient_intensity: f32,
        pub directional_color: [f32; 3],
        pub directional_intensity: f32,
        pub directional_position: [f32; 3],
        pub exposure: f32,
        pub shadow_map_size: u32,
}

impl Default for LightingConfig
{
        fn default() -> Self
        {
                Self {
                        background: [0.06, 0.06, 0.08],
                        ambient_color: [1.0, 1.0, 1.0],
                        ambient_intensity: 0.4,
                        directional_color: [1.0, 0.96, 0.9],
                        directional_intensity: 2.0,
                        directional_position: [3.0, 5.0, 4.0],
                        exposure: 1.0,
                        shadow_map_size: 2048,
                }
        }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig
{
        pub reveal_key: KeyCode,
        pub conceal_key: KeyCode,
        pub panel_key: KeyCode,
}

impl Default for InputConfig
{
        fn default() -> Self
        {
                Self {
                        reveal_key: KeyCode::KeyS,
                        conceal_key: KeyCode::KeyH,
                        panel_key: KeyCode::Tab,
                }
        }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig
{
        pub scale: f32,
        pub show_panel: bool,
}

impl Default for UiConfig
{
        fn default() -> Self
        {
                Self {
                        scale: 1.2,
                        show_panel: true,
                }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn partial_toml_keeps_defaults()
        {
                let config = Config::from_toml(
                        r#"
                        [display]
                        sensitivity = 0.5

                        [input]
                        reveal_key = "ArrowUp"
                        "#,
                )
                .unwrap();

                assert_eq!(config.display.sensitivity, 0.5);
                assert_eq!(config.display.smoothness, 0.1);
                assert_eq!(config.input.reveal_key, KeyCode::ArrowUp);
                assert_eq!(config.input.conceal_key, KeyCode::KeyH);
                assert_eq!(config.assets.model, "crown.glb");
        }

        #[test]
        fn rejects_out_of_range_smoothness()
        {
                assert!(Config::from_toml("[display]\nsmoothness = 0.0").is_err());
                assert!(Config::from_toml("[display]\nsmoothness = 1.5").is_err());
                assert!(Config::from_toml("[display]\nsmoothness = 1.0").is_ok());
        }

        #[test]
        fn easing_is_read_by_name()
        {
                let config = Config::from_toml("[display]\neasing = \"sine_in_out\"").unwrap();

                assert_eq!(config.display.easing, Easing::SineInOut);
        }
}
