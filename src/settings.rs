use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "render_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "RenderSettings::default_shadow_map_size")]
    pub shadow_map_size: u32,
    #[serde(default = "RenderSettings::default_clear_color")]
    pub clear_color: [f64; 4],
    /// Phong variants with more lights than this are not drawn.
    #[serde(default = "RenderSettings::default_max_light_count")]
    pub max_light_count: u32,
    #[serde(default)]
    pub shadow_depth_bias: ShadowDepthBias,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: Self::default_shadow_map_size(),
            clear_color: Self::default_clear_color(),
            max_light_count: Self::default_max_light_count(),
            shadow_depth_bias: ShadowDepthBias::default(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path(SETTINGS_FILE)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.shadow_map_size == 0 || !self.shadow_map_size.is_power_of_two() {
            warn!(
                "Shadow map size {} must be a non-zero power of two. Using default value.",
                self.shadow_map_size
            );
            self.shadow_map_size = Self::default_shadow_map_size();
        }

        if self.max_light_count == 0 {
            warn!("Max light count must be greater than zero. Using default value.");
            self.max_light_count = Self::default_max_light_count();
        }

        if self.clear_color.iter().any(|c| !c.is_finite()) {
            warn!("Clear color must be finite. Using default clear color.");
            self.clear_color = Self::default_clear_color();
        }

        self
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }

    const fn default_shadow_map_size() -> u32 {
        2048
    }

    const fn default_clear_color() -> [f64; 4] {
        [0.1, 0.1, 0.1, 1.0]
    }

    const fn default_max_light_count() -> u32 {
        16
    }
}

/// Depth bias applied by the shadow caster pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowDepthBias {
    pub constant: i32,
    pub slope_scale: f32,
}

impl Default for ShadowDepthBias {
    fn default() -> Self {
        Self {
            constant: 2,
            slope_scale: 2.0,
        }
    }
}
