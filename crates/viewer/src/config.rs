//! Viewer configuration (window, renderer, input). Loaded from config.ron at startup.

use renderer::{RendererSettings, SceneConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent viewer settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Degrees of camera rotation per pixel of mouse motion.
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    /// Fly speed in world units per second.
    #[serde(default = "default_camera_speed")]
    pub camera_speed: f32,
    /// Separable blur iterations per frame.
    #[serde(default = "default_blur_passes")]
    pub blur_passes: u32,
    /// Directory holding grass/water/rock/bark/leaves .jpg.
    #[serde(default = "default_texture_dir")]
    pub texture_dir: PathBuf,
    /// Draw the ground flat-coloured before the textured pass.
    #[serde(default = "default_true")]
    pub ground_flat_prepass: bool,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
}

fn default_window_width() -> u32 {
    1600
}
fn default_window_height() -> u32 {
    1200
}
fn default_true() -> bool {
    true
}
fn default_mouse_sensitivity() -> f32 {
    0.1
}
fn default_camera_speed() -> f32 {
    2.5
}
fn default_blur_passes() -> u32 {
    10
}
fn default_texture_dir() -> PathBuf {
    PathBuf::from("textures")
}
fn default_screenshot_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            vsync: default_true(),
            mouse_sensitivity: default_mouse_sensitivity(),
            camera_speed: default_camera_speed(),
            blur_passes: default_blur_passes(),
            texture_dir: default_texture_dir(),
            ground_flat_prepass: default_true(),
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

impl ViewerConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data).unwrap_or_else(|e| {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Renderer options carried by this config. Scene geometry keeps its defaults.
    pub fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            vsync: self.vsync,
            blur_passes: self.blur_passes,
            scene: SceneConfig {
                texture_dir: self.texture_dir.clone(),
                ground_flat_prepass: self.ground_flat_prepass,
                ..SceneConfig::default()
            },
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}
