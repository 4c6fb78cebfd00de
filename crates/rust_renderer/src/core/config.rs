//! # Application Configuration
//!
//! Every knob the viewer exposes lives here: window size and title, renderer
//! settings (frames in flight, clear color, shader paths, validation layers),
//! the camera's projection parameters and the model to show.
//!
//! All structures are serde-serializable and load through the [`Config`] trait
//! from `.toml` or `.ron` files. Unset fields fall back to their defaults.

use serde::{Serialize, Deserialize};
use std::path::Path;

pub use crate::config::{Config, ConfigError};

/// Upper bound accepted for `max_frames_in_flight`
pub const MAX_FRAMES_IN_FLIGHT_LIMIT: usize = 8;

/// # Shader Configuration
///
/// Paths to the SPIR-V binaries of the simple render system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries the usual output locations so the viewer can be started from the
    /// workspace root or from inside a crate directory.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let shader_dirs = [
            "target/shaders/",
            "../target/shaders/",
            "../../target/shaders/",
            "shaders/",
        ];

        let find = |name: &str| {
            shader_dirs
                .iter()
                .map(|dir| format!("{}{}", dir, name))
                .find(|candidate| Path::new(candidate).exists())
        };

        Self {
            vertex_shader_path: find(base_vertex)
                .unwrap_or_else(|| format!("target/shaders/{}", base_vertex)),
            fragment_shader_path: find(base_fragment)
                .unwrap_or_else(|| format!("target/shaders/{}", base_fragment)),
        }
    }

    /// Check that both shader files exist on disk
    pub fn validate_files(&self) -> Result<(), ConfigError> {
        for path in [&self.vertex_shader_path, &self.fragment_shader_path] {
            if !Path::new(path).exists() {
                return Err(ConfigError::Invalid(format!("Shader not found: {}", path)));
            }
        }
        Ok(())
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("simple_shader.vert.spv", "simple_shader.frag.spv")
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title, also used as the Vulkan application name by the viewer
    pub title: String,
    /// Initial client width in pixels
    pub width: u32,
    /// Initial client height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Viewer".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// # Renderer Configuration
///
/// Settings consumed by the Vulkan backend and the frame controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Number of frames the CPU may record ahead of the GPU
    pub max_frames_in_flight: usize,
    /// Clear color of the swap chain render pass (RGBA)
    pub clear_color: [f32; 4],
    /// Shader configuration
    pub shaders: ShaderConfig,
    /// Whether to enable Vulkan validation layers, auto-detected when unset
    pub enable_validation: Option<bool>,
}

impl RendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            max_frames_in_flight: 2,
            clear_color: [0.01, 0.01, 0.01, 1.0],
            shaders: ShaderConfig::default(),
            enable_validation: None,
        }
    }

    /// Set custom shader configuration
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Set maximum frames in flight
    pub fn with_max_frames_in_flight(mut self, frames: usize) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }

    /// Whether validation layers should be requested
    ///
    /// Debug builds enable them unless explicitly disabled.
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }

        if self.max_frames_in_flight == 0 {
            return Err(ConfigError::Invalid("Max frames in flight must be at least 1".to_string()));
        }

        if self.max_frames_in_flight > MAX_FRAMES_IN_FLIGHT_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "Max frames in flight should not exceed {}",
                MAX_FRAMES_IN_FLIGHT_LIMIT
            )));
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new("Vulkan Viewer")
    }
}

/// # Camera Configuration
///
/// Perspective projection parameters. The aspect ratio is not configured; it
/// is read from the swap chain every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane distance
    pub near: f32,
    /// Far clip plane distance
    pub far: f32,
    /// Keyboard movement speed in units per second
    pub move_speed: f32,
    /// Keyboard look speed in radians per second
    pub look_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 10.0,
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl CameraConfig {
    /// Validate the projection parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "Field of view must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "Clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// OBJ model to display; the built-in cube is used when unset
    pub model_path: Option<String>,
}

/// # Complete Application Configuration
///
/// Top-level configuration the viewer loads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window configuration
    pub window: WindowConfig,
    /// Rendering system configuration
    pub renderer: RendererConfig,
    /// Camera configuration
    pub camera: CameraConfig,
    /// Scene configuration
    pub scene: SceneConfig,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        Self {
            window: WindowConfig {
                title: app_name.clone(),
                ..WindowConfig::default()
            },
            renderer: RendererConfig::new(app_name),
            camera: CameraConfig::default(),
            scene: SceneConfig::default(),
        }
    }

    /// Set the window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set the renderer configuration
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set the camera configuration
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Set the model to display
    pub fn with_model(mut self, path: impl Into<String>) -> Self {
        self.scene.model_path = Some(path.into());
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("Window size must be non-zero".to_string()));
        }
        self.renderer.validate()?;
        self.camera.validate()?;
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new("Vulkan Viewer")
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rust_renderer_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.renderer.max_frames_in_flight, 2);
        assert_eq!(config.renderer.clear_color, [0.01, 0.01, 0.01, 1.0]);
        assert!(config.scene.model_path.is_none());
    }

    #[test]
    fn test_frames_in_flight_bounds() {
        let zero = RendererConfig::default().with_max_frames_in_flight(0);
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid(_))));

        let too_many = RendererConfig::default().with_max_frames_in_flight(9);
        assert!(too_many.validate().is_err());

        let max = RendererConfig::default().with_max_frames_in_flight(8);
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_camera_validation() {
        let inverted = CameraConfig { near: 5.0, far: 1.0, ..CameraConfig::default() };
        assert!(inverted.validate().is_err());

        let flat = CameraConfig { fov_degrees: 0.0, ..CameraConfig::default() };
        assert!(flat.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let path = temp_path("config.toml");
        let config = ApplicationConfig::new("Roundtrip")
            .with_window_size(1024, 768)
            .with_model("models/smooth_vase.obj");

        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_roundtrip() {
        let path = temp_path("config.ron");
        let config = ApplicationConfig::default()
            .with_renderer(RendererConfig::new("Ron").with_max_frames_in_flight(3).with_validation(false));

        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
        assert!(!loaded.renderer.validation_enabled());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "[window]\nwidth = 1280\n").unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.window.width, 1280);
        assert_eq!(loaded.window.height, WindowConfig::default().height);
        assert_eq!(loaded.camera, CameraConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ApplicationConfig::default().save_to_file(temp_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let loaded = ApplicationConfig::load_or_default(temp_path("does_not_exist.toml")).unwrap();
        assert_eq!(loaded, ApplicationConfig::default());
    }
}
