//! # Core Module
//!
//! Shared configuration used by the renderer and the viewer application.

pub mod config;

pub use config::{
    ApplicationConfig,
    CameraConfig,
    RendererConfig,
    SceneConfig,
    ShaderConfig,
    WindowConfig,
    Config,
    ConfigError,
};
