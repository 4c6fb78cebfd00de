//! Render systems that record draws into a frame's command buffer

pub mod simple_render_system;

pub use simple_render_system::{SimplePushConstantData, SimpleRenderSystem};
