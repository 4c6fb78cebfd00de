//! Vulkan backend
//!
//! `ash` implementations of the [`GraphicsDevice`](crate::render::GraphicsDevice)
//! and [`SwapChain`](crate::render::SwapChain) collaborators, plus the RAII
//! wrappers they are built from.

pub mod commands;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use device::{PhysicalDeviceInfo, VulkanDevice};
pub use swapchain::VulkanSwapChain;
