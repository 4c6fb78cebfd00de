//! # Rendering
//!
//! The frame-rendering core and its Vulkan backend.
//!
//! - [`renderer`]: frame lifecycle state machine over a [`SwapChain`]
//! - [`mesh_resource`]: staged upload of mesh data into device-local buffers
//! - [`systems`]: per-object draw submission with push constants
//! - [`primitives`]: camera math and host-side mesh data
//!
//! The core only talks to the GPU through the [`GraphicsDevice`],
//! [`SwapChain`] and [`WindowSurface`] traits. [`vulkan`] implements the first
//! two with `ash`.

pub mod buffer;
pub mod device;
pub mod error;
pub mod mesh_resource;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod swap_chain;
pub mod systems;
pub mod vulkan;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;

pub use device::GraphicsDevice;
pub use error::{VulkanError, VulkanResult};
pub use mesh_resource::{MeshLoadError, MeshResource};
pub use primitives::{Camera, MeshBuilder, Vertex};
pub use renderer::{FrameState, Renderer};
pub use swap_chain::{ImageAcquisition, PresentOutcome, SwapChain};
pub use systems::SimpleRenderSystem;
pub use window::WindowSurface;
