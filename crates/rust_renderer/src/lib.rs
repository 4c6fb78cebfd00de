//! # Rust Renderer
//!
//! The frame-rendering core of a small Vulkan renderer.
//!
//! ## Features
//!
//! - **Frame lifecycle**: acquire, record, submit and present with swap chain
//!   recreation on resize
//! - **Staged mesh upload**: vertex and index data copied into device-local memory
//! - **Per-object submission**: one push-constant payload and draw per object
//! - **Camera math**: perspective/orthographic projections and view bases
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_renderer::prelude::*;
//!
//! fn draw(
//!     renderer: &mut Renderer,
//!     system: &SimpleRenderSystem,
//!     window: &mut dyn WindowSurface,
//!     objects: &[RenderableObject],
//!     camera: &Camera,
//! ) -> VulkanResult<()> {
//!     if let Some(cmd) = renderer.begin_frame(window)? {
//!         renderer.begin_swap_chain_render_pass(cmd);
//!         system.render_game_objects(cmd, objects, camera);
//!         renderer.end_swap_chain_render_pass(cmd);
//!         renderer.end_frame(window)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod input;
pub mod scene;
pub mod render;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        assets::{ObjError, ObjLoader},
        core::{ApplicationConfig, CameraConfig, Config, RendererConfig, SceneConfig, WindowConfig},
        foundation::{
            math::{Mat4, Vec3},
            time::Timer,
        },
        input::{KeyInput, KeyboardMovementController, MoveKey},
        render::{
            Camera, GraphicsDevice, MeshBuilder, MeshResource, Renderer, SimpleRenderSystem,
            SwapChain, VulkanError, VulkanResult, WindowSurface,
        },
        scene::{RenderableObject, Transform},
    };
}
