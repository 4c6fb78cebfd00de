//! Windowing collaborator
//!
//! The renderer never talks to a windowing library directly. Whatever owns the
//! OS window implements [`WindowSurface`] so the frame controller can query its
//! framebuffer size and resize state, and the Vulkan backend can create a
//! presentation surface for it.

use ash::vk;

use crate::render::error::VulkanResult;

/// Window that can be rendered into
pub trait WindowSurface {
    /// Current framebuffer size in pixels; zero while minimized
    fn extent(&self) -> vk::Extent2D;

    /// Whether the user asked to close the window
    fn should_close(&self) -> bool;

    /// Whether the framebuffer was resized since the flag was last reset
    fn was_resized(&self) -> bool;

    /// Clear the resize flag after the swap chain has been rebuilt
    fn reset_resized_flag(&mut self);

    /// Block until at least one window event arrives
    fn wait_events(&mut self);

    /// Instance extensions needed to present to this window
    fn required_instance_extensions(&self) -> VulkanResult<Vec<String>>;

    /// Create a presentation surface for this window
    fn create_surface(&mut self, instance: vk::Instance) -> VulkanResult<vk::SurfaceKHR>;
}
