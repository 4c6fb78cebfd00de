//! Swap chain collaborator
//!
//! A [`SwapChain`] owns the presentable images and everything sized to them
//! (image views, depth buffers, framebuffers, the render pass) plus the
//! per-frame synchronization objects. The frame controller drives it one frame
//! slot at a time.

use ash::vk;

use crate::render::error::VulkanResult;

/// Outcome of acquiring the next swap chain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAcquisition {
    /// Image at this index is ready to be rendered into
    Acquired(u32),
    /// The chain is out of date or suboptimal for the surface
    NeedsRecreation,
}

/// Outcome of submitting and presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Frame queued for presentation
    Presented,
    /// Frame was submitted but the chain no longer matches the surface
    NeedsRecreation,
}

/// Presentable image chain with per-frame synchronization
pub trait SwapChain {
    /// Wait on the fence guarding frame slot `frame`, then acquire the next image
    fn acquire_next_image(&mut self, frame: usize) -> VulkanResult<ImageAcquisition>;

    /// Submit `command_buffer` for `image_index` using frame slot `frame`, then present
    ///
    /// The submission waits for the slot's image-available semaphore at the
    /// color attachment output stage, signals its render-finished semaphore and
    /// its fence. If an earlier frame still renders into the same image, its
    /// fence is waited on first.
    fn submit_command_buffers(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        frame: usize,
    ) -> VulkanResult<PresentOutcome>;

    /// Render pass compatible with the framebuffers
    fn render_pass(&self) -> vk::RenderPass;

    /// Framebuffer for the image at `index`
    fn framebuffer(&self, index: u32) -> vk::Framebuffer;

    /// Size of the images
    fn extent(&self) -> vk::Extent2D;

    /// Width over height of the images
    fn extent_aspect_ratio(&self) -> f32 {
        let extent = self.extent();
        extent.width as f32 / extent.height as f32
    }

    /// Number of images in the chain
    fn image_count(&self) -> usize;

    /// Color format of the images
    fn image_format(&self) -> vk::Format;

    /// Format of the depth attachments
    fn depth_format(&self) -> vk::Format;

    /// Rebuild the chain for a new window extent, reusing the old chain handle
    fn recreate(&mut self, extent: vk::Extent2D) -> VulkanResult<()>;
}
