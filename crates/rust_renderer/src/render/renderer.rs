//! Frame controller
//!
//! The [`Renderer`] owns the swap chain and one command buffer per frame in
//! flight, and enforces the order of the per-frame protocol:
//!
//! ```text
//! Idle --begin_frame--> FrameAcquired --begin_swap_chain_render_pass--> RenderPassActive
//!  ^                       |     ^                                          |
//!  +-------end_frame-------+     +------end_swap_chain_render_pass----------+
//! ```
//!
//! Calling a frame-scoped operation from the wrong state is a programming
//! error and panics. A swap chain that no longer matches the window is
//! rebuilt transparently: `begin_frame` then returns `Ok(None)` and the caller
//! skips the tick.

use ash::vk;
use std::rc::Rc;

use crate::core::config::{RendererConfig, MAX_FRAMES_IN_FLIGHT_LIMIT};
use crate::render::device::GraphicsDevice;
use crate::render::error::{VulkanError, VulkanResult};
use crate::render::swap_chain::{ImageAcquisition, PresentOutcome, SwapChain};
use crate::render::window::WindowSurface;

/// Where the renderer is in the per-frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No frame is being recorded
    Idle,
    /// An image was acquired and its command buffer is recording
    FrameAcquired,
    /// The swap chain render pass is open on the current command buffer
    RenderPassActive,
}

/// Frame lifecycle controller
pub struct Renderer {
    device: Rc<dyn GraphicsDevice>,
    swap_chain: Box<dyn SwapChain>,
    command_buffers: Vec<vk::CommandBuffer>,
    clear_color: [f32; 4],
    current_image_index: u32,
    current_frame_index: usize,
    state: FrameState,
}

impl Renderer {
    /// Create the frame controller and its per-frame command buffers
    ///
    /// # Panics
    /// Panics if `config.max_frames_in_flight` is outside `1..=8`.
    pub fn new(
        device: Rc<dyn GraphicsDevice>,
        swap_chain: Box<dyn SwapChain>,
        config: &RendererConfig,
    ) -> VulkanResult<Self> {
        let frames = config.max_frames_in_flight;
        assert!(
            (1..=MAX_FRAMES_IN_FLIGHT_LIMIT).contains(&frames),
            "max_frames_in_flight must be in 1..={}, got {}",
            MAX_FRAMES_IN_FLIGHT_LIMIT,
            frames
        );

        let command_buffers = device.allocate_command_buffers(frames as u32)?;
        log::info!(
            "Renderer created: {} frames in flight, {} swap chain images, extent {}x{}",
            frames,
            swap_chain.image_count(),
            swap_chain.extent().width,
            swap_chain.extent().height
        );

        Ok(Self {
            device,
            swap_chain,
            command_buffers,
            clear_color: config.clear_color,
            current_image_index: 0,
            current_frame_index: 0,
            state: FrameState::Idle,
        })
    }

    /// Acquire the next image and start recording its command buffer
    ///
    /// Returns `Ok(None)` when the swap chain had to be recreated; nothing
    /// should be recorded this tick.
    ///
    /// # Panics
    /// Panics if a frame is already in progress.
    pub fn begin_frame(&mut self, window: &mut dyn WindowSurface) -> VulkanResult<Option<vk::CommandBuffer>> {
        assert!(
            self.state == FrameState::Idle,
            "Can't call begin_frame while a frame is already in progress"
        );

        match self.swap_chain.acquire_next_image(self.current_frame_index)? {
            ImageAcquisition::Acquired(image_index) => self.current_image_index = image_index,
            ImageAcquisition::NeedsRecreation => {
                log::debug!("Swap chain stale at acquire, skipping frame");
                self.recreate_swap_chain(window)?;
                return Ok(None);
            }
        }

        let command_buffer = self.command_buffers[self.current_frame_index];
        self.device.begin_command_buffer(command_buffer)?;
        self.state = FrameState::FrameAcquired;
        Ok(Some(command_buffer))
    }

    /// Finish recording, submit and present
    ///
    /// Recreates the swap chain afterwards if presentation reported it stale
    /// or the window was resized.
    ///
    /// # Panics
    /// Panics unless a frame is in progress with its render pass closed.
    pub fn end_frame(&mut self, window: &mut dyn WindowSurface) -> VulkanResult<()> {
        assert!(
            self.state != FrameState::RenderPassActive,
            "Can't call end_frame while the render pass is still active"
        );
        assert!(
            self.state == FrameState::FrameAcquired,
            "Can't call end_frame while frame not in progress"
        );

        let command_buffer = self.current_command_buffer();
        let submitted = self.device.end_command_buffer(command_buffer).and_then(|()| {
            self.swap_chain
                .submit_command_buffers(command_buffer, self.current_image_index, self.current_frame_index)
        });

        self.state = FrameState::Idle;
        self.current_frame_index = (self.current_frame_index + 1) % self.command_buffers.len();

        let outcome = submitted?;
        if outcome == PresentOutcome::NeedsRecreation || window.was_resized() {
            self.recreate_swap_chain(window)?;
        }
        Ok(())
    }

    /// Begin the swap chain render pass on the acquired image
    ///
    /// Clears color to the configured clear color and depth to 1.0, and sets
    /// viewport and scissor to the full swap chain extent.
    ///
    /// # Panics
    /// Panics unless a frame is in progress, no render pass is open and
    /// `command_buffer` belongs to the current frame.
    pub fn begin_swap_chain_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        assert!(
            self.state == FrameState::FrameAcquired,
            "Can't call begin_swap_chain_render_pass if frame is not in progress or a render pass is already active"
        );
        assert!(
            command_buffer == self.current_command_buffer(),
            "Can't begin render pass on command buffer from a different frame"
        );

        let extent = self.swap_chain.extent();
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: self.clear_color },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        self.device.cmd_begin_render_pass(
            command_buffer,
            self.swap_chain.render_pass(),
            self.swap_chain.framebuffer(self.current_image_index),
            extent,
            &clear_values,
        );

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        self.device.cmd_set_viewport(command_buffer, viewport);
        self.device.cmd_set_scissor(command_buffer, scissor);

        self.state = FrameState::RenderPassActive;
    }

    /// End the swap chain render pass
    ///
    /// # Panics
    /// Panics unless the render pass is open on `command_buffer`.
    pub fn end_swap_chain_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        assert!(
            self.state == FrameState::RenderPassActive,
            "Can't call end_swap_chain_render_pass without an active render pass"
        );
        assert!(
            command_buffer == self.current_command_buffer(),
            "Can't end render pass on command buffer from a different frame"
        );

        self.device.cmd_end_render_pass(command_buffer);
        self.state = FrameState::FrameAcquired;
    }

    /// Rebuild the swap chain for the window's current size
    ///
    /// Blocks while the window is minimized, then waits for the device to go
    /// idle before anything sized to the old images is destroyed. Command
    /// buffers are kept. Clears the window's resize flag, since the new chain
    /// already matches its size.
    ///
    /// # Panics
    /// Panics if a frame is in progress.
    pub fn recreate_swap_chain(&mut self, window: &mut dyn WindowSurface) -> VulkanResult<()> {
        assert!(
            self.state == FrameState::Idle,
            "Can't recreate the swap chain while a frame is in progress"
        );

        let mut extent = window.extent();
        while extent.width == 0 || extent.height == 0 {
            window.wait_events();
            extent = window.extent();
        }
        window.reset_resized_flag();

        self.device.wait_idle()?;

        let image_format = self.swap_chain.image_format();
        let depth_format = self.swap_chain.depth_format();
        self.swap_chain.recreate(extent)?;

        if self.swap_chain.image_format() != image_format || self.swap_chain.depth_format() != depth_format {
            return Err(VulkanError::Surface(
                "Swap chain image (or depth) format has changed".to_string(),
            ));
        }

        log::info!("Swap chain recreated at {}x{}", extent.width, extent.height);
        Ok(())
    }

    /// Whether a frame is between `begin_frame` and `end_frame`
    pub fn is_frame_in_progress(&self) -> bool {
        self.state != FrameState::Idle
    }

    /// Current protocol state
    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    /// Command buffer of the frame being recorded
    ///
    /// # Panics
    /// Panics if no frame is in progress.
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        assert!(
            self.is_frame_in_progress(),
            "Cannot get command buffer when frame not in progress"
        );
        self.command_buffers[self.current_frame_index]
    }

    /// Index of the in-flight frame slot being recorded
    ///
    /// # Panics
    /// Panics if no frame is in progress.
    pub fn frame_index(&self) -> usize {
        assert!(
            self.is_frame_in_progress(),
            "Cannot get frame index when frame not in progress"
        );
        self.current_frame_index
    }

    /// Render pass of the swap chain framebuffers
    pub fn swap_chain_render_pass(&self) -> vk::RenderPass {
        self.swap_chain.render_pass()
    }

    /// Width over height of the current swap chain extent
    pub fn aspect_ratio(&self) -> f32 {
        self.swap_chain.extent_aspect_ratio()
    }

    /// Current swap chain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.swap_chain.extent()
    }

    /// Number of frames that may be in flight
    pub fn max_frames_in_flight(&self) -> usize {
        self.command_buffers.len()
    }

    /// Wait until the device has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        self.device.wait_idle()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            log::warn!("wait_idle failed while dropping renderer: {}", e);
        }
        self.device.free_command_buffers(&self.command_buffers);
        log::debug!("Renderer dropped, {} command buffers freed", self.command_buffers.len());
    }
}
