//! Device collaborator
//!
//! [`GraphicsDevice`] is the narrow slice of a Vulkan logical device that the
//! frame controller, mesh resources and render systems need: buffer and memory
//! management, one-shot transfers, command buffer lifetime, command recording
//! and pipeline objects. The production implementation is
//! [`VulkanDevice`](crate::render::vulkan::VulkanDevice); tests use a recording
//! double.
//!
//! All methods take `&self`. Handles are plain `ash` handles; ownership of what
//! they refer to is tracked by the RAII wrappers built on top of this trait
//! ([`DeviceBuffer`](crate::render::buffer::DeviceBuffer),
//! [`GraphicsPipeline`](crate::render::pipeline::GraphicsPipeline)).

use ash::vk;

use crate::render::error::VulkanResult;
use crate::render::pipeline::PipelineConfig;

/// Logical device operations used by the renderer core
pub trait GraphicsDevice {
    // Buffers and memory

    /// Create a buffer and bind freshly allocated memory with the given properties to it
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<(vk::Buffer, vk::DeviceMemory)>;

    /// Destroy a buffer and free its memory
    fn destroy_buffer(&self, buffer: vk::Buffer, memory: vk::DeviceMemory);

    /// Map host-visible memory, copy `data` to its start, unmap
    fn write_memory(&self, memory: vk::DeviceMemory, data: &[u8]) -> VulkanResult<()>;

    /// Copy `size` bytes between buffers and wait for the copy to finish
    fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) -> VulkanResult<()>;

    // Command buffers

    /// Allocate primary command buffers from the graphics command pool
    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>>;

    /// Return command buffers to the pool
    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]);

    /// Begin recording
    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Finish recording
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    // Recording

    /// Begin an inline render pass covering `extent`
    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    );

    /// End the current render pass
    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);

    /// Set the dynamic viewport
    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport);

    /// Set the dynamic scissor
    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D);

    /// Bind a graphics pipeline
    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline);

    /// Record a push constant update
    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );

    /// Bind one vertex buffer at binding 0
    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer, offset: vk::DeviceSize);

    /// Bind an index buffer
    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    );

    /// Non-indexed draw
    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Indexed draw
    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );

    // Pipelines

    /// Create a pipeline layout with no descriptor sets
    fn create_pipeline_layout(&self, push_constant_ranges: &[vk::PushConstantRange]) -> VulkanResult<vk::PipelineLayout>;

    /// Destroy a pipeline layout
    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    /// Build a graphics pipeline from fixed-function settings and SPIR-V code
    fn create_graphics_pipeline(
        &self,
        config: &PipelineConfig,
        vertex_spirv: &[u32],
        fragment_spirv: &[u32],
    ) -> VulkanResult<vk::Pipeline>;

    /// Destroy a pipeline
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    // Synchronization

    /// Wait until the device has finished all submitted work
    fn wait_idle(&self) -> VulkanResult<()>;
}
