//! GPU-free test doubles
//!
//! [`RecordingDevice`] and [`ScriptedSwapChain`] append every call to one
//! shared log so tests can check the relative order of device and swap chain
//! operations. [`FakeWindow`] stands in for the OS window.

use ash::vk::{self, Handle};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::render::device::GraphicsDevice;
use crate::render::error::{VulkanError, VulkanResult};
use crate::render::pipeline::PipelineConfig;
use crate::render::swap_chain::{ImageAcquisition, PresentOutcome, SwapChain};
use crate::render::window::WindowSurface;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer {
        buffer: vk::Buffer,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    },
    DestroyBuffer {
        buffer: vk::Buffer,
    },
    WriteMemory {
        memory: vk::DeviceMemory,
        bytes: usize,
    },
    CopyBuffer {
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    },
    AllocateCommandBuffers {
        command_buffers: Vec<vk::CommandBuffer>,
    },
    FreeCommandBuffers {
        command_buffers: Vec<vk::CommandBuffer>,
    },
    BeginCommandBuffer(vk::CommandBuffer),
    EndCommandBuffer(vk::CommandBuffer),
    BeginRenderPass {
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_color: [f32; 4],
        clear_depth: f32,
        clear_stencil: u32,
    },
    EndRenderPass(vk::CommandBuffer),
    SetViewport {
        command_buffer: vk::CommandBuffer,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        min_depth: f32,
        max_depth: f32,
    },
    SetScissor {
        command_buffer: vk::CommandBuffer,
        offset: vk::Offset2D,
        extent: vk::Extent2D,
    },
    BindPipeline {
        command_buffer: vk::CommandBuffer,
        pipeline: vk::Pipeline,
    },
    PushConstants {
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: Vec<u8>,
    },
    BindVertexBuffer {
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
    },
    BindIndexBuffer {
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    },
    Draw {
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    CreatePipelineLayout {
        layout: vk::PipelineLayout,
        push_constants: Vec<(vk::ShaderStageFlags, u32, u32)>,
    },
    DestroyPipelineLayout(vk::PipelineLayout),
    CreateGraphicsPipeline {
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        render_pass: vk::RenderPass,
    },
    DestroyPipeline(vk::Pipeline),
    WaitIdle,
    AcquireNextImage {
        frame: usize,
    },
    SubmitCommandBuffers {
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        frame: usize,
    },
    RecreateSwapChain {
        extent: vk::Extent2D,
    },
}

/// Log shared between the doubles of one test
pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Device that records calls and simulates buffer memory on the host
pub struct RecordingDevice {
    log: CallLog,
    next_handle: Cell<u64>,
    buffer_memory: RefCell<HashMap<vk::Buffer, vk::DeviceMemory>>,
    memory_contents: RefCell<HashMap<vk::DeviceMemory, Vec<u8>>>,
    live_buffers: RefCell<Vec<vk::Buffer>>,
    create_buffer_calls: Cell<usize>,
    fail_create_buffer_at: Cell<Option<usize>>,
}

impl RecordingDevice {
    /// Device with its own log
    pub fn new() -> Rc<Self> {
        Self::with_log(CallLog::default())
    }

    /// Device appending to an existing log
    pub fn with_log(log: CallLog) -> Rc<Self> {
        Rc::new(Self {
            log,
            next_handle: Cell::new(0x1000),
            buffer_memory: RefCell::new(HashMap::new()),
            memory_contents: RefCell::new(HashMap::new()),
            live_buffers: RefCell::new(Vec::new()),
            create_buffer_calls: Cell::new(0),
            fail_create_buffer_at: Cell::new(None),
        })
    }

    /// Shared log
    pub fn log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    /// Snapshot of the recorded calls
    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Forget the calls recorded so far
    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    /// Make the `n`th `create_buffer` call (0-based) fail
    pub fn fail_create_buffer_at(&self, n: usize) {
        self.fail_create_buffer_at.set(Some(n));
    }

    /// Buffers created and not yet destroyed
    pub fn live_buffers(&self) -> Vec<vk::Buffer> {
        self.live_buffers.borrow().clone()
    }

    /// Bytes currently held by the memory bound to `buffer`
    pub fn buffer_contents(&self, buffer: vk::Buffer) -> Vec<u8> {
        let memory = self.buffer_memory.borrow()[&buffer];
        self.memory_contents.borrow()[&memory].clone()
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    fn next_raw(&self) -> u64 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<(vk::Buffer, vk::DeviceMemory)> {
        let call_index = self.create_buffer_calls.get();
        self.create_buffer_calls.set(call_index + 1);
        if self.fail_create_buffer_at.get() == Some(call_index) {
            return Err(VulkanError::creation("buffer", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        }

        let buffer = vk::Buffer::from_raw(self.next_raw());
        let memory = vk::DeviceMemory::from_raw(self.next_raw());
        self.buffer_memory.borrow_mut().insert(buffer, memory);
        self.memory_contents.borrow_mut().insert(memory, vec![0; size as usize]);
        self.live_buffers.borrow_mut().push(buffer);
        self.record(Call::CreateBuffer { buffer, size, usage, properties });
        Ok((buffer, memory))
    }

    fn destroy_buffer(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) {
        self.live_buffers.borrow_mut().retain(|&live| live != buffer);
        self.memory_contents.borrow_mut().remove(&memory);
        self.record(Call::DestroyBuffer { buffer });
    }

    fn write_memory(&self, memory: vk::DeviceMemory, data: &[u8]) -> VulkanResult<()> {
        if let Some(contents) = self.memory_contents.borrow_mut().get_mut(&memory) {
            contents[..data.len()].copy_from_slice(data);
        }
        self.record(Call::WriteMemory { memory, bytes: data.len() });
        Ok(())
    }

    fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) -> VulkanResult<()> {
        let (src_memory, dst_memory) = {
            let buffer_memory = self.buffer_memory.borrow();
            (buffer_memory[&src], buffer_memory[&dst])
        };
        let mut contents = self.memory_contents.borrow_mut();
        let bytes = contents[&src_memory][..size as usize].to_vec();
        if let Some(dst_contents) = contents.get_mut(&dst_memory) {
            dst_contents[..bytes.len()].copy_from_slice(&bytes);
        }
        drop(contents);
        self.record(Call::CopyBuffer { src, dst, size });
        Ok(())
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let command_buffers: Vec<_> = (0..count)
            .map(|_| vk::CommandBuffer::from_raw(self.next_raw()))
            .collect();
        self.record(Call::AllocateCommandBuffers { command_buffers: command_buffers.clone() });
        Ok(command_buffers)
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        self.record(Call::FreeCommandBuffers { command_buffers: command_buffers.to_vec() });
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.record(Call::BeginCommandBuffer(command_buffer));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.record(Call::EndCommandBuffer(command_buffer));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        // Attachment 0 is color, attachment 1 depth/stencil
        let (clear_color, depth_stencil) = unsafe {
            (clear_values[0].color.float32, clear_values[1].depth_stencil)
        };
        self.record(Call::BeginRenderPass {
            command_buffer,
            render_pass,
            framebuffer,
            extent,
            clear_color,
            clear_depth: depth_stencil.depth,
            clear_stencil: depth_stencil.stencil,
        });
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        self.record(Call::EndRenderPass(command_buffer));
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        self.record(Call::SetViewport {
            command_buffer,
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        });
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        self.record(Call::SetScissor {
            command_buffer,
            offset: scissor.offset,
            extent: scissor.extent,
        });
    }

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.record(Call::BindPipeline { command_buffer, pipeline });
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        self.record(Call::PushConstants {
            command_buffer,
            layout,
            stages,
            offset,
            data: data.to_vec(),
        });
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer, offset: vk::DeviceSize) {
        self.record(Call::BindVertexBuffer { command_buffer, buffer, offset });
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        self.record(Call::BindIndexBuffer { command_buffer, buffer, offset, index_type });
    }

    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.record(Call::Draw {
            command_buffer,
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.record(Call::DrawIndexed {
            command_buffer,
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn create_pipeline_layout(&self, push_constant_ranges: &[vk::PushConstantRange]) -> VulkanResult<vk::PipelineLayout> {
        let layout = vk::PipelineLayout::from_raw(self.next_raw());
        self.record(Call::CreatePipelineLayout {
            layout,
            push_constants: push_constant_ranges
                .iter()
                .map(|range| (range.stage_flags, range.offset, range.size))
                .collect(),
        });
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.record(Call::DestroyPipelineLayout(layout));
    }

    fn create_graphics_pipeline(
        &self,
        config: &PipelineConfig,
        _vertex_spirv: &[u32],
        _fragment_spirv: &[u32],
    ) -> VulkanResult<vk::Pipeline> {
        let pipeline = vk::Pipeline::from_raw(self.next_raw());
        self.record(Call::CreateGraphicsPipeline {
            pipeline,
            layout: config.pipeline_layout,
            render_pass: config.render_pass,
        });
        Ok(pipeline)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.record(Call::DestroyPipeline(pipeline));
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        self.record(Call::WaitIdle);
        Ok(())
    }
}

/// Swap chain whose acquire and present outcomes are scripted by the test
///
/// Unscripted acquires hand out image indices round-robin; unscripted presents
/// succeed.
pub struct ScriptedSwapChain {
    log: CallLog,
    extent: vk::Extent2D,
    image_count: usize,
    next_image: u32,
    image_format: vk::Format,
    depth_format: vk::Format,
    acquire_script: VecDeque<VulkanResult<ImageAcquisition>>,
    present_script: VecDeque<VulkanResult<PresentOutcome>>,
    image_format_after_recreate: Option<vk::Format>,
    render_pass: vk::RenderPass,
}

impl ScriptedSwapChain {
    /// Fake render pass handle
    pub const RENDER_PASS: u64 = 0xAA00;

    /// Chain of three images appending to `log`
    pub fn new(log: CallLog, extent: vk::Extent2D) -> Self {
        Self {
            log,
            extent,
            image_count: 3,
            next_image: 0,
            image_format: vk::Format::B8G8R8A8_SRGB,
            depth_format: vk::Format::D32_SFLOAT,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            image_format_after_recreate: None,
            render_pass: vk::RenderPass::from_raw(Self::RENDER_PASS),
        }
    }

    /// Queue the outcome of an upcoming acquire
    pub fn script_acquire(&mut self, outcome: VulkanResult<ImageAcquisition>) {
        self.acquire_script.push_back(outcome);
    }

    /// Queue the outcome of an upcoming present
    pub fn script_present(&mut self, outcome: VulkanResult<PresentOutcome>) {
        self.present_script.push_back(outcome);
    }

    /// Report a different image format once recreated
    pub fn change_image_format_on_recreate(&mut self, format: vk::Format) {
        self.image_format_after_recreate = Some(format);
    }

    /// Framebuffer handle used for image `index`
    pub fn framebuffer_for(index: u32) -> vk::Framebuffer {
        vk::Framebuffer::from_raw(0xFB00 + u64::from(index))
    }
}

impl SwapChain for ScriptedSwapChain {
    fn acquire_next_image(&mut self, frame: usize) -> VulkanResult<ImageAcquisition> {
        self.log.borrow_mut().push(Call::AcquireNextImage { frame });
        self.acquire_script.pop_front().unwrap_or_else(|| {
            let index = self.next_image;
            self.next_image = (self.next_image + 1) % self.image_count as u32;
            Ok(ImageAcquisition::Acquired(index))
        })
    }

    fn submit_command_buffers(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        frame: usize,
    ) -> VulkanResult<PresentOutcome> {
        self.log.borrow_mut().push(Call::SubmitCommandBuffers { command_buffer, image_index, frame });
        self.present_script.pop_front().unwrap_or(Ok(PresentOutcome::Presented))
    }

    fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    fn framebuffer(&self, index: u32) -> vk::Framebuffer {
        Self::framebuffer_for(index)
    }

    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn image_format(&self) -> vk::Format {
        self.image_format
    }

    fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    fn recreate(&mut self, extent: vk::Extent2D) -> VulkanResult<()> {
        self.log.borrow_mut().push(Call::RecreateSwapChain { extent });
        self.extent = extent;
        self.next_image = 0;
        if let Some(format) = self.image_format_after_recreate.take() {
            self.image_format = format;
        }
        Ok(())
    }
}

/// Window with a settable size and resize flag
pub struct FakeWindow {
    pub extent: vk::Extent2D,
    pub resized: bool,
    pub close_requested: bool,
    /// Extents taken on successive `wait_events` calls, e.g. to un-minimize
    pub extents_after_wait: VecDeque<vk::Extent2D>,
    pub wait_count: usize,
}

impl FakeWindow {
    /// Visible window of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: vk::Extent2D { width, height },
            resized: false,
            close_requested: false,
            extents_after_wait: VecDeque::new(),
            wait_count: 0,
        }
    }

    /// Simulate the user resizing the window
    pub fn resize(&mut self, width: u32, height: u32) {
        self.extent = vk::Extent2D { width, height };
        self.resized = true;
    }
}

impl WindowSurface for FakeWindow {
    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized_flag(&mut self) {
        self.resized = false;
    }

    fn wait_events(&mut self) {
        self.wait_count += 1;
        if let Some(extent) = self.extents_after_wait.pop_front() {
            self.extent = extent;
        }
    }

    fn required_instance_extensions(&self) -> VulkanResult<Vec<String>> {
        Ok(vec!["VK_KHR_surface".to_string()])
    }

    fn create_surface(&mut self, _instance: vk::Instance) -> VulkanResult<vk::SurfaceKHR> {
        Ok(vk::SurfaceKHR::from_raw(0x5EED))
    }
}
