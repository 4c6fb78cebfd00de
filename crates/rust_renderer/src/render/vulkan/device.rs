//! Vulkan implementation of [`GraphicsDevice`]
//!
//! [`VulkanDevice`] owns everything that lives as long as the window: the
//! instance (with the optional validation messenger), the surface, the chosen
//! physical device, the logical device with its graphics and present queues,
//! and the graphics command pool. Swap chains borrow it through an `Rc`.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};
use std::collections::HashSet;
use std::ffi::CStr;

use crate::core::config::RendererConfig;
use crate::render::device::GraphicsDevice;
use crate::render::error::{VulkanError, VulkanResult};
use crate::render::pipeline::PipelineConfig;
use crate::render::vulkan::commands::CommandPool;
use crate::render::vulkan::instance::{VulkanInstance, VulkanSurface};
use crate::render::vulkan::shader::ShaderModule;
use crate::render::window::WindowSurface;

/// Physical device selection and capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick the first device with graphics and present queues and swap chain support
    pub fn select_suitable_device(instance: &Instance, surface: &VulkanSurface) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::from_result)?
        };
        log::debug!("Found {} physical device(s)", devices.len());

        for device in devices {
            match Self::evaluate_device(instance, device, surface) {
                Ok(info) => {
                    log::info!("Selected GPU: {}", info.name());
                    return Ok(info);
                }
                Err(reason) => log::debug!("Skipping physical device: {}", reason),
            }
        }

        Err(VulkanError::InitializationFailed("No suitable GPU found".to_string()))
    }

    fn evaluate_device(instance: &Instance, device: vk::PhysicalDevice, surface: &VulkanSurface) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface
                    .loader
                    .get_physical_device_surface_support(device, index, surface.surface)
                    .map_err(VulkanError::from_result)?
            };
            if family.queue_count > 0 && present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family
            .ok_or_else(|| VulkanError::InitializationFailed("No graphics queue family found".to_string()))?;
        let present_family = present_family
            .ok_or_else(|| VulkanError::InitializationFailed("No present queue family found".to_string()))?;

        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::from_result)?
        };
        let has_swapchain = extensions.iter().any(|available| {
            let name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        });
        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Required device extensions not supported".to_string(),
            ));
        }

        let formats = unsafe {
            surface
                .loader
                .get_physical_device_surface_formats(device, surface.surface)
                .map_err(VulkanError::from_result)?
        };
        let present_modes = unsafe {
            surface
                .loader
                .get_physical_device_surface_present_modes(device, surface.surface)
                .map_err(VulkanError::from_result)?
        };
        if formats.is_empty() || present_modes.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "Surface has no formats or present modes".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            memory_properties,
            graphics_family,
            present_family,
        })
    }

    /// Human readable device name
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
}

impl LogicalDevice {
    /// Create a logical device with one queue per distinct family
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: HashSet<u32> = [physical.graphics_family, physical.present_family]
            .into_iter()
            .collect();

        let priorities = [1.0_f32];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let extensions = [SwapchainLoader::name().as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .create_device(physical.device, &create_info, None)
                .map_err(|e| VulkanError::creation("logical device", e))?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical.present_family, 0) };

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_device(None);
        }
    }
}

/// Window-lifetime Vulkan objects
///
/// Field order is destruction order: the command pool goes before the logical
/// device, the device before the surface, the surface before the instance.
pub struct VulkanDevice {
    command_pool: CommandPool,
    logical: LogicalDevice,
    physical: PhysicalDeviceInfo,
    surface: VulkanSurface,
    instance: VulkanInstance,
}

impl VulkanDevice {
    /// Bring up Vulkan for `window`
    pub fn new(window: &mut dyn WindowSurface, config: &RendererConfig) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, &config.application_name, config.validation_enabled())?;
        let surface = VulkanSurface::new(&instance, window)?;
        let physical = PhysicalDeviceInfo::select_suitable_device(&instance.instance, &surface)?;
        let logical = LogicalDevice::new(&instance.instance, &physical)?;
        let command_pool = CommandPool::new(logical.device.clone(), physical.graphics_family)?;

        log::info!(
            "Vulkan device ready (graphics family {}, present family {})",
            physical.graphics_family,
            physical.present_family
        );

        Ok(Self {
            command_pool,
            logical,
            physical,
            surface,
            instance,
        })
    }

    /// Logical device
    pub fn device(&self) -> &Device {
        &self.logical.device
    }

    /// Instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Presentation surface
    pub fn surface(&self) -> &VulkanSurface {
        &self.surface
    }

    /// Selected physical device
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical
    }

    /// Queue used for rendering and transfers
    pub fn graphics_queue(&self) -> vk::Queue {
        self.logical.graphics_queue
    }

    /// Queue used for presentation
    pub fn present_queue(&self) -> vk::Queue {
        self.logical.present_queue
    }

    /// Index of a memory type allowed by `type_filter` that has all of `properties`
    pub fn find_memory_type(&self, type_filter: u32, properties: vk::MemoryPropertyFlags) -> VulkanResult<u32> {
        let memory = &self.physical.memory_properties;
        (0..memory.memory_type_count)
            .find(|&i| {
                type_filter & (1 << i) != 0 && memory.memory_types[i as usize].property_flags.contains(properties)
            })
            .ok_or(VulkanError::NoSuitableMemoryType)
    }

    /// First of `candidates` supporting `features` with the given tiling
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> VulkanResult<vk::Format> {
        candidates
            .iter()
            .copied()
            .find(|&format| {
                let props = unsafe {
                    self.instance()
                        .get_physical_device_format_properties(self.physical.device, format)
                };
                match tiling {
                    vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                    vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                    _ => false,
                }
            })
            .ok_or_else(|| VulkanError::InitializationFailed("No supported format among candidates".to_string()))
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        if let Err(e) = unsafe { self.logical.device.device_wait_idle() } {
            log::warn!("device_wait_idle failed during shutdown: {:?}", e);
        }
    }
}

impl GraphicsDevice for VulkanDevice {
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<(vk::Buffer, vk::DeviceMemory)> {
        let device = self.device();
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(|e| VulkanError::creation("buffer", e))?
        };

        let allocate = || -> VulkanResult<vk::DeviceMemory> {
            let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
            let alloc_info = vk::MemoryAllocateInfo::builder()
                .allocation_size(requirements.size)
                .memory_type_index(
                    self.find_memory_type(requirements.memory_type_bits, properties)
                        .map_err(|e| e.during_creation("buffer memory"))?,
                );

            let memory = unsafe {
                device
                    .allocate_memory(&alloc_info, None)
                    .map_err(|e| VulkanError::creation("buffer memory", e))?
            };
            if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
                unsafe { device.free_memory(memory, None) };
                return Err(VulkanError::creation("buffer memory binding", e));
            }
            Ok(memory)
        };

        match allocate() {
            Ok(memory) => Ok((buffer, memory)),
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                Err(e)
            }
        }
    }

    fn destroy_buffer(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) {
        unsafe {
            self.device().destroy_buffer(buffer, None);
            self.device().free_memory(memory, None);
        }
    }

    fn write_memory(&self, memory: vk::DeviceMemory, data: &[u8]) -> VulkanResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        unsafe {
            let mapped = self
                .device()
                .map_memory(memory, 0, data.len() as vk::DeviceSize, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::from_result)?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.cast::<u8>(), data.len());
            self.device().unmap_memory(memory);
        }
        Ok(())
    }

    fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) -> VulkanResult<()> {
        self.command_pool.submit_single_time(self.graphics_queue(), |device, cmd| {
            let region = vk::BufferCopy {
                src_offset: 0,
                dst_offset: 0,
                size,
            };
            unsafe { device.cmd_copy_buffer(cmd, src, dst, &[region]) };
        })
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.command_pool.allocate(count)
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        self.command_pool.free(command_buffers);
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe {
            self.device()
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::from_result)
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        unsafe {
            self.device()
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::from_result)
        }
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(clear_values);

        unsafe {
            self.device()
                .cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device().cmd_end_render_pass(command_buffer) }
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        unsafe { self.device().cmd_set_viewport(command_buffer, 0, &[viewport]) }
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        unsafe { self.device().cmd_set_scissor(command_buffer, 0, &[scissor]) }
    }

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.device()
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device()
                .cmd_push_constants(command_buffer, layout, stages, offset, data);
        }
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer, offset: vk::DeviceSize) {
        unsafe {
            self.device()
                .cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[offset]);
        }
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        unsafe {
            self.device()
                .cmd_bind_index_buffer(command_buffer, buffer, offset, index_type);
        }
    }

    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        unsafe {
            self.device()
                .cmd_draw(command_buffer, vertex_count, instance_count, first_vertex, first_instance);
        }
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
        unsafe {
            self.device().cmd_draw_indexed(
                command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    fn create_pipeline_layout(&self, push_constant_ranges: &[vk::PushConstantRange]) -> VulkanResult<vk::PipelineLayout> {
        let layout_info = vk::PipelineLayoutCreateInfo::builder().push_constant_ranges(push_constant_ranges);
        unsafe {
            self.device()
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| VulkanError::creation("pipeline layout", e))
        }
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { self.device().destroy_pipeline_layout(layout, None) }
    }

    fn create_graphics_pipeline(
        &self,
        config: &PipelineConfig,
        vertex_spirv: &[u32],
        fragment_spirv: &[u32],
    ) -> VulkanResult<vk::Pipeline> {
        let vertex_shader = ShaderModule::from_code(self.device().clone(), vertex_spirv)?;
        let fragment_shader = ShaderModule::from_code(self.device().clone(), fragment_spirv)?;

        let shader_stages = [
            vertex_shader.stage_info(vk::ShaderStageFlags::VERTEX)?,
            fragment_shader.stage_info(vk::ShaderStageFlags::FRAGMENT)?,
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&config.binding_descriptions)
            .vertex_attribute_descriptions(&config.attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(config.topology)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts are baked in
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(config.polygon_mode)
            .line_width(1.0)
            .cull_mode(config.cull_mode)
            .front_face(config.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .min_sample_shading(1.0);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(config.depth_test_enable)
            .depth_write_enable(config.depth_write_enable)
            .depth_compare_op(config.depth_compare_op)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(&color_blend_attachments);

        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&config.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(config.pipeline_layout)
            .render_pass(config.render_pass)
            .subpass(config.subpass);

        let pipelines = unsafe {
            self.device()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, e)| VulkanError::creation("graphics pipeline", e))?
        };

        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::ResourceCreation {
                resource: "graphics pipeline",
                reason: "driver returned no pipeline".to_string(),
            })
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { self.device().destroy_pipeline(pipeline, None) }
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device().device_wait_idle().map_err(VulkanError::from_result) }
    }
}
