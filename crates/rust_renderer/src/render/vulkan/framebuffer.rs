//! Framebuffers and the depth images they attach

use ash::{vk, Device};

use crate::render::error::{VulkanError, VulkanResult};
use crate::render::vulkan::device::VulkanDevice;

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a new framebuffer
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .create_framebuffer(&framebuffer_create_info, None)
                .map_err(|e| VulkanError::creation("framebuffer", e))?
        };

        Ok(Self { device, framebuffer })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Device-local depth image, its memory and view
pub struct DepthBuffer {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
}

impl DepthBuffer {
    /// Create a depth buffer of `format` covering `extent`
    pub fn new(vulkan: &VulkanDevice, format: vk::Format, extent: vk::Extent2D) -> VulkanResult<Self> {
        let device = vulkan.device().clone();

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device
                .create_image(&image_create_info, None)
                .map_err(|e| VulkanError::creation("depth image", e))?
        };

        // From here on a failure must release what was already created
        let mut buffer = Self {
            device,
            image,
            memory: vk::DeviceMemory::null(),
            image_view: vk::ImageView::null(),
        };

        let requirements = unsafe { buffer.device.get_image_memory_requirements(image) };
        let memory_type_index =
            vulkan.find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        buffer.memory = unsafe {
            buffer
                .device
                .allocate_memory(&alloc_info, None)
                .map_err(|e| VulkanError::creation("depth image memory", e))?
        };

        unsafe {
            buffer
                .device
                .bind_image_memory(image, buffer.memory, 0)
                .map_err(VulkanError::from_result)?;
        }

        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        buffer.image_view = unsafe {
            buffer
                .device
                .create_image_view(&image_view_create_info, None)
                .map_err(|e| VulkanError::creation("depth image view", e))?
        };

        Ok(buffer)
    }

    /// Get the image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        // Destroying or freeing a null handle is a no-op
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
