//! Vulkan implementation of [`SwapChain`]

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};
use std::rc::Rc;

use crate::render::error::{VulkanError, VulkanResult};
use crate::render::swap_chain::{ImageAcquisition, PresentOutcome, SwapChain};
use crate::render::vulkan::device::VulkanDevice;
use crate::render::vulkan::framebuffer::{DepthBuffer, Framebuffer};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::sync::FrameSync;

const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Everything sized to the surface, rebuilt together on recreation
struct ChainResources {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    depth_format: vk::Format,
    extent: vk::Extent2D,
    framebuffers: Vec<Framebuffer>,
    render_pass: RenderPass,
    depth_buffers: Vec<DepthBuffer>,
}

impl ChainResources {
    fn new(
        vulkan: &VulkanDevice,
        loader: &SwapchainLoader,
        window_extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let device = vulkan.device().clone();
        let physical = vulkan.physical_device();
        let surface = vulkan.surface();

        let surface_caps = unsafe {
            surface
                .loader
                .get_physical_device_surface_capabilities(physical.device, surface.surface)
                .map_err(VulkanError::from_result)?
        };

        let surface_formats = unsafe {
            surface
                .loader
                .get_physical_device_surface_formats(physical.device, surface.surface)
                .map_err(VulkanError::from_result)?
        };
        let format = surface_formats
            .iter()
            .find(|sf| sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
            .or_else(|| surface_formats.first())
            .copied()
            .ok_or_else(|| VulkanError::Surface("surface reports no formats".to_string()))?;

        let present_modes = unsafe {
            surface
                .loader
                .get_physical_device_surface_present_modes(physical.device, surface.surface)
                .map_err(VulkanError::from_result)?
        };
        let present_mode = present_modes
            .iter()
            .copied()
            .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
            .unwrap_or(vk::PresentModeKHR::FIFO);
        log::debug!("Present mode: {:?}", present_mode);

        let extent = if surface_caps.current_extent.width != u32::MAX {
            surface_caps.current_extent
        } else {
            vk::Extent2D {
                width: window_extent
                    .width
                    .clamp(surface_caps.min_image_extent.width, surface_caps.max_image_extent.width),
                height: window_extent
                    .height
                    .clamp(surface_caps.min_image_extent.height, surface_caps.max_image_extent.height),
            }
        };

        let image_count = if surface_caps.max_image_count > 0 {
            (surface_caps.min_image_count + 1).min(surface_caps.max_image_count)
        } else {
            surface_caps.min_image_count + 1
        };

        let queue_families = [physical.graphics_family, physical.present_family];
        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);
        create_info = if physical.graphics_family == physical.present_family {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_families)
        };

        let swapchain = unsafe {
            loader
                .create_swapchain(&create_info, None)
                .map_err(|e| match VulkanError::from_result(e) {
                    VulkanError::Api(code) => VulkanError::Surface(format!("failed to create swap chain: {:?}", code)),
                    classified => classified,
                })?
        };

        let depth_and_pass = vulkan
            .find_supported_format(
                &DEPTH_FORMAT_CANDIDATES,
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            )
            .and_then(|depth_format| {
                RenderPass::new_forward_pass(device.clone(), format.format, depth_format)
                    .map(|render_pass| (depth_format, render_pass))
            });
        let (depth_format, render_pass) = match depth_and_pass {
            Ok(pair) => pair,
            Err(e) => {
                unsafe { loader.destroy_swapchain(swapchain, None) };
                return Err(e);
            }
        };

        // Owned from here on so an error below still destroys what exists
        let mut resources = Self {
            device,
            loader: loader.clone(),
            swapchain,
            image_views: Vec::new(),
            format,
            depth_format,
            extent,
            framebuffers: Vec::new(),
            render_pass,
            depth_buffers: Vec::new(),
        };

        let images = unsafe {
            loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::from_result)?
        };

        for &image in &images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe {
                resources
                    .device
                    .create_image_view(&create_info, None)
                    .map_err(|e| VulkanError::creation("swap chain image view", e))?
            };
            resources.image_views.push(view);
        }

        for &view in &resources.image_views {
            let depth = DepthBuffer::new(vulkan, depth_format, extent)?;
            let framebuffer = Framebuffer::new(
                resources.device.clone(),
                resources.render_pass.handle(),
                &[view, depth.image_view()],
                extent,
            )?;
            resources.depth_buffers.push(depth);
            resources.framebuffers.push(framebuffer);
        }

        log::debug!(
            "Swap chain: {} images, {:?}, depth {:?}, {}x{}",
            images.len(),
            format.format,
            depth_format,
            extent.width,
            extent.height
        );

        Ok(resources)
    }
}

impl Drop for ChainResources {
    fn drop(&mut self) {
        self.framebuffers.clear();
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Swap chain, its attachments and the per-frame synchronization objects
pub struct VulkanSwapChain {
    resources: ChainResources,
    frames: Vec<FrameSync>,
    images_in_flight: Vec<vk::Fence>,
    loader: SwapchainLoader,
    device: Rc<VulkanDevice>,
}

impl VulkanSwapChain {
    /// Create a swap chain for the device's surface with `max_frames_in_flight` frame slots
    pub fn new(device: Rc<VulkanDevice>, window_extent: vk::Extent2D, max_frames_in_flight: usize) -> VulkanResult<Self> {
        let loader = SwapchainLoader::new(device.instance(), device.device());
        let resources = ChainResources::new(&device, &loader, window_extent, vk::SwapchainKHR::null())?;

        let frames = (0..max_frames_in_flight)
            .map(|_| FrameSync::new(device.device()))
            .collect::<VulkanResult<Vec<_>>>()?;
        let images_in_flight = vec![vk::Fence::null(); resources.image_views.len()];

        Ok(Self {
            resources,
            frames,
            images_in_flight,
            loader,
            device,
        })
    }

    fn frame_sync(&self, frame: usize) -> &FrameSync {
        assert!(
            frame < self.frames.len(),
            "frame slot {} out of range ({} slots)",
            frame,
            self.frames.len()
        );
        &self.frames[frame]
    }

    /// Wait on an image-available semaphore whose image will not be rendered
    ///
    /// A suboptimal acquire still signals the semaphore; an empty submission
    /// consumes that signal so the semaphore can be reused.
    fn discard_acquired_image(&self, frame: usize) -> VulkanResult<()> {
        let wait_semaphores = [self.frame_sync(frame).image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::ALL_COMMANDS];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages);

        unsafe {
            self.device
                .device()
                .queue_submit(self.device.graphics_queue(), &[submit_info.build()], vk::Fence::null())
                .map_err(VulkanError::from_result)
        }
    }
}

impl SwapChain for VulkanSwapChain {
    fn acquire_next_image(&mut self, frame: usize) -> VulkanResult<ImageAcquisition> {
        let sync = self.frame_sync(frame);
        sync.in_flight.wait(u64::MAX)?;

        let result = unsafe {
            self.loader.acquire_next_image(
                self.resources.swapchain,
                u64::MAX,
                sync.image_available.handle(),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, false)) => Ok(ImageAcquisition::Acquired(index)),
            Ok((_, true)) => {
                self.discard_acquired_image(frame)?;
                Ok(ImageAcquisition::NeedsRecreation)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(ImageAcquisition::NeedsRecreation),
            Err(e) => Err(VulkanError::from_result(e)),
        }
    }

    fn submit_command_buffers(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        frame: usize,
    ) -> VulkanResult<PresentOutcome> {
        let image = image_index as usize;
        let device = self.device.device();
        let in_flight = self.frame_sync(frame).in_flight.handle();

        // An earlier slot may still be rendering into this image
        let previous = self.images_in_flight[image];
        if previous != vk::Fence::null() && previous != in_flight {
            unsafe {
                device
                    .wait_for_fences(&[previous], true, u64::MAX)
                    .map_err(VulkanError::from_result)?;
            }
        }
        self.images_in_flight[image] = in_flight;

        let sync = self.frame_sync(frame);
        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished.handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        sync.in_flight.reset()?;
        unsafe {
            device
                .queue_submit(self.device.graphics_queue(), &[submit_info.build()], in_flight)
                .map_err(VulkanError::from_result)?;
        }

        let swapchains = [self.resources.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(self.device.present_queue(), &present_info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::NeedsRecreation),
            Err(e) => Err(VulkanError::from_result(e)),
        }
    }

    fn render_pass(&self) -> vk::RenderPass {
        self.resources.render_pass.handle()
    }

    fn framebuffer(&self, index: u32) -> vk::Framebuffer {
        self.resources.framebuffers[index as usize].handle()
    }

    fn extent(&self) -> vk::Extent2D {
        self.resources.extent
    }

    fn image_count(&self) -> usize {
        self.resources.image_views.len()
    }

    fn image_format(&self) -> vk::Format {
        self.resources.format.format
    }

    fn depth_format(&self) -> vk::Format {
        self.resources.depth_format
    }

    fn recreate(&mut self, extent: vk::Extent2D) -> VulkanResult<()> {
        let resources = ChainResources::new(&self.device, &self.loader, extent, self.resources.swapchain)?;
        self.resources = resources;

        // The device is idle, so no image is still owned by a frame slot
        self.images_in_flight = vec![vk::Fence::null(); self.resources.image_views.len()];
        Ok(())
    }
}

impl Drop for VulkanSwapChain {
    fn drop(&mut self) {
        if let Err(e) = unsafe { self.device.device().device_wait_idle() } {
            log::warn!("device_wait_idle failed while dropping swap chain: {:?}", e);
        }
    }
}
