//! Buffer management for mesh data
//!
//! Memory management following RAII patterns: a [`DeviceBuffer`] owns exactly
//! one (buffer, memory) pair and gives it back to the device when dropped.

use ash::vk;
use std::rc::Rc;

use crate::render::device::GraphicsDevice;
use crate::render::error::VulkanResult;

/// Buffer wrapper with memory management
///
/// Move-only. Dropping it destroys the buffer and frees the memory exactly once.
pub struct DeviceBuffer {
    device: Rc<dyn GraphicsDevice>,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl DeviceBuffer {
    /// Create a new buffer with memory allocation
    pub fn new(
        device: Rc<dyn GraphicsDevice>,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let (buffer, memory) = device.create_buffer(size, usage, properties)?;
        log::trace!("Created buffer {:?} ({} bytes, {:?})", buffer, size, usage);

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Host-visible staging buffer filled with `data`
    pub fn staging(device: Rc<dyn GraphicsDevice>, data: &[u8]) -> VulkanResult<Self> {
        let staging = Self::new(
            device,
            data.len() as vk::DeviceSize,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.write_data(data)?;
        Ok(staging)
    }

    /// Write data to buffer (memory must be host visible)
    pub fn write_data(&self, data: &[u8]) -> VulkanResult<()> {
        debug_assert!(data.len() as vk::DeviceSize <= self.size);
        self.device.write_memory(self.memory, data)
    }

    /// Copy the whole of this buffer into `dst`, blocking until done
    pub fn copy_to(&self, dst: &DeviceBuffer) -> VulkanResult<()> {
        self.device.copy_buffer(self.buffer, dst.buffer, self.size)
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get size
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        log::trace!("Destroying buffer {:?}", self.buffer);
        self.device.destroy_buffer(self.buffer, self.memory);
    }
}
