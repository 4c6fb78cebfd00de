//! Shader module ownership

use ash::{vk, Device};
use std::ffi::CStr;

use crate::render::error::{VulkanError, VulkanResult};

const ENTRY_POINT: &[u8] = b"main\0";

/// Shader module wrapper with RAII cleanup
///
/// Modules only need to live until the pipeline using them is created.
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V words
    pub fn from_code(device: Device, code: &[u32]) -> VulkanResult<Self> {
        if code.is_empty() {
            return Err(VulkanError::Shader("SPIR-V code is empty".to_string()));
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(code);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(|e| VulkanError::Shader(format!("Failed to create shader module: {:?}", e)))?
        };

        Ok(Self { device, module })
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage info for this module with a `main` entry point
    ///
    /// The returned struct borrows a `'static` entry name and this module's
    /// handle; it must not outlive `self`.
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> VulkanResult<vk::PipelineShaderStageCreateInfo> {
        let entry = CStr::from_bytes_with_nul(ENTRY_POINT).map_err(|e| VulkanError::Shader(e.to_string()))?;

        Ok(vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(entry)
            .build())
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
