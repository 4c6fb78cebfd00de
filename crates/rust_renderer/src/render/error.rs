//! Renderer error types

use ash::vk;
use thiserror::Error;

/// Vulkan-specific error types
///
/// Swap chain staleness (`ERROR_OUT_OF_DATE_KHR`, `SUBOPTIMAL_KHR`) never shows
/// up here; the frame controller recovers from it by recreating the chain.
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// A buffer, memory allocation or other GPU object could not be created
    #[error("Failed to create {resource}: {reason}")]
    ResourceCreation {
        /// What was being created
        resource: &'static str,
        /// Why it failed
        reason: String,
    },

    /// The logical device was lost
    #[error("Device lost")]
    DeviceLost,

    /// Surface lost, or the swap chain could not be rebuilt for it
    #[error("Surface error: {0}")]
    Surface(String),

    /// No suitable memory type found for allocation
    ///
    /// Buffer creation reports this as `ResourceCreation` instead.
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Shader module could not be loaded or created
    #[error("Shader error: {0}")]
    Shader(String),
}

impl VulkanError {
    /// Classify a raw result code, singling out device and surface loss
    pub fn from_result(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_DEVICE_LOST => Self::DeviceLost,
            vk::Result::ERROR_SURFACE_LOST_KHR => Self::Surface("surface lost".to_string()),
            other => Self::Api(other),
        }
    }

    /// Wrap a failed creation call
    pub fn creation(resource: &'static str, result: vk::Result) -> Self {
        Self::from_result(result).during_creation(resource)
    }

    /// Report an error raised while creating `resource` as a creation failure
    ///
    /// Device and surface loss pass through unchanged.
    pub fn during_creation(self, resource: &'static str) -> Self {
        match self {
            Self::Api(code) => Self::ResourceCreation {
                resource,
                reason: format!("{:?}", code),
            },
            Self::NoSuitableMemoryType => Self::ResourceCreation {
                resource,
                reason: "no suitable memory type".to_string(),
            },
            other => other,
        }
    }
}

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        Self::from_result(result)
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
