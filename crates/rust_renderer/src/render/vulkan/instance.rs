//! Vulkan instance, validation messenger and presentation surface

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Surface;
use ash::{vk, Entry, Instance};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use crate::render::error::{VulkanError, VulkanResult};
use crate::render::window::WindowSurface;

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
const ENGINE_NAME: &str = "RustRenderer";

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an instance with the extensions `window` needs to present
    ///
    /// When `enable_validation` is set and the Khronos validation layer is
    /// installed, the layer is enabled and its messages are forwarded to `log`.
    pub fn new(window: &dyn WindowSurface, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {}", e)))?;

        let enable_validation = enable_validation && Self::validation_layer_available(&entry)?;

        let app_name_cstr = to_cstring(app_name)?;
        let engine_name_cstr = to_cstring(ENGINE_NAME)?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let mut extension_names = window
            .required_instance_extensions()?
            .iter()
            .map(|name| to_cstring(name))
            .collect::<VulkanResult<Vec<_>>>()?;
        if enable_validation {
            extension_names.push(DebugUtils::name().to_owned());
        }
        let extensions: Vec<*const c_char> = extension_names.iter().map(|ext| ext.as_ptr()).collect();

        let layer_names = if enable_validation {
            vec![to_cstring(VALIDATION_LAYER)?]
        } else {
            Vec::new()
        };
        let layers: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        // Chained so instance creation and destruction are covered too
        let mut messenger_info = debug_messenger_info();
        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);
        if enable_validation {
            create_info = create_info.push_next(&mut messenger_info);
        }

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(|e| VulkanError::creation("instance", e))?
        };

        let mut vulkan_instance = Self {
            entry,
            instance,
            debug: None,
        };

        if enable_validation {
            let debug_utils = DebugUtils::new(&vulkan_instance.entry, &vulkan_instance.instance);
            let messenger = unsafe {
                debug_utils
                    .create_debug_utils_messenger(&debug_messenger_info(), None)
                    .map_err(|e| VulkanError::creation("debug messenger", e))?
            };
            vulkan_instance.debug = Some((debug_utils, messenger));
            log::info!("Vulkan validation enabled");
        }

        Ok(vulkan_instance)
    }

    fn validation_layer_available(entry: &Entry) -> VulkanResult<bool> {
        let layers = entry
            .enumerate_instance_layer_properties()
            .map_err(VulkanError::from_result)?;

        let available = layers.iter().any(|layer| {
            let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            name.to_str().map_or(false, |name| name == VALIDATION_LAYER)
        });
        if !available {
            log::warn!("{} not installed, continuing without validation", VALIDATION_LAYER);
        }
        Ok(available)
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Presentation surface with RAII cleanup
pub struct VulkanSurface {
    /// Surface extension loader
    pub loader: Surface,
    /// Surface handle
    pub surface: vk::SurfaceKHR,
}

impl VulkanSurface {
    /// Create a surface for `window`
    pub fn new(instance: &VulkanInstance, window: &mut dyn WindowSurface) -> VulkanResult<Self> {
        let loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window.create_surface(instance.instance.handle())?;
        Ok(Self { loader, surface })
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

fn to_cstring(value: &str) -> VulkanResult<CString> {
    CString::new(value).map_err(|e| VulkanError::InitializationFailed(format!("invalid name {:?}: {}", value, e)))
}

fn debug_messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .build()
}

/// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::trace!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}
