//! GLFW window backing the renderer

use ash::vk;
use glfw::{Action, Key, WindowEvent};
use thiserror::Error;

use rust_renderer::input::{KeyInput, MoveKey};
use rust_renderer::render::{VulkanError, VulkanResult, WindowSurface};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// GLFW reports no Vulkan support on this system
    #[error("Vulkan is not supported by GLFW on this system")]
    VulkanUnsupported,
}

/// GLFW window with Vulkan client API and resize tracking
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    framebuffer_resized: bool,
}

impl GlfwWindow {
    /// Open a resizable window without an OpenGL context
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, WindowError> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|e| WindowError::InitializationFailed(e.to_string()))?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::VulkanUnsupported);
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
            framebuffer_resized: false,
        })
    }

    /// Process pending events without blocking
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.handle_events();
    }

    fn handle_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                WindowEvent::FramebufferSize(width, height) => {
                    log::debug!("Framebuffer resized to {}x{}", width, height);
                    self.framebuffer_resized = true;
                }
                WindowEvent::Key(Key::Escape, _, Action::Press, _) => {
                    self.window.set_should_close(true);
                }
                _ => {}
            }
        }
    }
}

impl WindowSurface for GlfwWindow {
    fn extent(&self) -> vk::Extent2D {
        let (width, height) = self.window.get_framebuffer_size();
        vk::Extent2D {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn was_resized(&self) -> bool {
        self.framebuffer_resized
    }

    fn reset_resized_flag(&mut self) {
        self.framebuffer_resized = false;
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.handle_events();
    }

    fn required_instance_extensions(&self) -> VulkanResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| VulkanError::InitializationFailed("GLFW reports no Vulkan instance extensions".to_string()))
    }

    fn create_surface(&mut self, instance: vk::Instance) -> VulkanResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(VulkanError::Surface(format!("Failed to create window surface: {:?}", result)))
        }
    }
}

impl KeyInput for GlfwWindow {
    fn is_pressed(&self, key: MoveKey) -> bool {
        let key = match key {
            MoveKey::MoveLeft => Key::A,
            MoveKey::MoveRight => Key::D,
            MoveKey::MoveForward => Key::W,
            MoveKey::MoveBackward => Key::S,
            MoveKey::MoveUp => Key::E,
            MoveKey::MoveDown => Key::Q,
            MoveKey::LookLeft => Key::Left,
            MoveKey::LookRight => Key::Right,
            MoveKey::LookUp => Key::Up,
            MoveKey::LookDown => Key::Down,
        };
        self.window.get_key(key) == Action::Press
    }
}
