//! Viewer application loop

use std::rc::Rc;
use thiserror::Error;

use rust_renderer::assets::ObjError;
use rust_renderer::config::ConfigError;
use rust_renderer::core::ApplicationConfig;
use rust_renderer::foundation::math::{utils, Vec3};
use rust_renderer::foundation::time::Timer;
use rust_renderer::input::KeyboardMovementController;
use rust_renderer::render::vulkan::{VulkanDevice, VulkanSwapChain};
use rust_renderer::render::{
    Camera, GraphicsDevice, MeshBuilder, MeshLoadError, MeshResource, Renderer, SimpleRenderSystem, VulkanError,
    WindowSurface,
};
use rust_renderer::scene::{RenderableObject, Transform};

use crate::window::{GlfwWindow, WindowError};

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window creation failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Vulkan failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Model file could not be parsed
    #[error("Model error: {0}")]
    Model(#[from] ObjError),
}

impl From<MeshLoadError> for AppError {
    fn from(error: MeshLoadError) -> Self {
        match error {
            MeshLoadError::Parse(e) => Self::Model(e),
            MeshLoadError::Gpu(e) => Self::Vulkan(e),
        }
    }
}

/// Window, renderer and the objects shown in it
///
/// Field order is drop order: GPU objects go before the device, the device
/// before the window whose surface it presents to.
pub struct ViewerApp {
    config: ApplicationConfig,
    objects: Vec<RenderableObject>,
    render_system: SimpleRenderSystem,
    renderer: Renderer,
    device: Rc<VulkanDevice>,
    window: GlfwWindow,
}

impl ViewerApp {
    /// Open the window and bring up the renderer and scene
    pub fn new(config: ApplicationConfig) -> Result<Self, AppError> {
        config.validate()?;
        config.renderer.shaders.validate_files()?;

        let mut window = GlfwWindow::new(&config.window.title, config.window.width, config.window.height)?;
        let device = Rc::new(VulkanDevice::new(&mut window, &config.renderer)?);
        let graphics: Rc<dyn GraphicsDevice> = device.clone();

        let swap_chain = VulkanSwapChain::new(Rc::clone(&device), window.extent(), config.renderer.max_frames_in_flight)?;
        let renderer = Renderer::new(Rc::clone(&graphics), Box::new(swap_chain), &config.renderer)?;
        let render_system =
            SimpleRenderSystem::new(Rc::clone(&graphics), renderer.swap_chain_render_pass(), &config.renderer.shaders)?;

        let objects = Self::load_objects(&graphics, &config)?;
        log::info!("Scene loaded with {} object(s)", objects.len());

        Ok(Self {
            config,
            objects,
            render_system,
            renderer,
            device,
            window,
        })
    }

    fn load_objects(device: &Rc<dyn GraphicsDevice>, config: &ApplicationConfig) -> Result<Vec<RenderableObject>, AppError> {
        let builder = match &config.scene.model_path {
            Some(path) => {
                log::info!("Loading model {}", path);
                MeshBuilder::from_obj_file(path)?
            }
            None => MeshBuilder::cube(Vec3::zeros()),
        };
        let mesh = Rc::new(MeshResource::new(Rc::clone(device), &builder)?);

        let transform = Transform::default()
            .with_translation(Vec3::new(0.0, 0.0, 1.5))
            .with_uniform_scale(0.5)
            .with_rotation(Vec3::new(utils::deg_to_rad(20.0), utils::deg_to_rad(20.0), 0.0));

        Ok(vec![RenderableObject::new(mesh).with_transform(transform)])
    }

    /// Run until the window is closed
    pub fn run(&mut self) -> Result<(), AppError> {
        let camera_config = &self.config.camera;
        let controller = KeyboardMovementController::new(camera_config.move_speed, camera_config.look_speed);
        let fov = utils::deg_to_rad(camera_config.fov_degrees);
        let (near, far) = (camera_config.near, camera_config.far);

        let mut camera = Camera::new();
        camera.set_view_direction(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), Camera::DEFAULT_UP);
        let mut viewer = Transform::default();
        let mut timer = Timer::new();

        log::info!("Entering main loop");
        while !self.window.should_close() {
            self.window.poll_events();
            timer.update();

            controller.move_in_plane_xz(&self.window, timer.delta_time(), &mut viewer);
            camera.set_view_yxz(viewer.translation, viewer.rotation);
            camera.set_perspective_projection(fov, self.renderer.aspect_ratio(), near, far);

            if let Some(command_buffer) = self.renderer.begin_frame(&mut self.window)? {
                self.renderer.begin_swap_chain_render_pass(command_buffer);
                self.render_system.render_game_objects(command_buffer, &self.objects, &camera);
                self.renderer.end_swap_chain_render_pass(command_buffer);
                self.renderer.end_frame(&mut self.window)?;
            }
        }

        self.device.wait_idle()?;
        log::info!(
            "Main loop finished after {} frames ({:.1} fps average)",
            timer.frame_count(),
            timer.average_fps()
        );
        Ok(())
    }
}
