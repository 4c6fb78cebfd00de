//! Per-object draw submission
//!
//! One pipeline, one push-constant payload per object, one bind and draw per
//! object in the order given. No sorting, batching or culling.

use ash::vk;
use std::mem;
use std::rc::Rc;

use crate::core::config::ShaderConfig;
use crate::foundation::math::utils::to_cols_array_2d;
use crate::render::device::GraphicsDevice;
use crate::render::error::VulkanResult;
use crate::render::pipeline::{read_spirv, GraphicsPipeline, PipelineConfig, PipelineLayout};
use crate::render::primitives::camera::Camera;
use crate::scene::renderable_object::RenderableObject;

/// Push constant payload read by both shader stages
///
/// Matches the std430 push constant block `{ mat4 transform; vec3 color; }`:
/// the color starts at byte 64 and the struct is padded to 80 bytes.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplePushConstantData {
    /// `projection * view * model`, column-major
    pub transform: [[f32; 4]; 4],
    /// Object color
    pub color: [f32; 3],
    _padding: f32,
}

// Safe: only f32 fields, explicit tail padding, no implicit padding bytes
unsafe impl bytemuck::Pod for SimplePushConstantData {}
unsafe impl bytemuck::Zeroable for SimplePushConstantData {}

impl SimplePushConstantData {
    /// Payload for one object
    pub fn new(transform: [[f32; 4]; 4], color: [f32; 3]) -> Self {
        Self {
            transform,
            color,
            _padding: 0.0,
        }
    }
}

/// Stages that read the push constants
pub const PUSH_CONSTANT_STAGES: vk::ShaderStageFlags =
    vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());

/// Draws renderable objects with flat per-object color
pub struct SimpleRenderSystem {
    device: Rc<dyn GraphicsDevice>,
    // Declared before the layout so it is destroyed first
    pipeline: GraphicsPipeline,
    pipeline_layout: PipelineLayout,
}

impl SimpleRenderSystem {
    /// Create the pipeline layout and pipeline, loading shaders from disk
    pub fn new(
        device: Rc<dyn GraphicsDevice>,
        render_pass: vk::RenderPass,
        shaders: &ShaderConfig,
    ) -> VulkanResult<Self> {
        let vertex_code = read_spirv(&shaders.vertex_shader_path)?;
        let fragment_code = read_spirv(&shaders.fragment_shader_path)?;
        Self::from_spirv(device, render_pass, &vertex_code, &fragment_code)
    }

    /// Create the pipeline layout and pipeline from SPIR-V already in memory
    pub fn from_spirv(
        device: Rc<dyn GraphicsDevice>,
        render_pass: vk::RenderPass,
        vertex_code: &[u32],
        fragment_code: &[u32],
    ) -> VulkanResult<Self> {
        let push_constant_range = vk::PushConstantRange {
            stage_flags: PUSH_CONSTANT_STAGES,
            offset: 0,
            size: mem::size_of::<SimplePushConstantData>() as u32,
        };
        let pipeline_layout = PipelineLayout::new(Rc::clone(&device), &[push_constant_range])?;

        let config = PipelineConfig::default_for(render_pass, pipeline_layout.handle());
        let pipeline = GraphicsPipeline::from_spirv(Rc::clone(&device), &config, vertex_code, fragment_code)?;

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Record draws for `objects` in order
    pub fn render_game_objects(&self, command_buffer: vk::CommandBuffer, objects: &[RenderableObject], camera: &Camera) {
        self.pipeline.bind(command_buffer);

        let projection_view = camera.projection_view();
        for object in objects {
            let push = SimplePushConstantData::new(
                to_cols_array_2d(&(projection_view * object.transform.mat4())),
                object.color.into(),
            );
            self.device.cmd_push_constants(
                command_buffer,
                self.pipeline_layout.handle(),
                PUSH_CONSTANT_STAGES,
                0,
                bytemuck::bytes_of(&push),
            );
            object.mesh.bind(command_buffer);
            object.mesh.draw(command_buffer);
        }
    }
}
