//! Graphics pipeline configuration and ownership
//!
//! [`PipelineConfig`] is plain data describing the fixed-function state of a
//! pipeline. The device turns it into Vulkan create-info structures, so the
//! configuration itself carries no raw pointers and can be inspected in tests.

use ash::vk;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;

use crate::render::device::GraphicsDevice;
use crate::render::error::{VulkanError, VulkanResult};
use crate::render::primitives::mesh::Vertex;

/// Fixed-function state and layout of a graphics pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Vertex buffer bindings
    pub binding_descriptions: Vec<vk::VertexInputBindingDescription>,
    /// Vertex attributes
    pub attribute_descriptions: Vec<vk::VertexInputAttributeDescription>,
    /// Primitive topology
    pub topology: vk::PrimitiveTopology,
    /// Fill, line or point rasterization
    pub polygon_mode: vk::PolygonMode,
    /// Faces to cull
    pub cull_mode: vk::CullModeFlags,
    /// Winding of front faces
    pub front_face: vk::FrontFace,
    /// Depth testing on/off
    pub depth_test_enable: bool,
    /// Depth writes on/off
    pub depth_write_enable: bool,
    /// Depth comparison
    pub depth_compare_op: vk::CompareOp,
    /// State set at record time instead of baked into the pipeline
    pub dynamic_states: Vec<vk::DynamicState>,
    /// Render pass the pipeline is used with
    pub render_pass: vk::RenderPass,
    /// Subpass index within the render pass
    pub subpass: u32,
    /// Pipeline layout
    pub pipeline_layout: vk::PipelineLayout,
}

impl PipelineConfig {
    /// Opaque triangle-list pipeline for [`Vertex`] data
    ///
    /// Fill mode, no culling, clockwise front faces, depth test `LESS` with
    /// writes, and dynamic viewport and scissor so the pipeline survives swap
    /// chain recreation.
    pub fn default_for(render_pass: vk::RenderPass, pipeline_layout: vk::PipelineLayout) -> Self {
        Self {
            binding_descriptions: Vertex::binding_descriptions(),
            attribute_descriptions: Vertex::attribute_descriptions(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: vk::CompareOp::LESS,
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            render_pass,
            subpass: 0,
            pipeline_layout,
        }
    }
}

/// Read a SPIR-V binary from disk
pub fn read_spirv(path: impl AsRef<Path>) -> VulkanResult<Vec<u32>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .map_err(|e| VulkanError::Shader(format!("Failed to open shader file {}: {}", path.display(), e)))?;
    ash::util::read_spv(&mut file)
        .map_err(|e| VulkanError::Shader(format!("Failed to read SPIR-V from {}: {}", path.display(), e)))
}

/// Pipeline layout wrapper with RAII cleanup
pub struct PipelineLayout {
    device: Rc<dyn GraphicsDevice>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Create a layout with push constants only
    pub fn new(device: Rc<dyn GraphicsDevice>, push_constant_ranges: &[vk::PushConstantRange]) -> VulkanResult<Self> {
        let layout = device.create_pipeline_layout(push_constant_ranges)?;
        Ok(Self { device, layout })
    }

    /// Get layout handle
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        self.device.destroy_pipeline_layout(self.layout);
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct GraphicsPipeline {
    device: Rc<dyn GraphicsDevice>,
    pipeline: vk::Pipeline,
}

impl GraphicsPipeline {
    /// Create a pipeline from SPIR-V files
    pub fn new(
        device: Rc<dyn GraphicsDevice>,
        config: &PipelineConfig,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> VulkanResult<Self> {
        let vertex_code = read_spirv(vertex_path)?;
        let fragment_code = read_spirv(fragment_path)?;
        Self::from_spirv(device, config, &vertex_code, &fragment_code)
    }

    /// Create a pipeline from SPIR-V words already in memory
    pub fn from_spirv(
        device: Rc<dyn GraphicsDevice>,
        config: &PipelineConfig,
        vertex_code: &[u32],
        fragment_code: &[u32],
    ) -> VulkanResult<Self> {
        assert!(
            config.pipeline_layout != vk::PipelineLayout::null(),
            "cannot create graphics pipeline: no pipeline layout in config"
        );
        assert!(
            config.render_pass != vk::RenderPass::null(),
            "cannot create graphics pipeline: no render pass in config"
        );

        let pipeline = device.create_graphics_pipeline(config, vertex_code, fragment_code)?;
        log::debug!(
            "Created graphics pipeline ({} vertex words, {} fragment words)",
            vertex_code.len(),
            fragment_code.len()
        );
        Ok(Self { device, pipeline })
    }

    /// Bind for drawing
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        self.device.cmd_bind_pipeline(command_buffer, self.pipeline);
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        self.device.destroy_pipeline(self.pipeline);
    }
}
