//! Whole-frame scenarios across renderer, render system and meshes

mod frame_lifecycle;

use ash::vk;
use std::rc::Rc;

use crate::core::config::RendererConfig;
use crate::render::renderer::Renderer;
use crate::render::systems::SimpleRenderSystem;
use crate::render::testing::{Call, CallLog, FakeWindow, RecordingDevice, ScriptedSwapChain};

/// Placeholder SPIR-V: the recording device never looks at the code
const SPIRV_MAGIC: [u32; 1] = [0x0723_0203];

struct Scene {
    device: Rc<RecordingDevice>,
    renderer: Renderer,
    system: SimpleRenderSystem,
    window: FakeWindow,
}

impl Scene {
    fn new(width: u32, height: u32) -> Self {
        let log = CallLog::default();
        let device = RecordingDevice::with_log(Rc::clone(&log));
        let swap_chain = ScriptedSwapChain::new(log, vk::Extent2D { width, height });
        let renderer = Renderer::new(device.clone(), Box::new(swap_chain), &RendererConfig::default()).unwrap();
        let system = SimpleRenderSystem::from_spirv(
            device.clone(),
            renderer.swap_chain_render_pass(),
            &SPIRV_MAGIC,
            &SPIRV_MAGIC,
        )
        .unwrap();

        Self {
            device,
            renderer,
            system,
            window: FakeWindow::new(width, height),
        }
    }
}

fn push_constant_payloads(calls: &[Call]) -> Vec<Vec<u8>> {
    calls
        .iter()
        .filter_map(|call| match call {
            Call::PushConstants { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect()
}
