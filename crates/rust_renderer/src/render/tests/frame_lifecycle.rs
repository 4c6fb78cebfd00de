use approx::assert_relative_eq;
use ash::vk;
use std::rc::Rc;

use super::{push_constant_payloads, Scene};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::mesh_resource::MeshResource;
use crate::render::primitives::camera::Camera;
use crate::render::primitives::mesh::MeshBuilder;
use crate::render::systems::simple_render_system::SimplePushConstantData;
use crate::render::testing::Call;
use crate::scene::renderable_object::RenderableObject;
use crate::scene::transform::Transform;

/// One application tick: camera aspect from the renderer, then draw everything
fn tick(scene: &mut Scene, objects: &[RenderableObject], camera: &mut Camera) -> Option<vk::CommandBuffer> {
    camera.set_perspective_projection(50f32.to_radians(), scene.renderer.aspect_ratio(), 0.1, 10.0);

    let cmd = scene.renderer.begin_frame(&mut scene.window).unwrap()?;
    scene.renderer.begin_swap_chain_render_pass(cmd);
    scene.system.render_game_objects(cmd, objects, camera);
    scene.renderer.end_swap_chain_render_pass(cmd);
    scene.renderer.end_frame(&mut scene.window).unwrap();
    Some(cmd)
}

#[test]
fn test_resize_mid_run() {
    let mut scene = Scene::new(800, 600);
    let cube = Rc::new(MeshResource::new(scene.device.clone(), &MeshBuilder::cube(Vec3::zeros())).unwrap());
    let objects = vec![RenderableObject::new(cube)
        .with_transform(Transform::default().with_translation(Vec3::new(0.0, 0.0, 2.5)))];
    let mut camera = Camera::new();
    camera.set_view_direction(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), Camera::DEFAULT_UP);

    tick(&mut scene, &objects, &mut camera).unwrap();
    scene.device.clear_calls();

    // The user resizes while frame 1 is being recorded
    let cmd = scene.renderer.begin_frame(&mut scene.window).unwrap().unwrap();
    scene.renderer.begin_swap_chain_render_pass(cmd);
    scene.system.render_game_objects(cmd, &objects, &camera);
    scene.window.resize(1000, 500);
    scene.renderer.end_swap_chain_render_pass(cmd);
    scene.renderer.end_frame(&mut scene.window).unwrap();

    let calls = scene.device.calls();
    let submit = calls
        .iter()
        .position(|c| matches!(c, Call::SubmitCommandBuffers { .. }))
        .unwrap();
    let recreate = calls
        .iter()
        .position(|c| matches!(c, Call::RecreateSwapChain { .. }))
        .unwrap();

    // Recording finished and was submitted before the chain was touched,
    // and the device drained before recreation
    assert!(submit < recreate);
    assert_eq!(calls[recreate - 1], Call::WaitIdle);
    assert!(!calls[recreate..].iter().any(|c| matches!(
        c,
        Call::PushConstants { .. } | Call::DrawIndexed { .. } | Call::EndCommandBuffer(_)
    )));
    assert!(!scene.window.resized);

    // Same tick: the renderer already reports the new aspect ratio
    assert_relative_eq!(scene.renderer.aspect_ratio(), 2.0);

    // Next tick draws with a projection built for the new extent
    scene.device.clear_calls();
    tick(&mut scene, &objects, &mut camera).unwrap();

    let calls = scene.device.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::BeginRenderPass { extent: vk::Extent2D { width: 1000, height: 500 }, .. }
    )));
    let payload = push_constant_payloads(&calls).pop().unwrap();
    let push: SimplePushConstantData = bytemuck::pod_read_unaligned(&payload);

    let mut expected_camera = camera.clone();
    expected_camera.set_perspective_projection(50f32.to_radians(), 2.0, 0.1, 10.0);
    let expected = expected_camera.projection_view() * objects[0].transform.mat4();
    assert_relative_eq!(Mat4::from(push.transform), expected, epsilon = 1e-5);
}

#[test]
fn test_skipped_tick_records_nothing() {
    use crate::core::config::RendererConfig;
    use crate::render::renderer::Renderer;
    use crate::render::swap_chain::ImageAcquisition;
    use crate::render::testing::{CallLog, FakeWindow, RecordingDevice, ScriptedSwapChain};

    let log = CallLog::default();
    let device = RecordingDevice::with_log(Rc::clone(&log));
    let mut swap_chain = ScriptedSwapChain::new(log, vk::Extent2D { width: 640, height: 480 });
    swap_chain.script_acquire(Ok(ImageAcquisition::NeedsRecreation));
    let mut renderer = Renderer::new(device.clone(), Box::new(swap_chain), &RendererConfig::default()).unwrap();
    let mut window = FakeWindow::new(640, 480);

    let mut ticks_drawn = 0;
    for _ in 0..3 {
        if let Some(cmd) = renderer.begin_frame(&mut window).unwrap() {
            renderer.begin_swap_chain_render_pass(cmd);
            renderer.end_swap_chain_render_pass(cmd);
            renderer.end_frame(&mut window).unwrap();
            ticks_drawn += 1;
        }
    }

    assert_eq!(ticks_drawn, 2);
    let submits: Vec<usize> = device
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::SubmitCommandBuffers { frame, .. } => Some(*frame),
            _ => None,
        })
        .collect();
    assert_eq!(submits, vec![0, 1]);
}
