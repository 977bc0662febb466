/// The per-frame sequence: input, camera, simulation, draw, present
use log::debug;

use crate::backend::{GraphicsDevice, UniformValue, Window, WindowEvent};
use crate::body::SceneBody;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::projection::{CameraInput, CameraSpeeds, CameraState, Projection};
use crate::render::{BoundPass, SceneResources};
use crate::shaders::{MODEL_UNIFORM, PROJECTION_UNIFORM, TEXTURE_UNIFORM, VIEW_UNIFORM};
use crate::transform::Mat4;

/// Everything the loop mutates, passed by reference through each phase
#[derive(Debug, Clone)]
pub struct FrameState {
    pub camera: CameraState,
    pub projection: Mat4,
    pub bodies: Vec<SceneBody>,
}

/// Fixed parameters of the loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    pub projection: Projection,
    pub speeds: CameraSpeeds,
    pub clear_color: [f32; 3],
}

impl FrameSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            projection: config.projection(),
            speeds: config.camera_speeds(),
            clear_color: config.display.clear_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    /// The window was closed; this frame was still rendered
    Exit,
}

/// Run one frame. The order of the steps matters: input must reach this
/// frame's view matrix, and the shared uniforms are set once before any body
/// is drawn.
pub fn run_frame<W, D>(
    window: &mut W,
    device: &mut D,
    resources: &SceneResources<D>,
    settings: &FrameSettings,
    state: &mut FrameState,
) -> Result<FrameOutcome, ViewerError>
where
    W: Window<Surface = D::Surface>,
    D: GraphicsDevice,
{
    let dt = window.elapsed_seconds();

    let mut outcome = FrameOutcome::Continue;
    while let Some(event) = window.poll_event()? {
        match event {
            WindowEvent::Closed => outcome = FrameOutcome::Exit,
            WindowEvent::Resized { width, height } => {
                debug!("Viewport resized to {}x{}", width, height);
                device.set_viewport(width, height);
                state.projection = settings.projection.matrix(width, height);
            }
        }
    }

    let input = CameraInput::from_keys(|key| window.is_key_down(key));
    state.camera.update(&input, dt, &settings.speeds);
    let view = state.camera.view_matrix();

    for body in &mut state.bodies {
        body.advance(dt);
    }

    device.clear(settings.clear_color);
    {
        let mut pass = BoundPass::begin(device, resources);
        pass.set_uniform(TEXTURE_UNIFORM, UniformValue::Int(0));
        pass.set_uniform(VIEW_UNIFORM, UniformValue::Mat4(view));
        pass.set_uniform(PROJECTION_UNIFORM, UniformValue::Mat4(state.projection));

        for body in &state.bodies {
            pass.set_uniform(MODEL_UNIFORM, UniformValue::Mat4(body.model_matrix()));
            pass.draw_mesh();
        }
    }

    window.present(device.surface())?;
    Ok(outcome)
}

/// Run frames until the window closes. Returns the number of frames drawn.
pub fn run_frame_loop<W, D>(
    window: &mut W,
    device: &mut D,
    resources: &SceneResources<D>,
    settings: &FrameSettings,
    state: &mut FrameState,
) -> Result<u64, ViewerError>
where
    W: Window<Surface = D::Surface>,
    D: GraphicsDevice,
{
    let mut frames = 0;
    loop {
        let outcome = run_frame(window, device, resources, settings, state)?;
        frames += 1;
        if outcome == FrameOutcome::Exit {
            return Ok(frames);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Key;
    use crate::testing::{test_resources, DeviceCall, RecordingDevice, ScriptedWindow};
    use crate::vector::Vec3;

    fn state() -> FrameState {
        FrameState {
            camera: CameraState::default(),
            projection: Projection::default().matrix(4, 3),
            bodies: vec![
                SceneBody::new(0.0, 0.0, 0.2, 4.0),
                SceneBody::new(4.0, 0.25, 1.0, 1.0),
                SceneBody::new(5.0, 0.2, 0.5, 0.5),
            ],
        }
    }

    fn settings() -> FrameSettings {
        FrameSettings::from_config(&ViewerConfig::default())
    }

    fn model_uniforms(calls: &[DeviceCall]) -> Vec<Mat4> {
        calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Uniform(name, UniformValue::Mat4(m)) if name == MODEL_UNIFORM => Some(*m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_call_order() {
        let mut device = RecordingDevice::default();
        let resources = test_resources(&mut device, 36);
        let mut window = ScriptedWindow::new(vec![vec![]], 0.5);
        let mut state = state();

        let outcome = run_frame(&mut window, &mut device, &resources, &settings(), &mut state).unwrap();
        assert_eq!(outcome, FrameOutcome::Continue);

        let calls = device.take_calls();
        let names: Vec<String> = calls.iter().map(DeviceCall::label).collect();
        assert_eq!(
            names,
            vec![
                "clear", "bind", "uniform uTexture", "uniform uView", "uniform uProj",
                "uniform uModel", "draw 36", "uniform uModel", "draw 36", "uniform uModel", "draw 36",
                "unbind",
            ]
        );
        assert_eq!(window.presented, 1);
    }

    #[test]
    fn test_bodies_advance_before_drawing() {
        let mut device = RecordingDevice::default();
        let resources = test_resources(&mut device, 3);
        let mut window = ScriptedWindow::new(vec![vec![]], 2.0);
        let mut state = state();

        run_frame(&mut window, &mut device, &resources, &settings(), &mut state).unwrap();

        let models = model_uniforms(&device.take_calls());
        assert_eq!(models.len(), 3);
        assert!((state.bodies[1].orbit_angle - 0.5).abs() < 1e-6);
        for (body, model) in state.bodies.iter().zip(&models) {
            assert_eq!(body.model_matrix(), *model);
        }
    }

    #[test]
    fn test_resize_updates_viewport_and_projection() {
        let mut device = RecordingDevice::default();
        let resources = test_resources(&mut device, 3);
        let mut window = ScriptedWindow::new(
            vec![vec![WindowEvent::Resized { width: 200, height: 100 }]],
            0.0,
        );
        let mut state = state();

        run_frame(&mut window, &mut device, &resources, &settings(), &mut state).unwrap();

        let expected = settings().projection.matrix(200, 100);
        assert_eq!(state.projection, expected);
        let calls = device.take_calls();
        assert_eq!(calls[0], DeviceCall::Viewport(200, 100));
        assert!(calls.contains(&DeviceCall::Uniform(PROJECTION_UNIFORM.to_string(), UniformValue::Mat4(expected))));
    }

    #[test]
    fn test_close_finishes_current_frame() {
        let mut device = RecordingDevice::default();
        let resources = test_resources(&mut device, 3);
        let mut window = ScriptedWindow::new(vec![vec![], vec![], vec![WindowEvent::Closed], vec![]], 0.016);
        let mut state = state();

        let frames = run_frame_loop(&mut window, &mut device, &resources, &settings(), &mut state).unwrap();
        assert_eq!(frames, 3);
        assert_eq!(window.presented, 3);
        let draws = device.take_calls().iter().filter(|c| matches!(c, DeviceCall::Draw(_))).count();
        assert_eq!(draws, 9);
    }

    #[test]
    fn test_input_reaches_same_frame_view() {
        let mut device = RecordingDevice::default();
        let resources = test_resources(&mut device, 3);
        let mut window = ScriptedWindow::new(vec![vec![]], 1.0);
        window.held.insert(Key::Right);
        let mut state = state();
        state.camera = CameraState::new(Vec3::ZERO, -90.0, 0.0);

        run_frame(&mut window, &mut device, &resources, &settings(), &mut state).unwrap();

        let expected_view = CameraState::new(Vec3::ZERO, -40.0, 0.0).view_matrix();
        let calls = device.take_calls();
        let view = calls
            .iter()
            .find_map(|call| match call {
                DeviceCall::Uniform(name, UniformValue::Mat4(m)) if name == VIEW_UNIFORM => Some(*m),
                _ => None,
            })
            .unwrap();
        for (a, b) in view.as_array().iter().zip(expected_view.as_array()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
