use crate::camera::Camera2D;
use glam::Vec2;
use swarm_common::FrameUniforms;

/// Host inputs to one frame's uniform block.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub viewport: (u32, u32),
    pub pointer_ndc: Vec2,
    pub delta_time: f32,
    pub pick_radius_ndc: f32,
    pub click: bool,
}

/// Build the uniform block for one frame.
///
/// The pointer is converted to world space with the camera as it is now, so a
/// pan after the last pointer move still picks under the cursor. The pick radius
/// is divided by zoom to stay constant on screen.
pub fn frame_uniforms(camera: &Camera2D, inputs: &FrameInputs) -> FrameUniforms {
    let pointer = camera.screen_to_world(inputs.pointer_ndc);
    let (width, height) = inputs.viewport;
    FrameUniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        delta_time: inputs.delta_time,
        viewport_width: width.max(1) as f32,
        viewport_height: height.max(1) as f32,
        _pad: 0.0,
        pointer_world: pointer.to_array(),
        pick_radius: inputs.pick_radius_ndc / camera.zoom(),
        click: if inputs.click { 1.0 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> FrameInputs {
        FrameInputs {
            viewport: (800, 400),
            pointer_ndc: Vec2::new(0.5, -0.5),
            delta_time: 0.016,
            pick_radius_ndc: 0.05,
            click: true,
        }
    }

    #[test]
    fn uniforms_follow_camera() {
        let mut camera = Camera2D::default();
        camera.update_aspect(800, 400);
        camera.zoom_in(2.0);
        let u = frame_uniforms(&camera, &inputs());
        assert_eq!(u.view_proj(), camera.view_projection());
        assert_eq!(u.viewport_width, 800.0);
        assert_eq!(u.viewport_height, 400.0);
        assert!(u.clicked());
        assert!((u.pick_radius - 0.025).abs() < 1e-6);
        // aspect 2, zoom 2: ndc (0.5, -0.5) -> world (0.5, -0.25)
        assert!((u.pointer() - Vec2::new(0.5, -0.25)).length() < 1e-5);
    }

    #[test]
    fn no_click_clears_flag() {
        let camera = Camera2D::default();
        let u = frame_uniforms(
            &camera,
            &FrameInputs {
                click: false,
                ..inputs()
            },
        );
        assert!(!u.clicked());
        assert_eq!(u.click, 0.0);
    }

    #[test]
    fn degenerate_viewport_never_divides_by_zero() {
        let camera = Camera2D::default();
        let u = frame_uniforms(
            &camera,
            &FrameInputs {
                viewport: (0, 0),
                ..inputs()
            },
        );
        assert_eq!(u.viewport_width, 1.0);
        assert_eq!(u.viewport_height, 1.0);
    }
}
