use glam::{Mat4, Vec2, Vec3};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 100.0;

/// Orthographic pan/zoom camera.
///
/// At zoom 1 the viewport spans `[-aspect, aspect] x [-1, 1]` world units
/// around `position`. The view-projection matrix is recomputed on every
/// mutation, so readers never see a stale matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    position: Vec2,
    zoom: f32,
    aspect: f32,
    view_proj: Mat4,
}

impl Default for Camera2D {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            aspect: 1.0,
            view_proj: Mat4::IDENTITY,
        };
        camera.refresh();
        camera
    }
}

impl Camera2D {
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_proj
    }

    /// Move the view by `(dx, dy)` scaled by inverse zoom.
    ///
    /// The content moves with the delta, so a drag from the pointer tracker
    /// keeps the grabbed point under the pointer at every zoom level.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.position -= Vec2::new(dx, dy) / self.zoom;
        self.refresh();
    }

    /// Centre the view on `position`.
    pub fn look_at(&mut self, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        self.position = position;
        self.refresh();
    }

    /// Multiply zoom by `factor`, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    /// Non-finite factors are ignored.
    pub fn zoom_in(&mut self, factor: f32) {
        if !factor.is_finite() {
            return;
        }
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.refresh();
    }

    /// Re-derive the aspect ratio. A zero dimension leaves it unchanged.
    pub fn update_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.refresh();
    }

    /// Map normalized device coordinates to world space. Inverse of [`Self::world_to_ndc`].
    pub fn screen_to_world(&self, ndc: Vec2) -> Vec2 {
        self.position + Vec2::new(ndc.x * self.aspect, ndc.y) / self.zoom
    }

    /// Project a world position to normalized device coordinates.
    pub fn world_to_ndc(&self, world: Vec2) -> Vec2 {
        self.view_proj.project_point3(world.extend(0.0)).truncate()
    }

    fn refresh(&mut self) {
        let half_height = 1.0 / self.zoom;
        let half_width = self.aspect * half_height;
        let projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -1.0,
            1.0,
        );
        let view = Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0));
        self.view_proj = projection * view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn default_camera() {
        let cam = Camera2D::default();
        assert_eq!(cam.zoom(), 1.0);
        assert_eq!(cam.position(), Vec2::ZERO);
        assert!(!cam.view_projection().col(0).x.is_nan());
        assert!(close(cam.world_to_ndc(Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn zoom_is_always_clamped() {
        let mut cam = Camera2D::default();
        for factor in [10.0, 10.0, 10.0, 0.5, 1e9, 1e-9, 0.0, -3.0, f32::NAN, f32::INFINITY] {
            cam.zoom_in(factor);
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&cam.zoom()), "zoom {}", cam.zoom());
        }
    }

    #[test]
    fn pan_speed_scales_with_inverse_zoom() {
        let mut cam = Camera2D::default();
        cam.zoom_in(4.0);
        cam.pan(1.0, -2.0);
        assert!(close(cam.position(), Vec2::new(-0.25, 0.5)));
    }

    #[test]
    fn aspect_ignores_zero_dimensions() {
        let mut cam = Camera2D::default();
        cam.update_aspect(200, 100);
        assert_eq!(cam.aspect(), 2.0);
        cam.update_aspect(0, 100);
        assert_eq!(cam.aspect(), 2.0);
        cam.update_aspect(100, 0);
        assert_eq!(cam.aspect(), 2.0);
    }

    #[test]
    fn screen_to_world_inverts_projection() {
        let mut cam = Camera2D::default();
        cam.update_aspect(1600, 900);
        cam.zoom_in(3.7);
        cam.pan(0.3, -1.2);
        for ndc in [
            Vec2::ZERO,
            Vec2::new(1.0, 1.0),
            Vec2::new(-0.4, 0.9),
            Vec2::new(0.75, -1.0),
        ] {
            let world = cam.screen_to_world(ndc);
            assert!(close(cam.world_to_ndc(world), ndc), "ndc {ndc:?}");
        }
    }

    #[test]
    fn look_at_centres_view() {
        let mut cam = Camera2D::default();
        cam.look_at(Vec2::new(5.0, -3.0));
        assert!(close(cam.world_to_ndc(Vec2::new(5.0, -3.0)), Vec2::ZERO));
    }

    #[test]
    fn depth_of_plane_is_inside_clip_range() {
        let cam = Camera2D::default();
        let clip = cam.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((0.0..=1.0).contains(&clip.z));
    }
}
