use crate::action::Action;
use glam::Vec2;

/// Pointer buttons the tracker distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Turns device-pixel pointer events into [`Action`]s.
///
/// Any button drags the view; only the primary button registers a pick click.
/// Drag deltas are scaled by `2 / viewport_height` so that, combined with
/// the camera's inverse-zoom pan, content stays under the pointer.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    viewport: Vec2,
    position: Vec2,
    dragging: bool,
    last_drag: Vec2,
    /// Zoom change per wheel unit.
    pub wheel_sensitivity: f32,
}

impl PointerTracker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            position: Vec2::ZERO,
            dragging: false,
            last_drag: Vec2::ZERO,
            wheel_sensitivity: 0.001,
        }
    }

    /// Track a new viewport size. Zero dimensions are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Vec2::new(width as f32, height as f32);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Map a device-pixel position to normalized device coordinates, y up.
    pub fn to_ndc(&self, px: Vec2) -> Vec2 {
        Vec2::new(
            px.x / self.viewport.x * 2.0 - 1.0,
            -(px.y / self.viewport.y * 2.0 - 1.0),
        )
    }

    /// Pointer moved to `px`. Yields a pan while dragging, then the new NDC position.
    pub fn moved(&mut self, px: Vec2) -> Vec<Action> {
        self.position = px;
        let mut actions = Vec::with_capacity(2);
        if self.dragging {
            let delta = (px - self.last_drag) / self.viewport.y * 2.0;
            self.last_drag = px;
            actions.push(Action::Pan(Vec2::new(delta.x, -delta.y)));
        }
        actions.push(Action::PointerMoved(self.to_ndc(px)));
        actions
    }

    /// Button press or release at the last known pointer position.
    pub fn button(&mut self, button: PointerButton, pressed: bool) -> Option<Action> {
        if !pressed {
            self.dragging = false;
            return None;
        }
        self.dragging = true;
        self.last_drag = self.position;
        (button == PointerButton::Primary).then(|| Action::Click(self.to_ndc(self.position)))
    }

    /// Wheel scrolled by `delta_y` pixels, positive when scrolling down.
    /// Scrolling down zooms out.
    pub fn wheel(&self, delta_y: f32) -> Action {
        Action::Zoom((1.0 - delta_y * self.wheel_sensitivity).max(0.1))
    }
}
