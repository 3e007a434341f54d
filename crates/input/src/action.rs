use glam::Vec2;

/// A high-level action produced from window input.
///
/// The engine and apps consume actions, never raw input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Drag the view by a delta in viewport-height units, y up.
    Pan(Vec2),
    /// Multiply the camera zoom by a factor.
    Zoom(f32),
    /// The pointer moved to a position in normalized device coordinates.
    PointerMoved(Vec2),
    /// Primary press at a position in normalized device coordinates.
    Click(Vec2),
    /// Ingest a demo batch of the given size.
    Spawn(usize),
    /// Drop the current selection.
    ClearSelection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_pan_is_constructible() {
        let a = Action::Pan(Vec2::new(1.0, 0.0));
        assert!(matches!(a, Action::Pan(_)));
    }

    #[test]
    fn action_click_carries_position() {
        let a = Action::Click(Vec2::new(0.5, -0.5));
        assert_eq!(a, Action::Click(Vec2::new(0.5, -0.5)));
    }

    #[test]
    fn action_spawn_and_clear() {
        assert!(matches!(Action::Spawn(10_000), Action::Spawn(10_000)));
        assert!(matches!(Action::ClearSelection, Action::ClearSelection));
    }
}
