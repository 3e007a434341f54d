//! CPU reference of the simulation step.
//!
//! Mirrors `simulate` in the compute shader so the frame invariants can be
//! checked without a device, and so GPU results have something to be compared
//! against. Entities are visited in slot order; the shader gives no ordering,
//! so only the visible *set* and the pick winner are comparable.

use glam::{Mat4, Vec2, Vec4};
use swarm_common::{
    EntityBatch, EntityId, FrameUniforms, PICK_SENTINEL, SPRITE_HALF_PX, STATUS_INACTIVE,
};

/// Result of one reference step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    /// Visible slot indices in the order they were appended.
    pub visible: Vec<u32>,
    /// Picking word after the step.
    pub pick: u32,
}

impl StepOutput {
    pub fn instance_count(&self) -> u32 {
        self.visible.len() as u32
    }

    pub fn selection(&self) -> Option<EntityId> {
        EntityId::from_pick(self.pick)
    }
}

/// Half extent of a sprite quad in NDC for a viewport in device pixels.
pub fn sprite_half_extent_ndc(viewport_width: f32, viewport_height: f32) -> Vec2 {
    Vec2::new(
        2.0 * SPRITE_HALF_PX / viewport_width.max(1.0),
        2.0 * SPRITE_HALF_PX / viewport_height.max(1.0),
    )
}

/// Whether any part of a sprite centred on `position` lands inside the viewport.
pub fn is_visible(view_proj: &Mat4, position: Vec2, half_extent: Vec2) -> bool {
    let clip = *view_proj * Vec4::new(position.x, position.y, 0.0, 1.0);
    let ndc = clip.truncate().truncate() / clip.w;
    ndc.x.abs() <= 1.0 + half_extent.x && ndc.y.abs() <= 1.0 + half_extent.y
}

/// Advance `entities` by one frame and select/pick exactly as the shader does.
///
/// `pick` is the picking word before the step. The host resets it to the
/// sentinel on click frames; on other frames it carries over untouched.
pub fn step(entities: &mut EntityBatch, uniforms: &FrameUniforms, pick: u32) -> StepOutput {
    let view_proj = uniforms.view_proj();
    let half = sprite_half_extent_ndc(uniforms.viewport_width, uniforms.viewport_height);
    let pointer = uniforms.pointer();
    let radius_sq = uniforms.pick_radius * uniforms.pick_radius;
    let clicked = uniforms.clicked();

    let mut out = StepOutput {
        visible: Vec::new(),
        pick,
    };

    for i in 0..entities.len() {
        if entities.statuses[i] == STATUS_INACTIVE {
            continue;
        }
        let vel = entities.velocities[i];
        let pos = &mut entities.positions[i];
        pos[0] += vel[0] * uniforms.delta_time;
        pos[1] += vel[1] * uniforms.delta_time;
        let p = Vec2::new(pos[0], pos[1]);

        if is_visible(&view_proj, p, half) {
            out.visible.push(i as u32);
        }

        if clicked && p.distance_squared(pointer) <= radius_sq {
            out.pick = out.pick.min(i as u32);
        }
    }

    out
}

/// Convenience: the pick word a click frame starts from.
pub const fn reset_pick() -> u32 {
    PICK_SENTINEL
}
