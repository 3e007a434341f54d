use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// Per-frame uniform block, the only channel from host state to the GPU stages.
///
/// Byte layout (96 bytes):
/// - `[0..64)` column-major view-projection matrix
/// - `[64..96)` delta time, viewport width, viewport height, padding,
///   pointer world x, pointer world y, pick radius, click flag
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub delta_time: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub _pad: f32,
    pub pointer_world: [f32; 2],
    pub pick_radius: f32,
    pub click: f32,
}

impl FrameUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn view_proj(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }

    pub fn pointer(&self) -> Vec2 {
        Vec2::from(self.pointer_world)
    }

    pub fn clicked(&self) -> bool {
        self.click > 0.5
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            delta_time: 0.0,
            viewport_width: 1.0,
            viewport_height: 1.0,
            _pad: 0.0,
            pointer_world: [0.0, 0.0],
            pick_radius: 0.0,
            click: 0.0,
        }
    }
}

/// Arguments of a non-indexed indirect draw, as read by the GPU at submission.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

impl DrawIndirectArgs {
    /// Two triangles per sprite.
    pub const QUAD_VERTICES: u32 = 6;
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
    /// Byte offset of `instance_count`, reset by the host every frame.
    pub const INSTANCE_COUNT_OFFSET: u64 = 4;

    pub fn quads(instance_count: u32) -> Self {
        Self {
            vertex_count: Self::QUAD_VERTICES,
            instance_count,
            first_vertex: 0,
            first_instance: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn uniform_block_is_96_bytes() {
        assert_eq!(FrameUniforms::SIZE, 96);
        assert_eq!(offset_of!(FrameUniforms, delta_time), 64);
        assert_eq!(offset_of!(FrameUniforms, viewport_width), 68);
        assert_eq!(offset_of!(FrameUniforms, viewport_height), 72);
        assert_eq!(offset_of!(FrameUniforms, pointer_world), 80);
        assert_eq!(offset_of!(FrameUniforms, pick_radius), 88);
        assert_eq!(offset_of!(FrameUniforms, click), 92);
    }

    #[test]
    fn matrix_round_trips_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(3.0, -2.0, 0.0));
        let u = FrameUniforms {
            view_proj: m.to_cols_array_2d(),
            ..Default::default()
        };
        assert_eq!(u.view_proj(), m);
        // Translation lives in the fourth column: bytes 48..64.
        let bytes = bytemuck::bytes_of(&u);
        let tx = f32::from_le_bytes([bytes[48], bytes[49], bytes[50], bytes[51]]);
        assert_eq!(tx, 3.0);
    }

    #[test]
    fn click_flag_threshold() {
        let mut u = FrameUniforms::default();
        assert!(!u.clicked());
        u.click = 1.0;
        assert!(u.clicked());
    }

    #[test]
    fn indirect_args_layout() {
        let args = DrawIndirectArgs::quads(7);
        assert_eq!(DrawIndirectArgs::SIZE, 16);
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&args));
        assert_eq!(words, &[6, 7, 0, 0]);
        assert_eq!(
            offset_of!(DrawIndirectArgs, instance_count) as u64,
            DrawIndirectArgs::INSTANCE_COUNT_OFFSET
        );
    }
}
