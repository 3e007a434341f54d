//! Shared types for the swarm engine.
//!
//! # Invariants
//! - Entity ids are slot indices into fixed-capacity device arrays.
//! - `FrameUniforms` and `DrawIndirectArgs` match the WGSL declarations byte for byte.

mod layout;
mod types;

pub use layout::{DrawIndirectArgs, FrameUniforms};
pub use types::{
    EntityBatch, EntityId, MAX_ENTITIES, PICK_SENTINEL, SPRITE_HALF_PX, STATUS_ACTIVE,
    STATUS_INACTIVE, WORKGROUP_SIZE,
};
