//! Entity kernel: host-side bookkeeping for the device-resident entity arrays.
//!
//! # Invariants
//! - The free-slot cursor only moves forward and never exceeds capacity.
//! - Slots at or beyond the cursor are never written.
//! - `reference::step` follows the simulation shader rule for rule; GPU
//!   output is compared against it in tests.

pub mod arena;
pub mod reference;
pub mod spawn;

pub use arena::{SlotArena, SlotRange};
pub use reference::{StepOutput, is_visible, sprite_half_extent_ndc};
pub use spawn::{BatchGenerator, SpawnConfig};
