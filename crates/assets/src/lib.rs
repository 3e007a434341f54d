//! Sprite atlas preparation.
//!
//! An atlas is an ordered list of equally sized RGBA images, one per entity
//! type, each carrying a full mip chain computed on the CPU at load time. The
//! renderer uploads the result as a layered texture and never touches files.
//!
//! # Invariants
//! - Every layer has the same base size.
//! - Every layer has `mip_level_count(width, height)` levels, each half the previous, at least 1x1.

mod atlas;
mod mips;
mod source;

pub use atlas::{AtlasError, AtlasImage};
pub use mips::{build_mip_chain, mip_extent, mip_level_count};
pub use source::{AtlasSource, DEFAULT_SPRITE_COLORS, DEFAULT_SPRITE_SIZE};
