//! Input mapping: raw pointer and wheel events turned into engine actions.
//!
//! # Invariants
//! - The engine consumes actions, never raw window events.
//! - Pointer positions are device pixels with the origin at the top-left.

pub mod action;
pub mod pointer;

pub use action::Action;
pub use pointer::{PointerButton, PointerTracker};
