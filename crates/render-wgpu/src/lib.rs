//! wgpu particle engine.
//!
//! Each frame runs one compute pass over every entity slot (integrate, cull,
//! pick) followed by one render pass that draws the surviving sprites with a
//! single indirect call. The visible list and its count never leave the GPU;
//! the only GPU-to-host transfer is the 4-byte pick result.
//!
//! # Invariants
//! - The instance count is reset before every dispatch and only grows during it.
//! - At most one pick readback is in flight.
//! - Inactive slots are never moved, drawn or picked.

mod camera;
mod config;
mod context;
mod engine;
mod error;
mod picking;
mod presentation;
mod resources;
mod shaders;
mod simulation;
mod uniforms;

pub use camera::{Camera2D, MAX_ZOOM, MIN_ZOOM};
pub use config::EngineConfig;
pub use context::{OFFSCREEN_FORMAT, RenderTarget};
pub use engine::{Engine, SelectionCallback};
pub use error::{ConfigError, EngineError};
pub use picking::{PickPlan, PickProtocol};
pub use shaders::{PRESENTATION_SHADER, SIMULATION_SHADER};
pub use simulation::workgroup_count;
pub use uniforms::{FrameInputs, frame_uniforms};
