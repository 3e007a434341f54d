use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use swarm_assets::AtlasSource;
use swarm_common::MAX_ENTITIES;

/// Engine settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entity slots allocated on the GPU. Clamped to `1..=MAX_ENTITIES`.
    pub capacity: u32,
    /// Pick radius in NDC units at zoom 1. The world-space radius shrinks as zoom grows.
    pub pick_radius_ndc: f32,
    /// Linear RGBA clear colour of the presentation pass.
    pub clear_color: [f64; 4],
    /// Use this delta time for every frame instead of the wall clock.
    pub fixed_delta_time: Option<f32>,
    /// Upper bound on the wall-clock delta time, in seconds.
    pub max_delta_time: f32,
    pub atlas: AtlasSource,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_ENTITIES,
            pick_radius_ndc: 0.05,
            clear_color: [0.02, 0.02, 0.05, 1.0],
            fixed_delta_time: None,
            max_delta_time: 0.1,
            atlas: AtlasSource::default(),
            vsync: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Slot count actually allocated.
    pub fn effective_capacity(&self) -> u32 {
        self.capacity.clamp(1, MAX_ENTITIES)
    }

    pub(crate) fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}
