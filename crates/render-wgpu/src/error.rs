use std::path::PathBuf;
use swarm_assets::AtlasError;

/// Fatal engine start-up failures. Per-frame problems are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no usable GPU backend: {0}")]
    UnsupportedBackend(String),
    #[error("failed to acquire a GPU device: {0}")]
    DeviceAcquisitionFailed(#[from] wgpu::RequestDeviceError),
    #[error("failed to load sprite atlas: {0}")]
    AtlasLoadFailed(#[from] AtlasError),
}

/// Errors reading an [`crate::EngineConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
