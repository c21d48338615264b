//! Error types for voxglow

use thiserror::Error;

/// Main error type
///
/// Terrain and tree generation never fail; only startup (window, GPU, config)
/// and per-frame surface acquisition produce errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
