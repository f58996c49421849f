//! Error taxonomy of the scene core.
//!
//! Everything here is recoverable at the scene-composition boundary. Host code
//! (window, GPU setup) wraps these in `anyhow::Error`.

use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = SceneError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SceneError {
    /// Fetching or decoding a texture/font failed.
    #[error("failed to load asset `{path}`: {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("loading asset `{path}` timed out after {after:?}")]
    AssetTimeout { path: String, after: Duration },

    /// Text or bulk instances were addressed before the font completion handler ran.
    #[error("scene is not loaded yet")]
    NotLoaded,

    #[error("scene was already populated; the completion handler runs once")]
    AlreadyLoaded,

    #[error("geometry construction failed: {0}")]
    Geometry(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl SceneError {
    pub(crate) fn asset(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SceneError::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
