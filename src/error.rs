//! Error types for the cube renderer.
//!
//! Every failure the application can hit happens during startup: acquiring a
//! GPU context, compiling the shader pipeline, uploading the mesh, accepting
//! a configuration or creating the event loop. Once the frame loop is running
//! nothing returns an error.

use thiserror::Error;

/// Errors that abort renderer startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Surface, adapter or device could not be obtained.
    #[error("failed to acquire rendering context: {0}")]
    ContextAcquisition(String),

    /// The WGSL module or render pipeline failed validation.
    #[error("failed to initialize shaders: {0}")]
    ShaderInit(String),

    /// Mesh data was malformed.
    #[error("failed to upload mesh: {0}")]
    MeshUpload(String),

    /// A demo configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The windowing event loop could not be created or failed.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, RenderError>;
