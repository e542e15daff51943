//! Typed failure paths for asset loading and GPU validation
//!
//! Every loader in the crate returns one of these instead of printing and
//! handing back a half-initialized object; callers decide whether a failure
//! is fatal or just worth a log line.

use std::path::PathBuf;

/// Failure while bringing an external asset onto the GPU.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The file could not be read at all.
    #[error("asset not found: {path}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its pixel data could not be decoded.
    #[error("failed to decode image {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The model file was read but could not be parsed.
    #[error("failed to parse model {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// The driver rejected a shader module or pipeline.
    #[error("GPU validation failed for '{name}': {message}")]
    GpuValidation { name: String, message: String },
}

/// A bounded slot array is full; the rejected push left it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} capacity ({capacity}) reached")]
pub struct CapacityError {
    pub kind: &'static str,
    pub capacity: usize,
}
