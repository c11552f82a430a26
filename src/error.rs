//! Error types.
//!
//! Tree operations never fail: stale ids are ignored and geometry is clamped.
//! Errors only come from the edges, loading configuration and images.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum PaintError {
    #[error("failed to load image {path}: {reason}")]
    Image { path: String, reason: String },
}
