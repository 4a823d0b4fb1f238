//! Error types for presence aggregation.
//!
//! Only the edges of the crate fail: resolution parsing, configuration and
//! GeoJSON loading. Geometry and aggregation below the orchestrator are total.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenceError {
    /// A resolution ordinal outside coarse/medium/fine.
    #[error("unknown resolution level {0}: expected 0 (coarse), 1 (medium) or 2 (fine)")]
    UnknownResolution(u8),

    /// A resolution name that is not one of the three levels.
    #[error("unknown resolution name '{0}'")]
    UnknownResolutionName(String),

    /// Land mask or point source GeoJSON that cannot be interpreted.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PresenceError>;
