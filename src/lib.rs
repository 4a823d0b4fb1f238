pub mod annotate;
pub mod cache;
pub mod cell_id;
pub mod config;
pub mod constants;
pub mod density;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod grid;
pub mod hex_geometry;
pub mod math_utils;
pub mod poi;
pub mod polygon;
pub mod presence;
pub mod projection;
pub mod resolution;
pub mod scheduler;

pub use error::{PresenceError, Result};
pub use presence::{build_presence, AggregatedCells, PresenceEngine};
pub use resolution::{Resolution, ResolutionState};
