use crate::constants::{DEFAULT_CELL_CAP, DEFAULT_MIN_DISPLAY_COUNT};
use crate::error::Result;
use crate::grid::BinningScheme;
use crate::resolution::Resolution;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Binning scheme chosen for each resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemePolicy {
    pub coarse: BinningScheme,
    pub medium: BinningScheme,
    pub fine: BinningScheme,
}

impl Default for SchemePolicy {
    fn default() -> Self {
        Self {
            coarse: BinningScheme::OffsetGrid,
            medium: BinningScheme::OffsetGrid,
            fine: BinningScheme::GlobalIndex,
        }
    }
}

impl SchemePolicy {
    pub fn for_resolution(&self, resolution: Resolution) -> BinningScheme {
        match resolution {
            Resolution::Coarse => self.coarse,
            Resolution::Medium => self.medium,
            Resolution::Fine => self.fine,
        }
    }

    /// Same scheme at every resolution
    pub fn uniform(scheme: BinningScheme) -> Self {
        Self {
            coarse: scheme,
            medium: scheme,
            fine: scheme,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Hard limit on emitted cells per build
    pub cell_cap: usize,
    /// Populated cells with fewer points are suppressed
    pub min_display_count: u32,
    /// Spread halo spillover when binning with the global index
    pub halo: bool,
    /// With a land mask and the offset grid, emit every land cell, even empty ones
    pub include_empty_land_cells: bool,
    pub schemes: SchemePolicy,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            cell_cap: DEFAULT_CELL_CAP,
            min_display_count: DEFAULT_MIN_DISPLAY_COUNT,
            halo: true,
            include_empty_land_cells: false,
            schemes: SchemePolicy::default(),
        }
    }
}

impl PresenceConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
