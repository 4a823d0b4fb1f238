// src/resolution.rs - The three display resolutions and the zoom hysteresis machine

use crate::constants::{ZOOM_ENTER_FINE, ZOOM_ENTER_MEDIUM, ZOOM_HYSTERESIS_BAND};
use crate::error::PresenceError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Coarse,
    Medium,
    Fine,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Coarse, Resolution::Medium, Resolution::Fine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Coarse => "coarse",
            Resolution::Medium => "medium",
            Resolution::Fine => "fine",
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Resolution::Coarse => 0,
            Resolution::Medium => 1,
            Resolution::Fine => 2,
        }
    }

    pub fn profile(&self) -> &'static ResolutionProfile {
        // every variant is inserted below
        &RESOLUTION_PROFILES[self]
    }
}

impl TryFrom<u8> for Resolution {
    type Error = PresenceError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Resolution::Coarse),
            1 => Ok(Resolution::Medium),
            2 => Ok(Resolution::Fine),
            other => Err(PresenceError::UnknownResolution(other)),
        }
    }
}

impl FromStr for Resolution {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coarse" => Ok(Resolution::Coarse),
            "medium" => Ok(Resolution::Medium),
            "fine" => Ok(Resolution::Fine),
            _ => Err(PresenceError::UnknownResolutionName(s.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed constants of one resolution level
#[derive(Debug, Clone)]
pub struct ResolutionProfile {
    pub resolution: Resolution,
    /// Offset-grid hexagon radius in projected meters
    pub radius_m: f64,
    /// Matching level of the global hierarchical index
    pub h3_resolution: h3o::Resolution,
    /// Weighted estimate that maps to level 100
    pub max_weighted_estimate: f64,
    /// Cell area used when the index cannot report one
    pub fallback_area_km2: f64,
}

pub static RESOLUTION_PROFILES: Lazy<HashMap<Resolution, ResolutionProfile>> = Lazy::new(|| {
    use Resolution::*;
    let mut m = HashMap::new();

    m.insert(Coarse, ResolutionProfile {
        resolution: Coarse,
        radius_m: 25_000.0,
        h3_resolution: h3o::Resolution::Four,
        max_weighted_estimate: 2_500.0,
        fallback_area_km2: 1_770.3,
    });

    m.insert(Medium, ResolutionProfile {
        resolution: Medium,
        radius_m: 9_000.0,
        h3_resolution: h3o::Resolution::Five,
        max_weighted_estimate: 1_200.0,
        fallback_area_km2: 252.9,
    });

    m.insert(Fine, ResolutionProfile {
        resolution: Fine,
        radius_m: 3_500.0,
        h3_resolution: h3o::Resolution::Six,
        max_weighted_estimate: 400.0,
        fallback_area_km2: 36.13,
    });

    m
});

/// Zoom-driven resolution selection with a one-unit hysteresis band
///
/// Entering a finer resolution happens at its threshold; leaving it only once
/// the zoom drops below `threshold - 1`. The machine has no terminal state.
#[derive(Debug, Clone)]
pub struct ResolutionState {
    current: Resolution,
    enter_medium: f64,
    enter_fine: f64,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self::new(Resolution::Coarse)
    }
}

impl ResolutionState {
    pub fn new(initial: Resolution) -> Self {
        Self::with_thresholds(initial, ZOOM_ENTER_MEDIUM, ZOOM_ENTER_FINE)
    }

    pub fn with_thresholds(initial: Resolution, enter_medium: f64, enter_fine: f64) -> Self {
        Self {
            current: initial,
            enter_medium,
            enter_fine,
        }
    }

    /// Start in whichever state the zoom would enter from scratch
    pub fn from_zoom(zoom: f64) -> Self {
        let mut state = Self::new(Resolution::Coarse);
        state.update(zoom);
        state
    }

    pub fn current(&self) -> Resolution {
        self.current
    }

    /// Pure transition function
    pub fn next(&self, zoom: f64) -> Resolution {
        if zoom.is_nan() {
            return self.current;
        }

        let exit_fine = self.enter_fine - ZOOM_HYSTERESIS_BAND;
        let exit_medium = self.enter_medium - ZOOM_HYSTERESIS_BAND;

        match self.current {
            Resolution::Fine => {
                if zoom >= exit_fine {
                    Resolution::Fine
                } else if zoom < exit_medium {
                    Resolution::Coarse
                } else {
                    Resolution::Medium
                }
            }
            Resolution::Medium => {
                if zoom >= self.enter_fine {
                    Resolution::Fine
                } else if zoom < exit_medium {
                    Resolution::Coarse
                } else {
                    Resolution::Medium
                }
            }
            Resolution::Coarse => {
                if zoom >= self.enter_fine {
                    Resolution::Fine
                } else if zoom >= self.enter_medium {
                    Resolution::Medium
                } else {
                    Resolution::Coarse
                }
            }
        }
    }

    /// Feed a zoom value; returns the new resolution when it changed
    pub fn update(&mut self, zoom: f64) -> Option<Resolution> {
        let next = self.next(zoom);
        if next == self.current {
            None
        } else {
            self.current = next;
            Some(next)
        }
    }
}
