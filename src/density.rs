/// Density scoring: tiers, levels and percentile-normalized scores
///
/// Scores are always computed from a cell's own estimate and its resolution's
/// normalization constant; they are never compared across resolutions.

use crate::constants::{
    SCORE_PERCENTILE, TIER_LOW_COUNT, TIER_MODERATE_COUNT, TIER_NOTABLE_COUNT, TIER_SIGNIFICANT_COUNT,
};
use crate::grid::BinnedCell;
use crate::math_utils::{clamp, percentile};
use crate::resolution::Resolution;
use serde::{Deserialize, Serialize};

/// Five-level categorical density label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Minimal,
    Low,
    Moderate,
    Notable,
    Significant,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Minimal, Tier::Low, Tier::Moderate, Tier::Notable, Tier::Significant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Minimal => "minimal",
            Tier::Low => "low",
            Tier::Moderate => "moderate",
            Tier::Notable => "notable",
            Tier::Significant => "significant",
        }
    }
}

/// Tier of a value on the 16/8/4/2 threshold scale
pub fn tier_for_value(value: f64) -> Tier {
    if value >= TIER_SIGNIFICANT_COUNT as f64 {
        Tier::Significant
    } else if value >= TIER_NOTABLE_COUNT as f64 {
        Tier::Notable
    } else if value >= TIER_MODERATE_COUNT as f64 {
        Tier::Moderate
    } else if value >= TIER_LOW_COUNT as f64 {
        Tier::Low
    } else {
        Tier::Minimal
    }
}

pub fn tier_for_count(count: u32) -> Tier {
    tier_for_value(count as f64)
}

/// Tier of a weighted estimate, measured in sixteenths of the resolution max
///
/// An estimate at the resolution max lands exactly on the significant
/// threshold, half of it on notable, and so on down.
pub fn tier_for_estimate(weighted_estimate: f64, resolution: Resolution) -> Tier {
    let unit = resolution.profile().max_weighted_estimate / TIER_SIGNIFICANT_COUNT as f64;
    tier_for_value(weighted_estimate / unit)
}

/// `round(clamp(estimate / resolution max, 0, 1) * 100)`
pub fn level_for_estimate(weighted_estimate: f64, resolution: Resolution) -> u8 {
    let max = resolution.profile().max_weighted_estimate;
    (clamp(weighted_estimate / max, 0.0, 1.0) * 100.0).round() as u8
}

/// Normalize densities by their 95th percentile
///
/// Zero densities do not take part in the percentile; with no non-zero value
/// the denominator falls back to 1. Results are clamped to `[0, 1]`.
pub fn percentile_scores(densities: &[f64]) -> Vec<f64> {
    let mut nonzero: Vec<f64> = densities.iter().copied().filter(|d| *d > 0.0).collect();
    nonzero.sort_by(|a, b| a.total_cmp(b));

    let denominator = match percentile(&nonzero, SCORE_PERCENTILE) {
        Some(p) if p > 0.0 => p,
        _ => 1.0,
    };
    densities
        .iter()
        .map(|d| clamp(d / denominator, 0.0, 1.0))
        .collect()
}

/// A binned cell with its scores attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCell {
    pub cell: BinnedCell,
    pub tier: Tier,
    pub level: u8,
    pub score: f64,
    /// Below the minimum display count; shown at the floor tier with no detail
    pub suppressed: bool,
}

/// Scores one resolution's cell set
#[derive(Debug, Clone, Copy)]
pub struct DensityScorer {
    pub resolution: Resolution,
    /// k-anonymity floor: cells whose home count is under it score as Minimal/0
    pub min_display_count: u32,
}

impl DensityScorer {
    pub fn new(resolution: Resolution, min_display_count: u32) -> Self {
        Self {
            resolution,
            min_display_count,
        }
    }

    /// Below the floor: tier, level and score come out at their minimum
    /// whatever halo the cell received
    pub fn is_floored(&self, count: u32) -> bool {
        count < self.min_display_count
    }

    /// Populated but below the floor; its detail must not be shown
    pub fn is_suppressed(&self, count: u32) -> bool {
        count > 0 && self.is_floored(count)
    }

    pub fn score(&self, cells: Vec<BinnedCell>) -> Vec<ScoredCell> {
        let densities: Vec<f64> = cells
            .iter()
            .map(|cell| {
                if self.is_floored(cell.count) || cell.area_km2 <= 0.0 {
                    0.0
                } else {
                    cell.total_estimate() / cell.area_km2
                }
            })
            .collect();
        let scores = percentile_scores(&densities);

        cells
            .into_iter()
            .zip(scores)
            .map(|(cell, score)| {
                let suppressed = self.is_suppressed(cell.count);
                let (tier, level) = if self.is_floored(cell.count) {
                    (Tier::Minimal, 0)
                } else {
                    let estimate = cell.total_estimate();
                    (
                        tier_for_estimate(estimate, self.resolution),
                        level_for_estimate(estimate, self.resolution),
                    )
                };
                ScoredCell {
                    cell,
                    tier,
                    level,
                    score,
                    suppressed,
                }
            })
            .collect()
    }
}
