/// Presence aggregation engine
///
/// A build runs three separable phases over one point set and one resolution:
/// binning, scoring and annotation. The engine owns the configuration, the
/// optional land mask and both caches; a one-shot build can use
/// [`build_presence`] instead.

use crate::annotate::{annotate, CellSummary, PresenceCell};
use crate::cache::{AnnotationCache, HexBuildCache};
use crate::config::PresenceConfig;
use crate::density::{DensityScorer, ScoredCell};
use crate::fingerprint::DatasetFingerprint;
use crate::grid::{
    bin_points, ring_for, BinOptions, BinnedCells, BinningScheme, GlobalIndexBinner,
    OffsetGridBinner,
};
use crate::poi::PointOfInterest;
use crate::polygon::{BoundingBox, LandMask};
use crate::resolution::Resolution;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Point accounting of one build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub input_points: usize,
    pub binned_points: usize,
    pub skipped: usize,
    pub masked_out: usize,
    pub capped_points: usize,
}

impl BuildStats {
    fn from_binned(input_points: usize, binned: &BinnedCells) -> Self {
        Self {
            input_points,
            binned_points: binned.binned_points,
            skipped: binned.skipped,
            masked_out: binned.masked_out,
            capped_points: binned.capped_points,
        }
    }
}

/// Output of the binning phase
#[derive(Debug, Clone)]
pub struct BinnedStage {
    pub resolution: Resolution,
    pub scheme: BinningScheme,
    pub binned: BinnedCells,
    pub stats: BuildStats,
}

/// Output of the scoring phase
#[derive(Debug, Clone)]
pub struct ScoredStage {
    pub resolution: Resolution,
    pub scheme: BinningScheme,
    pub cells: Vec<ScoredCell>,
    pub stats: BuildStats,
    pub cap_hit: bool,
}

/// The cell set for one resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedCells {
    pub resolution: Resolution,
    pub scheme: BinningScheme,
    pub fingerprint: DatasetFingerprint,
    pub cells: Vec<PresenceCell>,
    /// The cell cap truncated this build
    pub cap_hit: bool,
    pub stats: BuildStats,
}

impl AggregatedCells {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sum of home counts over all cells
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count as u64).sum()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.cells
            .iter()
            .fold(BoundingBox::empty(), |acc, c| acc.union(&c.bbox))
    }
}

pub struct PresenceEngine {
    config: PresenceConfig,
    land_mask: Option<LandMask>,
    hex_cache: HexBuildCache,
    annotation_cache: AnnotationCache,
    last_fingerprint: Option<DatasetFingerprint>,
}

impl Default for PresenceEngine {
    fn default() -> Self {
        Self::new(PresenceConfig::default())
    }
}

impl PresenceEngine {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            land_mask: None,
            hex_cache: HexBuildCache::new(),
            annotation_cache: AnnotationCache::new(),
            last_fingerprint: None,
        }
    }

    pub fn with_land_mask(mut self, land_mask: LandMask) -> Self {
        self.set_land_mask(Some(land_mask));
        self
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn land_mask(&self) -> Option<&LandMask> {
        self.land_mask.as_ref()
    }

    /// Replace the land mask; cached cells may no longer be valid
    pub fn set_land_mask(&mut self, land_mask: Option<LandMask>) {
        self.land_mask = land_mask;
        self.hex_cache.clear();
        self.annotation_cache.clear();
    }

    pub fn set_config(&mut self, config: PresenceConfig) {
        if config != self.config {
            self.hex_cache.clear();
            self.annotation_cache.clear();
        }
        self.config = config;
    }

    pub fn annotation_cache(&self) -> &AnnotationCache {
        &self.annotation_cache
    }

    pub fn hex_cache(&self) -> &HexBuildCache {
        &self.hex_cache
    }

    pub fn clear_caches(&mut self) {
        self.hex_cache.clear();
        self.annotation_cache.clear();
    }

    /// Record the dataset about to be annotated, dropping stale summaries
    pub fn observe_fingerprint(&mut self, fingerprint: DatasetFingerprint) {
        if self.last_fingerprint != Some(fingerprint) {
            if let Some(previous) = self.last_fingerprint {
                debug!(%previous, current = %fingerprint, "dataset changed, evicting stale summaries");
            }
            self.annotation_cache.retain_fingerprint(&fingerprint);
            self.last_fingerprint = Some(fingerprint);
        }
    }

    /// Binning phase: home cells, land masking, cap and halo
    pub fn bin(&self, points: &[PointOfInterest], resolution: Resolution) -> BinnedStage {
        let scheme = self.config.schemes.for_resolution(resolution);
        let mask = self.land_mask.as_ref();
        let cell_cap = self.config.cell_cap;

        let binned = match scheme {
            BinningScheme::OffsetGrid => {
                let binner = OffsetGridBinner::new(resolution);
                let (seed, scan_truncated) = match mask {
                    Some(mask) if self.config.include_empty_land_cells => {
                        binner.lattice_scan(mask, cell_cap)
                    }
                    _ => (Vec::new(), false),
                };
                let options = BinOptions {
                    land_mask: mask,
                    cell_cap,
                    halo: false,
                    halo_min_count: self.config.min_display_count,
                };
                let mut binned = bin_points(&binner, points, &seed, options);
                binned.cap_hit |= scan_truncated;
                binned
            }
            BinningScheme::GlobalIndex => {
                let binner = GlobalIndexBinner::new(resolution);
                let options = BinOptions {
                    land_mask: mask,
                    cell_cap,
                    halo: self.config.halo,
                    halo_min_count: self.config.min_display_count,
                };
                bin_points(&binner, points, &[], options)
            }
        };

        let stats = BuildStats::from_binned(points.len(), &binned);
        debug!(
            %resolution,
            ?scheme,
            cells = binned.cells.len(),
            binned = stats.binned_points,
            skipped = stats.skipped,
            masked_out = stats.masked_out,
            "binned points"
        );
        if binned.cap_hit {
            warn!(%resolution, cell_cap, dropped = stats.capped_points, "cell cap reached, output truncated");
        }

        BinnedStage {
            resolution,
            scheme,
            binned,
            stats,
        }
    }

    /// Scoring phase: tier, level and percentile score per cell
    pub fn score(&self, stage: BinnedStage) -> ScoredStage {
        let scorer = DensityScorer::new(stage.resolution, self.config.min_display_count);
        let cap_hit = stage.binned.cap_hit;
        let cells = scorer.score(stage.binned.cells);
        let suppressed = cells.iter().filter(|c| c.suppressed).count();
        debug!(resolution = %stage.resolution, cells = cells.len(), suppressed, "scored cells");

        ScoredStage {
            resolution: stage.resolution,
            scheme: stage.scheme,
            cells,
            stats: stage.stats,
            cap_hit,
        }
    }

    /// Annotation phase: polygons, bounding boxes and containment summaries
    pub fn annotate(
        &mut self,
        stage: ScoredStage,
        points: &[PointOfInterest],
        fingerprint: DatasetFingerprint,
    ) -> AggregatedCells {
        self.observe_fingerprint(fingerprint);

        let mut scored = stage.cells;
        let mut cap_hit = stage.cap_hit;
        if scored.len() > self.config.cell_cap {
            scored.truncate(self.config.cell_cap);
            cap_hit = true;
        }

        let cells: Vec<PresenceCell> = scored
            .into_iter()
            .map(|s| {
                let id = s.cell.id;
                let polygon = self.hex_cache.get_or_build(id, || ring_for(&id));
                let bbox = BoundingBox::of_points(&polygon);
                // suppressed cells expose no estimate
                let (weighted_estimate, halo) = if s.suppressed {
                    (0.0, 0.0)
                } else {
                    (s.cell.total_estimate(), s.cell.halo)
                };
                PresenceCell {
                    id,
                    polygon,
                    bbox,
                    count: s.cell.count,
                    tier: s.tier,
                    level: s.level,
                    score: s.score,
                    weighted_estimate,
                    halo,
                    suppressed: s.suppressed,
                    summary: CellSummary::default(),
                }
            })
            .collect();
        let cells = annotate(cells, points, &fingerprint, &mut self.annotation_cache);

        info!(
            resolution = %stage.resolution,
            cells = cells.len(),
            points = stage.stats.binned_points,
            cap_hit,
            %fingerprint,
            "presence cells ready"
        );

        AggregatedCells {
            resolution: stage.resolution,
            scheme: stage.scheme,
            fingerprint,
            cells,
            cap_hit,
            stats: stage.stats,
        }
    }

    /// Run all three phases
    pub fn build_presence(
        &mut self,
        points: &[PointOfInterest],
        resolution: Resolution,
    ) -> AggregatedCells {
        let fingerprint = DatasetFingerprint::of(points);
        let binned = self.bin(points, resolution);
        let scored = self.score(binned);
        self.annotate(scored, points, fingerprint)
    }
}

/// One-shot build with default configuration and fresh caches
pub fn build_presence(
    points: &[PointOfInterest],
    resolution: Resolution,
    land_mask: Option<&LandMask>,
) -> AggregatedCells {
    let mut engine = PresenceEngine::default();
    if let Some(mask) = land_mask {
        engine.set_land_mask(Some(mask.clone()));
    }
    engine.build_presence(points, resolution)
}
