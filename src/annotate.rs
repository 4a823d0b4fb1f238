/// Cell annotation: per-category breakdown by point-in-polygon containment
///
/// The expensive containment pass runs only on an annotation-cache miss; hits
/// reuse the stored summary for the same `(cell, fingerprint)`.

use crate::cache::AnnotationCache;
use crate::cell_id::CellId;
use crate::density::{level_for_estimate, Tier};
use crate::fingerprint::DatasetFingerprint;
use crate::hex_geometry::Ring;
use crate::poi::{GeoPoint, PoiKind, PointOfInterest};
use crate::polygon::{ring_contains, BoundingBox};
use crate::resolution::Resolution;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// What a cell's polygon actually contains
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellSummary {
    pub total: u32,
    pub counts_by_kind: BTreeMap<PoiKind, u32>,
    pub weighted_estimate: f64,
    pub level: u8,
    /// Indexes into the point set the summary was computed from
    pub contained: Vec<usize>,
}

/// One output cell, ready for styling and detail display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceCell {
    pub id: CellId,
    pub polygon: Ring,
    pub bbox: BoundingBox,
    /// Points whose home cell this is
    pub count: u32,
    pub tier: Tier,
    pub level: u8,
    pub score: f64,
    /// Own estimate plus halo spillover
    pub weighted_estimate: f64,
    pub halo: f64,
    pub suppressed: bool,
    pub summary: CellSummary,
}

/// Points sorted by longitude so a bounding box selects a contiguous run
struct LongitudeIndex<'a> {
    points: &'a [PointOfInterest],
    order: Vec<usize>,
}

impl<'a> LongitudeIndex<'a> {
    fn new(points: &'a [PointOfInterest]) -> Self {
        let mut order: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].is_aggregatable())
            .collect();
        order.sort_by(|&a, &b| {
            points[a]
                .position
                .longitude
                .total_cmp(&points[b].position.longitude)
        });
        Self { points, order }
    }

    fn candidates(&self, bbox: &BoundingBox) -> impl Iterator<Item = usize> + '_ {
        let start = self
            .order
            .partition_point(|&i| self.points[i].position.longitude < bbox.west);
        let bbox = *bbox;
        self.order[start..]
            .iter()
            .copied()
            .take_while(move |&i| self.points[i].position.longitude <= bbox.east)
            .filter(move |&i| bbox.contains(&self.points[i].position))
    }
}

fn summarize(
    ring: &[GeoPoint],
    bbox: &BoundingBox,
    index: &LongitudeIndex<'_>,
    resolution: Resolution,
) -> CellSummary {
    let mut summary = CellSummary::default();
    for i in index.candidates(bbox) {
        let point = &index.points[i];
        if !ring_contains(ring, &point.position) {
            continue;
        }
        summary.total += 1;
        *summary.counts_by_kind.entry(point.kind).or_insert(0) += 1;
        summary.weighted_estimate += point.kind.weight();
        summary.contained.push(i);
    }
    summary.level = level_for_estimate(summary.weighted_estimate, resolution);
    summary
}

/// Attach containment summaries to every cell
///
/// Suppressed cells keep their cached summary internally but expose only the
/// contained total: no category breakdown, no estimate, no contained points.
pub fn annotate(
    mut cells: Vec<PresenceCell>,
    points: &[PointOfInterest],
    fingerprint: &DatasetFingerprint,
    cache: &mut AnnotationCache,
) -> Vec<PresenceCell> {
    let mut index: Option<LongitudeIndex<'_>> = None;
    let mut misses = 0usize;

    for cell in cells.iter_mut() {
        let summary = match cache.get(&cell.id, fingerprint) {
            Some(summary) => summary.clone(),
            None => {
                misses += 1;
                let index = index.get_or_insert_with(|| LongitudeIndex::new(points));
                let summary = summarize(&cell.polygon, &cell.bbox, index, cell.id.resolution());
                cache.put(cell.id, *fingerprint, summary.clone());
                summary
            }
        };

        cell.summary = if cell.suppressed {
            CellSummary {
                total: summary.total,
                ..CellSummary::default()
            }
        } else {
            summary
        };
    }

    debug!(cells = cells.len(), misses, %fingerprint, "annotated cells");
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_geometry::HexLattice;

    fn cell_for(lattice: &HexLattice, row: i64, col: i64, suppressed: bool) -> PresenceCell {
        let polygon = lattice.ring(row, col);
        let bbox = BoundingBox::of_points(&polygon);
        PresenceCell {
            id: CellId::offset(Resolution::Medium, row, col),
            polygon,
            bbox,
            count: 0,
            tier: Tier::Minimal,
            level: 0,
            score: 0.0,
            weighted_estimate: 0.0,
            halo: 0.0,
            suppressed,
            summary: CellSummary::default(),
        }
    }

    fn points_near(center: GeoPoint) -> Vec<PointOfInterest> {
        vec![
            PointOfInterest::new(center.longitude, center.latitude, PoiKind::Synagogue),
            PointOfInterest::new(center.longitude + 0.001, center.latitude, PoiKind::KosherFood),
            PointOfInterest::new(center.longitude, center.latitude + 0.001, PoiKind::KosherFood),
            PointOfInterest::new(center.longitude + 5.0, center.latitude, PoiKind::School),
        ]
    }

    #[test]
    fn test_annotate_counts_contained_points() {
        let lattice = HexLattice::new(9_000.0);
        let cell = cell_for(&lattice, 330, -550, false);
        let center = crate::hex_geometry::ring_center(&cell.polygon).unwrap();
        let points = points_near(center);
        let fp = DatasetFingerprint::of(&points);
        let mut cache = AnnotationCache::new();

        let out = annotate(vec![cell], &points, &fp, &mut cache);
        let summary = &out[0].summary;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.counts_by_kind[&PoiKind::KosherFood], 2);
        assert_eq!(summary.weighted_estimate, 450.0);
        assert_eq!(summary.contained, vec![0, 1, 2]);
        assert_eq!(summary.level, level_for_estimate(450.0, Resolution::Medium));
    }

    #[test]
    fn test_second_pass_hits_cache() {
        let lattice = HexLattice::new(9_000.0);
        let cell = cell_for(&lattice, 330, -550, false);
        let center = crate::hex_geometry::ring_center(&cell.polygon).unwrap();
        let points = points_near(center);
        let fp = DatasetFingerprint::of(&points);
        let mut cache = AnnotationCache::new();

        let first = annotate(vec![cell.clone()], &points, &fp, &mut cache);
        let second = annotate(vec![cell], &points, &fp, &mut cache);
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_suppressed_cell_hides_detail() {
        let lattice = HexLattice::new(9_000.0);
        let cell = cell_for(&lattice, 330, -550, true);
        let center = crate::hex_geometry::ring_center(&cell.polygon).unwrap();
        let points = points_near(center);
        let fp = DatasetFingerprint::of(&points);
        let mut cache = AnnotationCache::new();

        let out = annotate(vec![cell], &points, &fp, &mut cache);
        assert_eq!(out[0].summary.total, 3);
        assert!(out[0].summary.contained.is_empty());
        assert!(out[0].summary.counts_by_kind.is_empty());
        assert_eq!(out[0].summary.weighted_estimate, 0.0);
        assert_eq!(out[0].summary.level, 0);
    }
}
