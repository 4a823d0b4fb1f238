// Whole-pipeline invariants over seeded synthetic datasets

use approx::assert_relative_eq;
use hex_presence::config::{PresenceConfig, SchemePolicy};
use hex_presence::density::Tier;
use hex_presence::grid::{BinningScheme, CellBinner, GlobalIndexBinner, OffsetGridBinner};
use hex_presence::polygon::{ring_contains, LandMask, Polygon};
use hex_presence::poi::{GeoPoint, PoiKind, PointOfInterest};
use hex_presence::{build_presence, PresenceEngine, Resolution, ResolutionState};
use more_asserts::{assert_ge, assert_gt, assert_le};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

const KINDS: [PoiKind; 6] = [
    PoiKind::Synagogue,
    PoiKind::CommunityCenter,
    PoiKind::KosherFood,
    PoiKind::Mikvah,
    PoiKind::School,
    PoiKind::Camp,
];

fn random_points(seed: u64, n: usize, west: f64, south: f64, east: f64, north: f64) -> Vec<PointOfInterest> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let lon = rng.random_range(west..east);
            let lat = rng.random_range(south..north);
            PointOfInterest::new(lon, lat, KINDS[rng.random_range(0..KINDS.len())])
        })
        .collect()
}

fn rectangle(west: f64, south: f64, east: f64, north: f64) -> LandMask {
    LandMask::from_polygon(Polygon::new(
        vec![
            GeoPoint::new(west, south),
            GeoPoint::new(east, south),
            GeoPoint::new(east, north),
            GeoPoint::new(west, north),
            GeoPoint::new(west, south),
        ],
        Vec::new(),
    ))
}

fn uniform_engine(scheme: BinningScheme) -> PresenceEngine {
    PresenceEngine::new(PresenceConfig {
        schemes: SchemePolicy::uniform(scheme),
        ..PresenceConfig::default()
    })
}

#[test]
fn test_offset_grid_tiles_without_gaps() {
    for resolution in Resolution::ALL {
        let binner = OffsetGridBinner::new(resolution);
        for point in random_points(7, 300, -120.0, 25.0, -70.0, 48.0) {
            let home = binner.home_cell(&point.position).unwrap();
            let mut candidates = vec![home];
            candidates.extend(binner.neighbors(home));

            let containing: Vec<_> = candidates
                .iter()
                .filter(|&&key| ring_contains(&binner.ring(key), &point.position))
                .collect();
            assert_eq!(containing, vec![&home], "point {:?} at {}", point.position, resolution);
        }
    }
}

#[test]
fn test_adjacent_rings_share_exact_vertices() {
    for resolution in Resolution::ALL {
        let binner = OffsetGridBinner::new(resolution);
        let home = binner.home_cell(&GeoPoint::new(-87.63, 41.88)).unwrap();
        let ring = binner.ring(home);
        for neighbor in binner.neighbors(home) {
            let other = binner.ring(neighbor);
            let shared = ring[..6].iter().filter(|v| other[..6].contains(v)).count();
            assert_eq!(shared, 2, "{:?} / {:?} at {}", home, neighbor, resolution);
        }
    }
}

#[test]
fn test_global_index_rings_are_closed() {
    for resolution in Resolution::ALL {
        let binner = GlobalIndexBinner::new(resolution);
        let home = binner.home_cell(&GeoPoint::new(-87.63, 41.88)).unwrap();
        let mut cells = vec![home];
        cells.extend(binner.neighbors(home));
        assert_eq!(cells.len(), 7);
        for cell in cells {
            let ring = binner.ring(cell);
            assert_ge!(ring.len(), 7);
            assert_eq!(ring.first(), ring.last());
        }
    }
}

#[test]
fn test_hysteresis_sweep() {
    let mut state = ResolutionState::new(Resolution::Coarse);
    let trace: Vec<Resolution> = [5.9, 6.0, 8.99, 9.0, 8.5, 8.01, 7.99, 5.5, 5.01, 4.99]
        .iter()
        .map(|&zoom| {
            state.update(zoom);
            state.current()
        })
        .collect();

    use Resolution::*;
    assert_eq!(
        trace,
        vec![Coarse, Medium, Medium, Fine, Fine, Fine, Medium, Medium, Medium, Coarse]
    );
}

#[test]
fn test_hovering_at_threshold_never_oscillates() {
    let mut state = ResolutionState::new(Resolution::Medium);
    let mut changes = 0;
    for i in 0..200 {
        let zoom = 9.0 + if i % 2 == 0 { 0.01 } else { -0.01 };
        if state.update(zoom).is_some() {
            changes += 1;
        }
    }
    assert_eq!(changes, 1);
    assert_eq!(state.current(), Resolution::Fine);
}

#[test]
fn test_counts_are_conserved() {
    let mut points = random_points(11, 2_000, -100.0, 30.0, -80.0, 45.0);
    points.push(PointOfInterest::new(f64::NAN, 40.0, PoiKind::School));
    points.push(PointOfInterest::new(-90.0, 40.0, PoiKind::Unknown));

    for scheme in [BinningScheme::OffsetGrid, BinningScheme::GlobalIndex] {
        let mut engine = uniform_engine(scheme);
        for resolution in Resolution::ALL {
            let out = engine.build_presence(&points, resolution);
            assert_eq!(out.total_count(), 2_000, "{:?} at {}", scheme, resolution);
            assert_eq!(out.stats.skipped, 2);
            assert!(!out.cap_hit);
        }
    }
}

#[test]
fn test_counts_are_conserved_under_mask() {
    let points = random_points(12, 1_500, -100.0, 30.0, -80.0, 45.0);
    let mask = rectangle(-95.0, 32.0, -85.0, 42.0);

    for resolution in Resolution::ALL {
        let out = build_presence(&points, resolution, Some(&mask));
        assert_eq!(
            out.total_count() as usize + out.stats.masked_out,
            points.len(),
            "at {}",
            resolution
        );
        assert_eq!(out.total_count() as usize, out.stats.binned_points);
        assert_le!(out.stats.binned_points, 1_500);
    }
}

#[test]
fn test_scoring_is_monotonic_in_estimate() {
    let base = GeoPoint::new(-73.95, 40.65);
    let mut previous_tier = Tier::Minimal;
    let mut previous_level = 0;

    for n in 1..60 {
        let points = vec![PointOfInterest::new(base.longitude, base.latitude, PoiKind::KosherFood); n];
        let out = build_presence(&points, Resolution::Medium, None);
        let cell = out.cells.iter().find(|c| c.count > 0).unwrap();

        assert_ge!(cell.tier, previous_tier);
        assert_ge!(cell.level, previous_level);
        assert_le!(cell.level, 100);
        previous_tier = cell.tier;
        previous_level = cell.level;
    }
    assert_eq!(previous_level, 100);
}

#[test]
fn test_ten_points_same_coordinate() {
    let points = vec![PointOfInterest::new(-80.19, 25.76, PoiKind::Synagogue); 10];
    let out = build_presence(&points, Resolution::Coarse, None);

    assert_eq!(out.cells.len(), 1);
    let cell = &out.cells[0];
    assert_eq!(cell.count, 10);
    assert_relative_eq!(cell.weighted_estimate, 2_500.0);
    assert_eq!(cell.tier, Tier::Significant);
    assert_eq!(cell.level, 100);
    assert_relative_eq!(cell.score, 1.0);
}

#[test]
fn test_empty_dataset() {
    for resolution in Resolution::ALL {
        let out = build_presence(&[], resolution, None);
        assert!(out.cells.is_empty());
        assert!(!out.cap_hit);
    }
}

#[test]
fn test_cell_cap_is_never_exceeded() {
    let points = random_points(13, 5_000, -120.0, 25.0, -70.0, 48.0);
    for scheme in [BinningScheme::OffsetGrid, BinningScheme::GlobalIndex] {
        let mut engine = PresenceEngine::new(PresenceConfig {
            cell_cap: 250,
            schemes: SchemePolicy::uniform(scheme),
            ..PresenceConfig::default()
        });
        let out = engine.build_presence(&points, Resolution::Fine);
        assert_le!(out.cells.len(), 250);
        assert!(out.cap_hit);
        assert_eq!(
            out.total_count() as usize + out.stats.capped_points,
            points.len()
        );
    }
}

#[test]
fn test_suppressed_cells_reveal_nothing() {
    let points = vec![
        PointOfInterest::new(-73.95, 40.65, PoiKind::Mikvah),
        PointOfInterest::new(-73.95, 40.65, PoiKind::Mikvah),
    ];
    let out = build_presence(&points, Resolution::Medium, None);
    let cell = &out.cells[0];
    assert!(cell.suppressed);
    assert_eq!(cell.tier, Tier::Minimal);
    assert_eq!(cell.level, 0);
    assert!(cell.summary.counts_by_kind.is_empty());
    assert!(cell.summary.contained.is_empty());
    assert_eq!(cell.weighted_estimate, 0.0);
    assert_eq!(cell.summary.weighted_estimate, 0.0);
}

#[test]
fn test_suppressed_cells_spread_no_halo() {
    for n in 1..=2 {
        let points = vec![PointOfInterest::new(-73.95, 40.65, PoiKind::Synagogue); n];
        let out = build_presence(&points, Resolution::Fine, None);
        assert_eq!(out.scheme, BinningScheme::GlobalIndex);
        assert_eq!(out.cells.len(), 1, "{} points", n);
        assert!(out.cells.iter().all(|c| c.tier == Tier::Minimal && c.level == 0));
    }
}

#[test]
fn test_cell_climbs_from_halo_only_to_displayed() {
    let binner = GlobalIndexBinner::new(Resolution::Fine);
    let source = GeoPoint::new(-73.95, 40.65);
    let home = binner.home_cell(&source).unwrap();
    let target = binner.neighbors(home)[0];
    let target_id = binner.cell_id(target);
    let target_center = binner.center(target);

    let mut previous_tier = Tier::Minimal;
    let mut previous_level = 0;
    for added in 0..=5 {
        let mut points = vec![PointOfInterest::new(source.longitude, source.latitude, PoiKind::Synagogue); 3];
        points.extend(vec![
            PointOfInterest::new(target_center.longitude, target_center.latitude, PoiKind::Synagogue);
            added
        ]);
        let out = build_presence(&points, Resolution::Fine, None);
        let cell = out.cells.iter().find(|c| c.id == target_id).unwrap();

        assert_eq!(cell.count as usize, added);
        if added < 3 {
            assert_eq!((cell.tier, cell.level), (Tier::Minimal, 0), "{} added", added);
        } else {
            assert!(!cell.suppressed);
            assert_gt!(cell.level, 0);
        }
        assert_ge!(cell.tier, previous_tier);
        assert_ge!(cell.level, previous_level);
        previous_tier = cell.tier;
        previous_level = cell.level;
    }
    assert_eq!(previous_tier, Tier::Significant);
}

#[test]
fn test_tiers_spread_over_realistic_counts() {
    let tiers: BTreeSet<Tier> = (3..=40)
        .map(|n| {
            let points = vec![PointOfInterest::new(-87.63, 41.88, PoiKind::KosherFood); n];
            build_presence(&points, Resolution::Coarse, None).cells[0].tier
        })
        .collect();
    assert_ge!(tiers.len(), 3, "{:?}", tiers);
}

#[test]
fn test_truncated_land_scan_is_flagged() {
    let mut engine = PresenceEngine::new(PresenceConfig {
        cell_cap: 25,
        include_empty_land_cells: true,
        ..PresenceConfig::default()
    })
    .with_land_mask(rectangle(-100.0, 35.0, -95.0, 40.0));

    for resolution in [Resolution::Coarse, Resolution::Medium] {
        let out = engine.build_presence(&[], resolution);
        assert_eq!(out.cells.len(), 25);
        assert!(out.cap_hit, "at {}", resolution);
    }
}
