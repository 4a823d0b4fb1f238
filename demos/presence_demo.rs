// Synthetic end-to-end run: clustered points, a zoom sweep, a tier histogram and a GeoJSON dump
//
//   RUST_LOG=hex_presence=debug cargo run --example presence_demo -- /tmp/presence.geojson

use colored::Colorize;
use hex_presence::density::Tier;
use hex_presence::export::write_feature_collection;
use hex_presence::poi::{GeoPoint, PoiKind, PointOfInterest};
use hex_presence::polygon::{LandMask, Polygon};
use hex_presence::scheduler::{RebuildScheduler, TickOutcome};
use hex_presence::{AggregatedCells, PresenceEngine, Resolution, ResolutionState};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const SEED: u64 = 1790;
const POINT_COUNT: usize = 20_000;
const WEST: f64 = -125.0;
const EAST: f64 = -66.0;
const SOUTH: f64 = 24.0;
const NORTH: f64 = 49.5;

/// Points clustered where Perlin noise peaks
fn synthetic_points(rng: &mut StdRng) -> Vec<PointOfInterest> {
    let perlin = Perlin::new(rng.random());
    let kinds = [
        PoiKind::Synagogue,
        PoiKind::CommunityCenter,
        PoiKind::KosherFood,
        PoiKind::Mikvah,
        PoiKind::School,
        PoiKind::Camp,
    ];

    let mut points = Vec::with_capacity(POINT_COUNT);
    while points.len() < POINT_COUNT {
        let lon = rng.random_range(WEST..EAST);
        let lat = rng.random_range(SOUTH..NORTH);
        let density = perlin.get([lon * 0.15, lat * 0.15]) * 0.5 + 0.5;
        if rng.random::<f64>() > density.powi(4) {
            continue;
        }
        let kind = kinds[rng.random_range(0..kinds.len())];
        points.push(PointOfInterest::new(lon, lat, kind));
    }
    points
}

fn land_mask() -> LandMask {
    let ring = vec![
        GeoPoint::new(WEST, SOUTH),
        GeoPoint::new(EAST, SOUTH),
        GeoPoint::new(EAST, NORTH),
        GeoPoint::new(WEST, NORTH),
        GeoPoint::new(WEST, SOUTH),
    ];
    LandMask::from_polygon(Polygon::new(ring, Vec::new()))
}

fn paint(tier: Tier, text: String) -> colored::ColoredString {
    match tier {
        Tier::Significant => text.red().bold(),
        Tier::Notable => text.red(),
        Tier::Moderate => text.yellow(),
        Tier::Low => text.green(),
        Tier::Minimal => text.dimmed(),
    }
}

fn main() -> hex_presence::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let output = std::env::args().nth(1).map(PathBuf::from);
    let mut rng = StdRng::seed_from_u64(SEED);
    let points = Rc::new(synthetic_points(&mut rng));
    println!("{} {} synthetic points", "generated".bold(), points.len());

    let mut engine = PresenceEngine::default().with_land_mask(land_mask());
    let mut scheduler = RebuildScheduler::new();
    let mut state = ResolutionState::new(Resolution::Coarse);
    let mut last: Option<AggregatedCells> = None;

    // zoom in, hover around the fine threshold, then back out
    let sweep = [3.0, 5.5, 6.2, 7.5, 9.1, 8.6, 9.0, 8.4, 7.9, 5.4, 4.9];
    for zoom in sweep {
        let changed = state.update(zoom);
        println!("zoom {:>4.1} -> {}", zoom, state.current().to_string().cyan());
        if changed.is_some() || (last.is_none() && !scheduler.is_busy()) {
            scheduler.request(Rc::clone(&points), state.current());
        }
        // one phase per frame
        match scheduler.tick(&mut engine) {
            TickOutcome::Applied(cells) => last = Some(cells),
            TickOutcome::Discarded(token) => {
                println!("  {} rebuild {}", "dropped".yellow(), token.value())
            }
            TickOutcome::Progressed | TickOutcome::Idle => {}
        }
    }
    if let Some(cells) = scheduler.run_to_completion(&mut engine) {
        last = Some(cells);
    }

    let cells = match last {
        Some(cells) => cells,
        None => return Ok(()),
    };
    println!(
        "{} {} cells at {} ({} points binned, {} skipped, cap hit: {})",
        "built".bold(),
        cells.cells.len(),
        cells.resolution,
        cells.stats.binned_points,
        cells.stats.skipped,
        cells.cap_hit
    );

    for tier in Tier::ALL.iter().rev() {
        let n = cells.cells.iter().filter(|c| c.count > 0 && c.tier == *tier).count();
        let bar = "#".repeat((n as f64).sqrt().ceil() as usize);
        println!("  {:<12} {:>6} {}", tier.as_str(), n, paint(*tier, bar));
    }

    let mut top: Vec<_> = cells.cells.iter().filter(|c| !c.suppressed).collect();
    top.sort_by(|a, b| b.weighted_estimate.total_cmp(&a.weighted_estimate));
    for cell in top.iter().take(10) {
        let line = format!(
            "{:<28} count {:>4}  est {:>8.0}  level {:>3}  score {:.2}  {}",
            cell.id.key(),
            cell.count,
            cell.weighted_estimate,
            cell.level,
            cell.score,
            cell.tier.as_str()
        );
        println!("  {}", paint(cell.tier, line));
    }

    if let Some(path) = output {
        write_feature_collection(&cells, &path)?;
        println!("{} {}", "wrote".bold(), path.display());
    }
    Ok(())
}
