/// Grid aggregation: binning points into hexagonal cells
///
/// Two interchangeable schemes implement [`CellBinner`]: the local offset
/// lattice (`offset`) and the global hierarchical index (`global`). The
/// accumulation, masking, capping and halo logic below is written once and is
/// generic over the scheme's key type.

pub mod global;
pub mod offset;

pub use global::GlobalIndexBinner;
pub use offset::OffsetGridBinner;

use crate::cell_id::CellId;
use crate::constants::HALO_FRACTION;
use crate::hex_geometry::Ring;
use crate::poi::{GeoPoint, PoiKind, PointOfInterest};
use crate::polygon::LandMask;
use crate::resolution::Resolution;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Which indexing scheme a resolution bins with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinningScheme {
    OffsetGrid,
    GlobalIndex,
}

/// One indexing scheme at one resolution
pub trait CellBinner {
    type Key: Copy + Eq + Hash;

    fn resolution(&self) -> Resolution;

    /// Home cell of a point, `None` when the scheme cannot place it
    fn home_cell(&self, point: &GeoPoint) -> Option<Self::Key>;

    fn cell_id(&self, key: Self::Key) -> CellId;

    fn center(&self, key: Self::Key) -> GeoPoint;

    /// Closed polygon ring with rounded, shared vertices
    fn ring(&self, key: Self::Key) -> Ring;

    /// Topologically adjacent cells
    fn neighbors(&self, key: Self::Key) -> Vec<Self::Key>;

    /// Nominal cell area in km²
    fn area_km2(&self, key: Self::Key) -> f64;
}

/// Per-cell accumulation before scoring
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedCell {
    pub id: CellId,
    pub center: GeoPoint,
    pub area_km2: f64,
    /// Points whose home cell this is
    pub count: u32,
    pub counts_by_kind: BTreeMap<PoiKind, u32>,
    /// Sum of category weights over the home points
    pub weighted_estimate: f64,
    /// Spillover from adjacent cells
    pub halo: f64,
}

impl BinnedCell {
    fn empty(id: CellId, center: GeoPoint, area_km2: f64) -> Self {
        Self {
            id,
            center,
            area_km2,
            count: 0,
            counts_by_kind: BTreeMap::new(),
            weighted_estimate: 0.0,
            halo: 0.0,
        }
    }

    fn add(&mut self, kind: PoiKind) {
        self.count += 1;
        *self.counts_by_kind.entry(kind).or_insert(0) += 1;
        self.weighted_estimate += kind.weight();
    }

    /// Weighted estimate including halo spillover
    pub fn total_estimate(&self) -> f64 {
        self.weighted_estimate + self.halo
    }
}

/// Output of one binning pass
#[derive(Debug, Clone, Default)]
pub struct BinnedCells {
    pub cells: Vec<BinnedCell>,
    /// Points that landed in a home cell
    pub binned_points: usize,
    /// Malformed, non-finite or unknown-category records
    pub skipped: usize,
    /// Points outside the land mask or in a cell centered off the mask
    pub masked_out: usize,
    /// Points dropped because their cell would have exceeded the cap
    pub capped_points: usize,
    pub cap_hit: bool,
}

/// Options of one binning pass
#[derive(Debug, Clone, Copy)]
pub struct BinOptions<'a> {
    pub land_mask: Option<&'a LandMask>,
    pub cell_cap: usize,
    pub halo: bool,
    /// Cells with fewer home points than this spread no halo
    pub halo_min_count: u32,
}

struct Accumulator<'b, B: CellBinner> {
    binner: &'b B,
    land_mask: Option<&'b LandMask>,
    cell_cap: usize,
    slots: HashMap<B::Key, usize>,
    on_land: HashMap<B::Key, bool>,
    keys: Vec<B::Key>,
    out: BinnedCells,
}

impl<'b, B: CellBinner> Accumulator<'b, B> {
    fn center_on_land(&mut self, key: B::Key) -> bool {
        let mask = match self.land_mask {
            Some(mask) => mask,
            None => return true,
        };
        let binner = self.binner;
        *self
            .on_land
            .entry(key)
            .or_insert_with(|| mask.contains(&binner.center(key)))
    }

    /// Slot of `key`, creating the cell if the cap allows
    fn slot(&mut self, key: B::Key) -> Option<usize> {
        if let Some(&slot) = self.slots.get(&key) {
            return Some(slot);
        }
        if self.out.cells.len() >= self.cell_cap {
            self.out.cap_hit = true;
            return None;
        }
        let slot = self.out.cells.len();
        self.out.cells.push(BinnedCell::empty(
            self.binner.cell_id(key),
            self.binner.center(key),
            self.binner.area_km2(key),
        ));
        self.keys.push(key);
        self.slots.insert(key, slot);
        Some(slot)
    }
}

/// Polygon of any cell identity, built by the scheme that produced it
pub fn ring_for(id: &CellId) -> Ring {
    match *id {
        CellId::OffsetGrid {
            resolution,
            row,
            col,
        } => OffsetGridBinner::new(resolution).ring((row, col)),
        CellId::GlobalIndex { resolution, cell } => {
            GlobalIndexBinner::new(resolution).ring(cell)
        }
    }
}

/// Bin a point set with any scheme
///
/// `seed` cells are emitted first even when empty (land-masked lattice scan).
/// Every accepted point adds to exactly one home cell. Once `cell_cap` cells
/// exist no new cell is opened: points whose home cell is missing are dropped
/// and `cap_hit` is raised.
pub fn bin_points<B: CellBinner>(
    binner: &B,
    points: &[PointOfInterest],
    seed: &[B::Key],
    options: BinOptions<'_>,
) -> BinnedCells {
    let mut acc = Accumulator {
        binner,
        land_mask: options.land_mask,
        cell_cap: options.cell_cap,
        slots: HashMap::new(),
        on_land: HashMap::new(),
        keys: Vec::new(),
        out: BinnedCells::default(),
    };

    for &key in seed {
        if acc.center_on_land(key) && acc.slot(key).is_none() {
            break;
        }
    }

    for point in points {
        if !point.is_aggregatable() {
            acc.out.skipped += 1;
            continue;
        }
        if let Some(mask) = options.land_mask {
            if !mask.contains(&point.position) {
                acc.out.masked_out += 1;
                continue;
            }
        }
        let key = match binner.home_cell(&point.position) {
            Some(key) => key,
            None => {
                acc.out.skipped += 1;
                continue;
            }
        };
        if !acc.center_on_land(key) {
            acc.out.masked_out += 1;
            continue;
        }
        match acc.slot(key) {
            Some(slot) => {
                acc.out.cells[slot].add(point.kind);
                acc.out.binned_points += 1;
            }
            None => acc.out.capped_points += 1,
        }
    }

    if options.halo {
        spread_halo(&mut acc, options.halo_min_count);
    }

    acc.out
}

/// Spread `HALO_FRACTION` of each source cell's estimate into its neighbors
///
/// Only cells holding at least `min_count` home points are sources, so a
/// suppressed cell never shows through its neighbors. A neighbor reached from
/// several sources keeps the largest contribution. Cells created here have
/// count 0.
fn spread_halo<B: CellBinner>(acc: &mut Accumulator<'_, B>, min_count: u32) {
    let sources: Vec<(B::Key, f64)> = acc
        .keys
        .iter()
        .zip(acc.out.cells.iter())
        .filter(|(_, cell)| cell.count >= min_count && cell.weighted_estimate > 0.0)
        .map(|(&key, cell)| (key, cell.weighted_estimate * HALO_FRACTION))
        .collect();

    for (key, contribution) in sources {
        for neighbor in acc.binner.neighbors(key) {
            if !acc.center_on_land(neighbor) {
                continue;
            }
            if let Some(slot) = acc.slot(neighbor) {
                let cell = &mut acc.out.cells[slot];
                cell.halo = cell.halo.max(contribution);
            }
        }
    }
}
