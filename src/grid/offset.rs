// Offset-lattice binning: row/col over the mercator plane

use super::CellBinner;
use crate::cell_id::CellId;
use crate::constants::MAX_MERCATOR_LAT;
use crate::hex_geometry::{hex_area_km2, point_to_plane, HexLattice, Ring};
use crate::poi::GeoPoint;
use crate::polygon::{ring_contains, LandMask};
use crate::projection::{to_plane, to_sphere};
use crate::resolution::Resolution;
use tracing::debug;

pub struct OffsetGridBinner {
    resolution: Resolution,
    lattice: HexLattice,
}

impl OffsetGridBinner {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            lattice: HexLattice::new(resolution.profile().radius_m),
        }
    }

    pub fn lattice(&self) -> &HexLattice {
        &self.lattice
    }

    /// Every lattice cell whose center lies inside the land mask
    ///
    /// Scans the mask's bounding box row by row and stops once `cell_cap`
    /// cells are collected; the flag reports whether the scan was cut short.
    pub fn lattice_scan(&self, mask: &LandMask, cell_cap: usize) -> (Vec<(i64, i64)>, bool) {
        let bbox = mask.bbox();
        if bbox.is_empty() {
            return (Vec::new(), false);
        }

        let south = bbox.south.max(-MAX_MERCATOR_LAT);
        let north = bbox.north.min(MAX_MERCATOR_LAT);
        let min = to_plane(bbox.west, south);
        let max = to_plane(bbox.east, north);
        let step = self.lattice.step;

        let row_lo = (min.y / step.step_y).floor() as i64 - 1;
        let row_hi = (max.y / step.step_y).ceil() as i64 + 1;
        let col_lo = (min.x / step.step_x).floor() as i64 - 1;
        let col_hi = (max.x / step.step_x).ceil() as i64 + 1;

        let mut cells = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let (lon, lat) = to_sphere(self.lattice.center(row, col));
                if !mask.contains(&GeoPoint::new(lon, lat)) {
                    continue;
                }
                if cells.len() >= cell_cap {
                    debug!(resolution = %self.resolution, cell_cap, "lattice scan reached cell cap");
                    return (cells, true);
                }
                cells.push((row, col));
            }
        }
        (cells, false)
    }
}

impl CellBinner for OffsetGridBinner {
    type Key = (i64, i64);

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn home_cell(&self, point: &GeoPoint) -> Option<Self::Key> {
        if !point.is_projectable() {
            return None;
        }
        let (row, col) = self.lattice.cell_of(point_to_plane(point));
        if ring_contains(&self.lattice.ring(row, col), point) {
            return Some((row, col));
        }
        // rings have straight lon/lat edges, the plane lattice does not
        let containing = self
            .lattice
            .neighbors(row, col)
            .into_iter()
            .find(|&(r, c)| ring_contains(&self.lattice.ring(r, c), point));
        Some(containing.unwrap_or((row, col)))
    }

    fn cell_id(&self, (row, col): Self::Key) -> CellId {
        CellId::offset(self.resolution, row, col)
    }

    fn center(&self, (row, col): Self::Key) -> GeoPoint {
        let (lon, lat) = to_sphere(self.lattice.center(row, col));
        GeoPoint::new(lon, lat)
    }

    fn ring(&self, (row, col): Self::Key) -> Ring {
        self.lattice.ring(row, col)
    }

    fn neighbors(&self, (row, col): Self::Key) -> Vec<Self::Key> {
        self.lattice.neighbors(row, col).to_vec()
    }

    fn area_km2(&self, _key: Self::Key) -> f64 {
        hex_area_km2(self.lattice.radius_m)
    }
}
