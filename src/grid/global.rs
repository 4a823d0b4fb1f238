// Global-index binning: points map straight to H3 cells

use super::CellBinner;
use crate::cell_id::CellId;
use crate::hex_geometry::{round_coord, Ring};
use crate::poi::GeoPoint;
use crate::resolution::Resolution;
use h3o::{CellIndex, LatLng};

pub struct GlobalIndexBinner {
    resolution: Resolution,
    h3_resolution: h3o::Resolution,
}

impl GlobalIndexBinner {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            h3_resolution: resolution.profile().h3_resolution,
        }
    }

    pub fn h3_resolution(&self) -> h3o::Resolution {
        self.h3_resolution
    }
}

fn to_geo(latlng: &LatLng) -> GeoPoint {
    GeoPoint::new(latlng.lng_radians().to_degrees(), latlng.lat_radians().to_degrees())
}

impl CellBinner for GlobalIndexBinner {
    type Key = CellIndex;

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn home_cell(&self, point: &GeoPoint) -> Option<CellIndex> {
        LatLng::new(point.latitude, point.longitude)
            .ok()
            .map(|latlng| latlng.to_cell(self.h3_resolution))
    }

    fn cell_id(&self, cell: CellIndex) -> CellId {
        CellId::global(self.resolution, cell)
    }

    fn center(&self, cell: CellIndex) -> GeoPoint {
        to_geo(&LatLng::from(cell))
    }

    fn ring(&self, cell: CellIndex) -> Ring {
        let mut ring: Ring = cell
            .boundary()
            .iter()
            .map(|latlng| {
                let p = to_geo(latlng);
                GeoPoint::new(round_coord(p.longitude), round_coord(p.latitude))
            })
            .collect();
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        ring
    }

    fn neighbors(&self, cell: CellIndex) -> Vec<CellIndex> {
        cell.grid_disk::<Vec<_>>(1)
            .into_iter()
            .filter(|&neighbor| neighbor != cell)
            .collect()
    }

    fn area_km2(&self, cell: CellIndex) -> f64 {
        let area = cell.area_km2();
        if area.is_finite() && area > 0.0 {
            area
        } else {
            self.resolution.profile().fallback_area_km2
        }
    }
}
