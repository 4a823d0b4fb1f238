/// Hexagon rings and offset-lattice spacing
///
/// Hexagons are pointy-side-up in the projected plane: vertices at
/// `30° + 60°·k`, rows spaced `1.5·r` apart and odd rows shifted by half a
/// column. Radius and step always come from the same constant so neighbors tile
/// with no gap or overlap.

use crate::constants::{HEX_COVERAGE, RING_DECIMALS};
use crate::poi::GeoPoint;
use crate::projection::{to_plane, to_sphere};
use glam::DVec2;

/// Closed ring of `(lon, lat)` vertices; first vertex repeated at the end
pub type Ring = Vec<GeoPoint>;

/// Lattice spacing for one hexagon radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStep {
    pub step_x: f64,
    pub step_y: f64,
    /// Horizontal shift applied to odd rows
    pub offset_x: f64,
}

pub fn grid_step(radius_m: f64) -> GridStep {
    let step_x = 3f64.sqrt() * radius_m;
    GridStep {
        step_x,
        step_y: 1.5 * radius_m,
        offset_x: step_x / 2.0,
    }
}

/// Round a coordinate to the shared-vertex precision
pub fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(RING_DECIMALS);
    (value * scale).round() / scale
}

fn rounded_point(plane: DVec2) -> GeoPoint {
    let (lon, lat) = to_sphere(plane);
    GeoPoint::new(round_coord(lon), round_coord(lat))
}

/// Six vertices at exactly `radius_m` around a projected center, closed
pub fn hex_ring(center: DVec2, radius_m: f64) -> Ring {
    let r = radius_m * HEX_COVERAGE;
    let mut ring: Ring = (0..6)
        .map(|k| {
            let angle = (30.0 + 60.0 * k as f64).to_radians();
            rounded_point(center + DVec2::new(r * angle.cos(), r * angle.sin()))
        })
        .collect();
    ring.push(ring[0]);
    ring
}

// Vertex offsets in half-column (x) and half-radius (y) units, same order as hex_ring
const VERTEX_UNITS: [(i64, i64); 6] = [(1, 1), (0, 2), (-1, 1), (-1, -1), (0, -2), (1, -1)];

/// Offset-lattice hexagon geometry for one radius
///
/// Every vertex is computed from integer lattice units, so a corner shared by
/// two or three cells is produced by the same arithmetic no matter which cell
/// asks for it.
#[derive(Debug, Clone, Copy)]
pub struct HexLattice {
    pub radius_m: f64,
    pub step: GridStep,
}

impl HexLattice {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            step: grid_step(radius_m),
        }
    }

    fn row_offset(&self, row: i64) -> f64 {
        if row.rem_euclid(2) == 1 { self.step.offset_x } else { 0.0 }
    }

    pub fn center(&self, row: i64, col: i64) -> DVec2 {
        DVec2::new(
            col as f64 * self.step.step_x + self.row_offset(row),
            row as f64 * self.step.step_y,
        )
    }

    /// Home cell of a projected point: the lattice center nearest to it
    ///
    /// Starts from `row = round(y / step_y)` and also checks the rows above and
    /// below, since near a slanted edge the nearest center can sit one row away.
    pub fn cell_of(&self, plane: DVec2) -> (i64, i64) {
        let guess = (plane.y / self.step.step_y).round() as i64;
        let mut best = (guess, 0i64);
        let mut best_dist = f64::INFINITY;

        for row in [guess, guess - 1, guess + 1] {
            let col = ((plane.x - self.row_offset(row)) / self.step.step_x).round() as i64;
            let dist = self.center(row, col).distance_squared(plane);
            if dist < best_dist {
                best_dist = dist;
                best = (row, col);
            }
        }
        best
    }

    /// Closed hexagon ring for `(row, col)`
    pub fn ring(&self, row: i64, col: i64) -> Ring {
        let half_x = self.step.offset_x;
        let half_r = self.radius_m * HEX_COVERAGE / 2.0;
        let cx = 2 * col + row.rem_euclid(2);
        let cy = 3 * row;

        let mut ring: Ring = VERTEX_UNITS
            .iter()
            .map(|&(dx, dy)| {
                let plane = DVec2::new((cx + dx) as f64 * half_x, (cy + dy) as f64 * half_r);
                rounded_point(plane)
            })
            .collect();
        ring.push(ring[0]);
        ring
    }

    /// Lattice coordinates of the six neighbors of `(row, col)`
    pub fn neighbors(&self, row: i64, col: i64) -> [(i64, i64); 6] {
        let shift = row.rem_euclid(2);
        [
            (row, col - 1),
            (row, col + 1),
            (row - 1, col - 1 + shift),
            (row - 1, col + shift),
            (row + 1, col - 1 + shift),
            (row + 1, col + shift),
        ]
    }
}

/// Geographic center of a closed ring (vertex mean, closing vertex excluded)
pub fn ring_center(ring: &[GeoPoint]) -> Option<GeoPoint> {
    let open = match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && last == &rest[0] => rest,
        _ => ring,
    };
    if open.is_empty() {
        return None;
    }
    let n = open.len() as f64;
    let lon = open.iter().map(|p| p.longitude).sum::<f64>() / n;
    let lat = open.iter().map(|p| p.latitude).sum::<f64>() / n;
    Some(GeoPoint::new(lon, lat))
}

/// Nominal planar area of a hexagon with this radius, in km²
pub fn hex_area_km2(radius_m: f64) -> f64 {
    1.5 * 3f64.sqrt() * radius_m * radius_m / 1.0e6
}

pub fn point_to_plane(point: &GeoPoint) -> DVec2 {
    to_plane(point.longitude, point.latitude)
}
