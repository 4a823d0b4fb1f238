/// Point-in-polygon containment
///
/// Even-odd ray casting against single rings, polygons with holes and
/// multi-polygons. Every shape carries its bounding box so the hot path can
/// reject a point before walking any ring.

use crate::error::{PresenceError, Result};
use crate::poi::GeoPoint;
use serde::Serialize;
use serde_json::Value;

/// Axis-aligned lon/lat box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            west: f64::INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            north: f64::NEG_INFINITY,
        }
    }

    pub fn of_points(points: &[GeoPoint]) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.extend(p);
        }
        bbox
    }

    pub fn extend(&mut self, p: &GeoPoint) {
        self.west = self.west.min(p.longitude);
        self.east = self.east.max(p.longitude);
        self.south = self.south.min(p.latitude);
        self.north = self.north.max(p.latitude);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.longitude >= self.west
            && p.longitude <= self.east
            && p.latitude >= self.south
            && p.latitude <= self.north
    }

    pub fn is_empty(&self) -> bool {
        self.west > self.east || self.south > self.north
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Number of distinct vertices, ignoring a repeated closing vertex
fn effective_len(ring: &[GeoPoint]) -> usize {
    match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && last == &rest[0] => rest.len(),
        _ => ring.len(),
    }
}

/// Even-odd ray casting against one ring (open or closed)
pub fn ring_contains(ring: &[GeoPoint], point: &GeoPoint) -> bool {
    let n = effective_len(ring);
    if n < 3 {
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Outer ring plus zero or more holes
#[derive(Debug, Clone)]
pub struct Polygon {
    pub exterior: Vec<GeoPoint>,
    pub holes: Vec<Vec<GeoPoint>>,
    bbox: BoundingBox,
}

impl Polygon {
    pub fn new(exterior: Vec<GeoPoint>, holes: Vec<Vec<GeoPoint>>) -> Self {
        let bbox = BoundingBox::of_points(&exterior);
        Self { exterior, holes, bbox }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bbox.contains(point)
            && ring_contains(&self.exterior, point)
            && !self.holes.iter().any(|hole| ring_contains(hole, point))
    }
}

/// Land mask: one or more polygons, a point is on land if any part holds it
#[derive(Debug, Clone)]
pub struct LandMask {
    parts: Vec<Polygon>,
    bbox: BoundingBox,
}

impl LandMask {
    pub fn new(parts: Vec<Polygon>) -> Self {
        let bbox = parts
            .iter()
            .fold(BoundingBox::empty(), |acc, part| acc.union(part.bbox()));
        Self { parts, bbox }
    }

    pub fn from_polygon(polygon: Polygon) -> Self {
        Self::new(vec![polygon])
    }

    pub fn parts(&self) -> &[Polygon] {
        &self.parts
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bbox.contains(point) && self.parts.iter().any(|part| part.contains(point))
    }

    /// Build a mask from GeoJSON: Polygon, MultiPolygon, Feature or FeatureCollection
    pub fn from_geojson(json: &Value) -> Result<Self> {
        let mut parts = Vec::new();
        collect_geojson_polygons(json, &mut parts)?;
        if parts.is_empty() {
            return Err(PresenceError::InvalidGeometry(
                "land mask contains no polygons".to_string(),
            ));
        }
        Ok(Self::new(parts))
    }

    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_geojson(&json)
    }
}

fn collect_geojson_polygons(json: &Value, parts: &mut Vec<Polygon>) -> Result<()> {
    let kind = json
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| PresenceError::InvalidGeometry("missing GeoJSON type".to_string()))?;

    match kind {
        "FeatureCollection" => {
            let features = json
                .get("features")
                .and_then(|f| f.as_array())
                .ok_or_else(|| PresenceError::InvalidGeometry("FeatureCollection without features".to_string()))?;
            for feature in features {
                collect_geojson_polygons(feature, parts)?;
            }
        }
        "Feature" => match json.get("geometry") {
            Some(geometry) if !geometry.is_null() => collect_geojson_polygons(geometry, parts)?,
            _ => {}
        },
        "Polygon" => {
            let coords = json.get("coordinates").ok_or_else(missing_coordinates)?;
            parts.push(parse_polygon(coords)?);
        }
        "MultiPolygon" => {
            let polygons = json
                .get("coordinates")
                .and_then(|c| c.as_array())
                .ok_or_else(missing_coordinates)?;
            for coords in polygons {
                parts.push(parse_polygon(coords)?);
            }
        }
        other => {
            return Err(PresenceError::InvalidGeometry(format!(
                "land mask geometry must be polygonal, found {}",
                other
            )));
        }
    }
    Ok(())
}

fn missing_coordinates() -> PresenceError {
    PresenceError::InvalidGeometry("geometry without coordinates".to_string())
}

fn parse_polygon(coords: &Value) -> Result<Polygon> {
    let rings = coords.as_array().ok_or_else(missing_coordinates)?;
    let mut parsed = rings.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        return Err(missing_coordinates());
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

fn parse_ring(ring: &Value) -> Result<Vec<GeoPoint>> {
    let positions = ring.as_array().ok_or_else(missing_coordinates)?;
    positions
        .iter()
        .map(|pos| {
            let lon = pos.get(0).and_then(|v| v.as_f64());
            let lat = pos.get(1).and_then(|v| v.as_f64());
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(GeoPoint::new(lon, lat)),
                _ => Err(PresenceError::InvalidGeometry(format!("bad position {}", pos))),
            }
        })
        .collect()
}
