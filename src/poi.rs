// src/poi.rs - Points of interest, their categories and category weights

use crate::constants::MAX_MERCATOR_LAT;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Finite and inside the range the mercator transform handles
    pub fn is_projectable(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.longitude.abs() <= 180.0
            && self.latitude.abs() <= MAX_MERCATOR_LAT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoiKind {
    Synagogue,
    CommunityCenter,
    KosherFood,
    Mikvah,
    School,
    Camp,
    Unknown,
}

impl PoiKind {
    /// Every category that takes part in aggregation
    pub const RECOGNIZED: [PoiKind; 6] = [
        PoiKind::Synagogue,
        PoiKind::CommunityCenter,
        PoiKind::KosherFood,
        PoiKind::Mikvah,
        PoiKind::School,
        PoiKind::Camp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoiKind::Synagogue => "synagogue",
            PoiKind::CommunityCenter => "community-center",
            PoiKind::KosherFood => "kosher-food",
            PoiKind::Mikvah => "mikvah",
            PoiKind::School => "school",
            PoiKind::Camp => "camp",
            PoiKind::Unknown => "unknown",
        }
    }

    /// Map a raw upstream tag onto the closed category set
    ///
    /// Matching ignores case and treats `_`, `-` and spaces alike. Anything not
    /// recognized becomes `Unknown`.
    pub fn normalize(raw: &str) -> PoiKind {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match key.as_str() {
            "synagogue" | "place-of-worship" | "shul" => PoiKind::Synagogue,
            "jcc" | "community-center" | "community-centre" => PoiKind::CommunityCenter,
            "kosher" | "kosher-food" | "retail-food" => PoiKind::KosherFood,
            "mikvah" | "mikveh" | "ritual-bath" => PoiKind::Mikvah,
            "school" | "day-school" | "yeshiva" => PoiKind::School,
            "camp" | "summer-camp" => PoiKind::Camp,
            _ => PoiKind::Unknown,
        }
    }

    pub fn is_recognized(&self) -> bool {
        *self != PoiKind::Unknown
    }

    /// Fixed per-category weight used for the weighted estimate
    pub fn weight(&self) -> f64 {
        KIND_WEIGHTS.get(self).copied().unwrap_or(0.0)
    }
}

pub static KIND_WEIGHTS: Lazy<HashMap<PoiKind, f64>> = Lazy::new(|| {
    use PoiKind::*;
    let mut m = HashMap::new();

    m.insert(Synagogue, 250.0);
    m.insert(CommunityCenter, 300.0);
    m.insert(KosherFood, 100.0);
    m.insert(Mikvah, 150.0);
    m.insert(School, 200.0);
    m.insert(Camp, 120.0);
    m.insert(Unknown, 0.0);

    m
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub position: GeoPoint,
    pub kind: PoiKind,
}

impl PointOfInterest {
    pub fn new(longitude: f64, latitude: f64, kind: PoiKind) -> Self {
        Self {
            position: GeoPoint::new(longitude, latitude),
            kind,
        }
    }

    /// Recognized category and a position the projection can handle
    pub fn is_aggregatable(&self) -> bool {
        self.kind.is_recognized() && self.position.is_projectable()
    }
}

/// Read points from a GeoJSON FeatureCollection
///
/// Each feature needs a `Point` geometry and a `kind` property. Features with
/// other geometry, missing coordinates or an unknown kind are skipped.
/// Duplicates are dropped by `osm_id` when present, otherwise by kind plus the
/// coordinate rounded to 5 decimals.
pub fn points_from_geojson(json: &Value) -> Vec<PointOfInterest> {
    let features = match json.get("features").and_then(|f| f.as_array()) {
        Some(features) => features,
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut points = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for feature in features {
        let props = feature.get("properties");
        let kind = props
            .and_then(|p| p.get("kind"))
            .and_then(|k| k.as_str())
            .map(PoiKind::normalize)
            .unwrap_or(PoiKind::Unknown);

        let coords = feature
            .get("geometry")
            .filter(|g| g.get("type").and_then(|t| t.as_str()) == Some("Point"))
            .and_then(|g| g.get("coordinates"))
            .and_then(|c| c.as_array())
            .and_then(|c| Some((c.first()?.as_f64()?, c.get(1)?.as_f64()?)));

        let (lon, lat) = match coords {
            Some(c) if kind.is_recognized() => c,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let osm_id = props
            .and_then(|p| p.get("osm_id"))
            .and_then(|id| id.as_str())
            .unwrap_or("");
        let key = if osm_id.is_empty() {
            format!("{}:{:.5}:{:.5}", kind.as_str(), lon, lat)
        } else {
            osm_id.to_string()
        };
        if !seen.insert(key) {
            skipped += 1;
            continue;
        }

        points.push(PointOfInterest::new(lon, lat, kind));
    }

    debug!(loaded = points.len(), skipped, "read points from GeoJSON");
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_raw_tags() {
        assert_eq!(PoiKind::normalize("Synagogue"), PoiKind::Synagogue);
        assert_eq!(PoiKind::normalize("jcc"), PoiKind::CommunityCenter);
        assert_eq!(PoiKind::normalize("kosher"), PoiKind::KosherFood);
        assert_eq!(PoiKind::normalize("ritual_bath"), PoiKind::Mikvah);
        assert_eq!(PoiKind::normalize(" Summer Camp "), PoiKind::Camp);
        assert_eq!(PoiKind::normalize("bakery"), PoiKind::Unknown);
        assert_eq!(PoiKind::normalize(""), PoiKind::Unknown);
    }

    #[test]
    fn test_weights_cover_recognized_kinds() {
        for kind in PoiKind::RECOGNIZED {
            assert!(kind.weight() > 0.0, "{} has no weight", kind.as_str());
        }
        assert_eq!(PoiKind::Synagogue.weight(), 250.0);
        assert_eq!(PoiKind::Unknown.weight(), 0.0);
    }

    #[test]
    fn test_projectable_rejects_bad_coordinates() {
        assert!(GeoPoint::new(-73.9, 40.7).is_projectable());
        assert!(!GeoPoint::new(f64::NAN, 40.7).is_projectable());
        assert!(!GeoPoint::new(-73.9, f64::INFINITY).is_projectable());
        assert!(!GeoPoint::new(-73.9, 89.0).is_projectable());
        assert!(!GeoPoint::new(190.0, 10.0).is_projectable());
    }

    #[test]
    fn test_points_from_geojson_filters_and_dedupes() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-73.95, 40.65] },
                  "properties": { "kind": "synagogue", "osm_id": "node/1" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-73.95, 40.65] },
                  "properties": { "kind": "synagogue", "osm_id": "node/1" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-73.90, 40.70] },
                  "properties": { "kind": "kosher" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-73.90, 40.70] },
                  "properties": { "kind": "kosher" } },
                { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                  "properties": { "kind": "school" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-73.80, 40.60] },
                  "properties": { "kind": "laundromat" } }
            ]
        });

        let points = points_from_geojson(&fc);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].kind, PoiKind::Synagogue);
        assert_eq!(points[1].kind, PoiKind::KosherFood);
    }

    #[test]
    fn test_points_from_geojson_without_features() {
        assert!(points_from_geojson(&json!({ "type": "Point" })).is_empty());
    }
}
