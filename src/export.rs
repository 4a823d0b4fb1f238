/// GeoJSON export of an aggregated cell set
///
/// One polygon feature per non-empty cell, tagged with tier, count, level,
/// resolution and bounding box. Suppressed cells carry no category breakdown.

use crate::error::Result;
use crate::presence::AggregatedCells;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

pub fn feature_collection(cells: &AggregatedCells) -> Value {
    let features: Vec<Value> = cells
        .cells
        .iter()
        .filter(|cell| cell.count > 0)
        .map(|cell| {
            let ring: Vec<[f64; 2]> = cell
                .polygon
                .iter()
                .map(|p| [p.longitude, p.latitude])
                .collect();

            let mut properties = Map::new();
            properties.insert("id".into(), json!(cell.id.key()));
            properties.insert("tier".into(), json!(cell.tier.as_str()));
            properties.insert("count".into(), json!(cell.count));
            properties.insert("level".into(), json!(cell.level));
            properties.insert("resolution".into(), json!(cells.resolution.as_str()));
            properties.insert("bbox".into(), json!(cell.bbox.as_array()));
            if !cell.suppressed {
                let by_kind: Map<String, Value> = cell
                    .summary
                    .counts_by_kind
                    .iter()
                    .map(|(kind, n)| (kind.as_str().to_string(), json!(n)))
                    .collect();
                properties.insert("categories".into(), Value::Object(by_kind));
            }

            json!({
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [ring] },
                "properties": properties,
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn write_feature_collection(cells: &AggregatedCells, path: &Path) -> Result<()> {
    let text = serde_json::to_string(&feature_collection(cells))?;
    fs::write(path, text)?;
    Ok(())
}
