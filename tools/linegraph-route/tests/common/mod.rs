#![allow(dead_code)]

use linegraph_common::Coordinate;
use linegraph_route::{FeatureCollection, PathFinderOptions, Topology, Weight};
use serde_json::{json, Value};
use std::sync::Arc;

/// One LineString feature
pub fn line(points: &[(f64, f64)], properties: Value) -> Value {
    let coordinates: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "LineString", "coordinates": coordinates},
    })
}

pub fn collection(features: Vec<Value>) -> FeatureCollection {
    let json = json!({"type": "FeatureCollection", "features": features});
    FeatureCollection::from_json(&json.to_string()).unwrap()
}

/// Weight taken from the `w` property (default 1), one-way when `oneway` is set
pub fn property_weights() -> PathFinderOptions {
    PathFinderOptions::default().with_weight_fn(Arc::new(|_: Coordinate, _: Coordinate, properties: &Value| {
        let w = properties.get("w").and_then(Value::as_f64).unwrap_or(1.0);
        if properties.get("oneway").and_then(Value::as_bool).unwrap_or(false) {
            Weight::Directional {
                forward: Some(w),
                backward: None,
            }
        } else {
            Weight::Symmetric(w)
        }
    }))
}

pub fn topology(features: Vec<Value>, options: &PathFinderOptions) -> Topology {
    Topology::from_geojson(&collection(features), options).unwrap()
}

pub fn c(x: f64, y: f64) -> Coordinate {
    Coordinate::new(x, y)
}
