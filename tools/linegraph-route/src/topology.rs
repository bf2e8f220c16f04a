//! Vertex/edge topology extraction from GeoJSON line networks
//!
//! Every coordinate of every `LineString` becomes a vertex keyed by its rounded
//! coordinate. Consecutive coordinates become an edge carrying the properties
//! of the feature they came from. Features of any other geometry type are
//! ignored.

use linegraph_common::{Coordinate, CoordinateKeyer, Error, Result, VertexKey};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::config::{Phase, PathFinderOptions};

/// Feature properties as found in the input network
pub type Properties = serde_json::Value;

/// A GeoJSON position; elevation and further members are ignored
pub type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    #[serde(other)]
    Other,
}

impl FeatureCollection {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Line geometries of the collection with their feature properties
    fn lines(&self) -> impl Iterator<Item = (&[Position], &Properties)> + '_ {
        self.features.iter().flat_map(|feature| {
            let parts: Vec<&[Position]> = match &feature.geometry {
                Some(Geometry::LineString { coordinates }) => vec![coordinates.as_slice()],
                Some(Geometry::MultiLineString { coordinates }) => {
                    coordinates.iter().map(Vec::as_slice).collect()
                }
                Some(Geometry::Other) | None => Vec::new(),
            };
            parts.into_iter().map(move |part| (part, &feature.properties))
        })
    }
}

fn to_coordinate(position: &[f64]) -> Result<Coordinate> {
    match position {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(Coordinate::new(*lng, *lat)),
        _ => Err(Error::InvalidInput(format!(
            "position {position:?} is not a finite [lng, lat] pair"
        ))),
    }
}

/// A directed raw edge between two consecutive line coordinates
#[derive(Clone, Debug)]
pub struct TopologyEdge {
    pub from: VertexKey,
    pub to: VertexKey,
    pub properties: Arc<Properties>,
}

/// Raw vertex catalogue plus edge list
#[derive(Clone, Debug, Default)]
pub struct Topology {
    pub vertices: FxHashMap<VertexKey, Coordinate>,
    pub edges: Vec<TopologyEdge>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the topology of every line feature in `collection`
    pub fn from_geojson(collection: &FeatureCollection, options: &PathFinderOptions) -> Result<Self> {
        options.validate()?;
        let keyer = options.keyer();
        let mut topology = Self::new();

        let lines = collection
            .lines()
            .map(|(line, properties)| {
                let coordinates = line
                    .iter()
                    .map(|p| to_coordinate(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok::<_, Error>((coordinates, properties))
            })
            .collect::<Result<Vec<_>>>()?;
        let total = lines.len();

        for (i, (coordinates, _)) in lines.iter().enumerate() {
            for &c in coordinates {
                topology.vertices.entry(keyer.key(c)).or_insert(c);
            }
            options.report(Phase::TopologyVertices, i, total);
        }

        for (i, (coordinates, properties)) in lines.into_iter().enumerate() {
            topology.add_line(&coordinates, properties.clone(), &keyer);
            options.report(Phase::TopologyEdges, i, total);
        }

        tracing::info!(
            vertices = topology.vertices.len(),
            edges = topology.edges.len(),
            "extracted topology"
        );

        Ok(topology)
    }

    /// Add one polyline; the first coordinate seen for a key is kept
    pub fn add_line(&mut self, coordinates: &[Coordinate], properties: Properties, keyer: &CoordinateKeyer) {
        let properties = Arc::new(properties);
        let mut prev: Option<VertexKey> = None;

        for &c in coordinates {
            let key = keyer.key(c);
            self.vertices.entry(key.clone()).or_insert(c);

            if let Some(from) = prev.take() {
                if from != key {
                    self.edges.push(TopologyEdge {
                        from,
                        to: key.clone(),
                        properties: Arc::clone(&properties),
                    });
                }
            }
            prev = Some(key);
        }
    }

    pub fn coordinate(&self, key: &VertexKey) -> Option<Coordinate> {
        self.vertices.get(key).copied()
    }
}
