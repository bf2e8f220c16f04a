//! Prepared (compacted) graph and its persisted layout

use linegraph_common::{Coordinate, Result, VertexKey};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::edge_data::EdgeData;

/// `from -> (to -> value)`
pub type Adjacency<T> = FxHashMap<VertexKey, FxHashMap<VertexKey, T>>;

/// Everything needed to answer queries without recompaction
///
/// `vertices` and `source_vertices` are the raw graph and never change after
/// preprocessing. The three `compacted_*` tables share the same row/column key
/// sets and are only modified while a query holds phantom vertices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedGraph {
    pub vertices: Adjacency<f64>,
    #[serde(default)]
    pub edge_data: Option<Adjacency<EdgeData>>,
    pub source_vertices: FxHashMap<VertexKey, Coordinate>,
    pub compacted_vertices: Adjacency<f64>,
    pub compacted_coordinates: Adjacency<Vec<Coordinate>>,
    #[serde(default)]
    pub compacted_edges: Option<Adjacency<EdgeData>>,
}

impl PreparedGraph {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Number of routable vertices (forks plus any live phantoms)
    pub fn fork_count(&self) -> usize {
        self.compacted_vertices.len()
    }

    pub fn compacted_edge_count(&self) -> usize {
        self.compacted_vertices.values().map(|row| row.len()).sum()
    }

    pub fn raw_edge_count(&self) -> usize {
        self.vertices.values().map(|row| row.len()).sum()
    }

    pub fn coordinate(&self, key: &VertexKey) -> Option<Coordinate> {
        self.source_vertices.get(key).copied()
    }
}

/// Incoming adjacency of a raw graph: `to -> (from -> weight)`
pub fn reverse_adjacency(vertices: &Adjacency<f64>) -> Adjacency<f64> {
    let mut reverse: Adjacency<f64> = FxHashMap::default();
    for (from, row) in vertices {
        for (to, &weight) in row {
            reverse
                .entry(to.clone())
                .or_default()
                .insert(from.clone(), weight);
        }
    }
    reverse
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn key(s: &str) -> VertexKey {
        VertexKey::new(s)
    }

    #[test]
    fn reverse_adjacency_flips_every_edge() {
        let mut vertices: Adjacency<f64> = FxHashMap::default();
        vertices.entry(key("a")).or_default().insert(key("b"), 1.0);
        vertices.entry(key("b")).or_default().insert(key("c"), 2.0);
        vertices.entry(key("c")).or_default();

        let reverse = reverse_adjacency(&vertices);
        assert_eq!(reverse[&key("b")][&key("a")], 1.0);
        assert_eq!(reverse[&key("c")][&key("b")], 2.0);
        assert!(!reverse.contains_key(&key("a")));
    }

    #[test]
    fn save_and_load_through_the_filesystem() {
        let mut graph = PreparedGraph::default();
        graph.vertices.entry(key("0,0")).or_default().insert(key("1,0"), 3.5);
        graph.source_vertices.insert(key("0,0"), Coordinate::new(0.0, 0.0));
        graph.source_vertices.insert(key("1,0"), Coordinate::new(1.0, 0.0));
        graph.compacted_vertices.entry(key("0,0")).or_default().insert(key("1,0"), 3.5);
        graph
            .compacted_coordinates
            .entry(key("0,0"))
            .or_default()
            .insert(key("1,0"), vec![Coordinate::new(0.0, 0.0)]);

        let tmpfile = NamedTempFile::new().unwrap();
        graph.save(tmpfile.path()).unwrap();
        let loaded = PreparedGraph::load(tmpfile.path()).unwrap();

        assert_eq!(loaded, graph);
        assert_eq!(loaded.fork_count(), 1);
        assert_eq!(loaded.compacted_edge_count(), 1);
        assert_eq!(loaded.raw_edge_count(), 1);
    }

    #[test]
    fn persisted_layout_uses_camel_case_keys() {
        let json = serde_json::to_value(PreparedGraph::default()).unwrap();
        for field in [
            "vertices",
            "edgeData",
            "sourceVertices",
            "compactedVertices",
            "compactedCoordinates",
            "compactedEdges",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
