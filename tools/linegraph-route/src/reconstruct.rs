//! Expansion of a compacted vertex sequence into a coordinate path

use linegraph_common::{Coordinate, VertexKey};
use serde::Serialize;
use serde_json::Value;

use crate::edge_data::EdgeData;
use crate::graph::PreparedGraph;

/// Result of a path query
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub weight: f64,
    /// One value per compacted edge, present when edge data is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_datas: Option<Vec<EdgeData>>,
}

/// Concatenate the coordinate chains of consecutive compacted edges and close
/// the path with the coordinate of the final vertex
pub fn expand_path(graph: &PreparedGraph, vertices: &[VertexKey], weight: f64) -> Option<Route> {
    let last = vertices.last()?;
    let mut path = Vec::new();
    for pair in vertices.windows(2) {
        let Some(chain) = graph
            .compacted_coordinates
            .get(&pair[0])
            .and_then(|row| row.get(&pair[1]))
        else {
            tracing::warn!(from = %pair[0], to = %pair[1], "compacted edge without coordinates");
            return None;
        };
        path.extend_from_slice(chain);
    }
    path.push(graph.coordinate(last)?);

    let edge_datas = graph.compacted_edges.as_ref().map(|edges| {
        vertices
            .windows(2)
            .map(|pair| {
                edges
                    .get(&pair[0])
                    .and_then(|row| row.get(&pair[1]))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    });

    Some(Route {
        path,
        weight,
        edge_datas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> VertexKey {
        VertexKey::new(s)
    }

    fn graph() -> PreparedGraph {
        let mut graph = PreparedGraph::default();
        graph.source_vertices.insert(key("a"), Coordinate::new(0.0, 0.0));
        graph.source_vertices.insert(key("b"), Coordinate::new(2.0, 0.0));
        graph.source_vertices.insert(key("c"), Coordinate::new(3.0, 0.0));
        graph.compacted_coordinates.entry(key("a")).or_default().insert(
            key("b"),
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)],
        );
        graph
            .compacted_coordinates
            .entry(key("b"))
            .or_default()
            .insert(key("c"), vec![Coordinate::new(2.0, 0.0)]);
        graph
    }

    #[test]
    fn concatenates_chains_without_duplicates() {
        let route = expand_path(&graph(), &[key("a"), key("b"), key("c")], 3.0).unwrap();
        assert_eq!(
            route.path,
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(2.0, 0.0),
                Coordinate::new(3.0, 0.0),
            ]
        );
        assert_eq!(route.weight, 3.0);
        assert_eq!(route.edge_datas, None);
    }

    #[test]
    fn single_vertex_path() {
        let route = expand_path(&graph(), &[key("b")], 0.0).unwrap();
        assert_eq!(route.path, vec![Coordinate::new(2.0, 0.0)]);
        assert!(expand_path(&graph(), &[], 0.0).is_none());
    }

    #[test]
    fn edge_data_follows_the_path() {
        let mut graph = graph();
        let mut edges = rustc_hash::FxHashMap::default();
        edges
            .entry(key("a"))
            .or_insert_with(rustc_hash::FxHashMap::default)
            .insert(key("b"), json!(["Main St"]));
        graph.compacted_edges = Some(edges);

        let route = expand_path(&graph, &[key("a"), key("b"), key("c")], 3.0).unwrap();
        assert_eq!(route.edge_datas, Some(vec![json!(["Main St"]), Value::Null]));

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["path"][0], json!([0.0, 0.0]));
        assert!(json.get("edgeDatas").is_some());
    }
}
