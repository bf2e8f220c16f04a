//! Raw graph construction: topology + weight function -> directed adjacency

use linegraph_common::VertexKey;
use rustc_hash::FxHashMap;

use crate::config::{Phase, PathFinderOptions};
use crate::edge_data::EdgeData;
use crate::graph::Adjacency;
use crate::topology::{Topology, TopologyEdge};

/// Directed weighted adjacency plus optional per-edge metadata
#[derive(Clone, Debug, Default)]
pub struct RawGraph {
    pub vertices: Adjacency<f64>,
    pub edge_data: Option<Adjacency<EdgeData>>,
}

impl RawGraph {
    fn ensure_vertex(&mut self, key: &VertexKey) {
        self.vertices.entry(key.clone()).or_default();
        if let Some(edge_data) = &mut self.edge_data {
            edge_data.entry(key.clone()).or_default();
        }
    }

    /// Insert `from -> to`, keeping the cheaper of parallel edges
    fn insert_edge(&mut self, edge: &TopologyEdge, forward: bool, weight: f64, options: &PathFinderOptions) {
        let (from, to) = if forward {
            (&edge.from, &edge.to)
        } else {
            (&edge.to, &edge.from)
        };

        let row = self.vertices.entry(from.clone()).or_default();
        if row.get(to).is_some_and(|&existing| existing <= weight) {
            return;
        }
        row.insert(to.clone(), weight);

        if let (Some(edge_data), Some(reducer)) = (&mut self.edge_data, &options.edge_data) {
            edge_data
                .entry(from.clone())
                .or_default()
                .insert(to.clone(), reducer.edge_value(&edge.properties));
        }
    }
}

/// Weigh every topology edge and build the raw directed graph
pub fn build_raw_graph(topology: &Topology, options: &PathFinderOptions) -> RawGraph {
    let mut graph = RawGraph {
        vertices: FxHashMap::default(),
        edge_data: options.edge_data.as_ref().map(|_| FxHashMap::default()),
    };
    let total = topology.edges.len();
    let mut skipped = 0usize;

    for (i, edge) in topology.edges.iter().enumerate() {
        options.report(Phase::EdgeWeights, i, total);

        if edge.from == edge.to {
            continue;
        }
        let (Some(a), Some(b)) = (topology.coordinate(&edge.from), topology.coordinate(&edge.to)) else {
            tracing::warn!(from = %edge.from, to = %edge.to, "edge references an unknown vertex");
            skipped += 1;
            continue;
        };

        let weight = (options.weight_fn)(a, b, &edge.properties);
        let forward = options.zero_weight.admit(weight.forward());
        let backward = options.zero_weight.admit(weight.backward());

        if forward.is_none() && backward.is_none() {
            skipped += 1;
            continue;
        }

        graph.ensure_vertex(&edge.from);
        graph.ensure_vertex(&edge.to);
        if let Some(w) = forward {
            graph.insert_edge(edge, true, w, options);
        }
        if let Some(w) = backward {
            graph.insert_edge(edge, false, w, options);
        }
    }

    tracing::info!(
        vertices = graph.vertices.len(),
        edges = graph.vertices.values().map(|row| row.len()).sum::<usize>(),
        skipped,
        "built raw graph"
    );

    graph
}
