//! Graph compaction
//!
//! Vertices are classified as forks (intersections, dead-ends, anything that
//! does not simply carry flow through) or pass-through vertices. Every maximal
//! run of pass-through vertices between two forks collapses into one compacted
//! edge that remembers its summed weight, the coordinates it passes and the
//! folded edge metadata.
//!
//! The same chain walk, rooted at an arbitrary raw vertex, is what promotes a
//! phantom vertex at query time (see `phantom`).

use linegraph_common::{Coordinate, VertexKey};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{Phase, PathFinderOptions};
use crate::edge_data::{fold_chain, EdgeData, EdgeDataReducer};
use crate::graph::Adjacency;

/// Read-only view of the raw graph used by chain walks
#[derive(Clone, Copy)]
pub struct WalkContext<'a> {
    pub vertices: &'a Adjacency<f64>,
    pub reverse: &'a Adjacency<f64>,
    pub coordinates: &'a FxHashMap<VertexKey, Coordinate>,
    pub edge_data: Option<(&'a Adjacency<EdgeData>, &'a dyn EdgeDataReducer)>,
}

impl<'a> WalkContext<'a> {
    fn edge_value(&self, from: &VertexKey, to: &VertexKey) -> Option<&'a EdgeData> {
        let (edge_data, _) = self.edge_data?;
        edge_data.get(from)?.get(to)
    }

    fn fold(&self, values: Vec<&EdgeData>) -> Option<EdgeData> {
        let (_, reducer) = self.edge_data?;
        fold_chain(reducer, values)
    }
}

/// True when `key` has exactly two neighbours and carries flow through itself:
/// either both neighbours are connected in both directions, or there is one
/// inbound edge from one neighbour and one outbound edge to the other.
pub fn is_pass_through(vertices: &Adjacency<f64>, reverse: &Adjacency<f64>, key: &VertexKey) -> bool {
    let outgoing = vertices.get(key);
    let incoming = reverse.get(key);

    let mut neighbors: Vec<&VertexKey> = outgoing
        .into_iter()
        .flat_map(|row| row.keys())
        .chain(incoming.into_iter().flat_map(|row| row.keys()))
        .collect();
    neighbors.sort_unstable();
    neighbors.dedup();

    let [p, q] = neighbors.as_slice() else {
        return false;
    };
    let (p, q) = (*p, *q);

    let out = |n: &VertexKey| outgoing.is_some_and(|row| row.contains_key(n));
    let inc = |n: &VertexKey| incoming.is_some_and(|row| row.contains_key(n));
    let through = |from: &VertexKey, to: &VertexKey| inc(from) && out(to) && !out(from) && !inc(to);

    (out(p) && inc(p) && out(q) && inc(q)) || through(p, q) || through(q, p)
}

/// All fork vertices of a raw graph, in key order
pub fn find_forks(vertices: &Adjacency<f64>, reverse: &Adjacency<f64>) -> Vec<VertexKey> {
    let mut keys: Vec<&VertexKey> = vertices.keys().chain(reverse.keys()).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.into_iter()
        .filter(|key| !is_pass_through(vertices, reverse, key))
        .cloned()
        .collect()
}

/// One walked chain between a root vertex and the fork at its other end
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub end: VertexKey,
    pub weight: f64,
    /// Coordinates in travel order, including the start, excluding the end
    pub coordinates: Vec<Coordinate>,
    pub edge_data: Option<EdgeData>,
}

/// Walk outgoing edges from `origin` through `first` until an end vertex
pub fn walk_forward<F>(ctx: &WalkContext<'_>, origin: &VertexKey, first: &VertexKey, is_end: &F) -> Option<Chain>
where
    F: Fn(&VertexKey) -> bool + ?Sized,
{
    let mut weight = *ctx.vertices.get(origin)?.get(first)?;
    let mut coordinates = vec![*ctx.coordinates.get(origin)?];
    let mut values: Vec<&EdgeData> = ctx.edge_value(origin, first).into_iter().collect();

    let mut prev = origin;
    let mut current = first;
    while current != origin && !is_end(current) {
        let Some((next, w)) = ctx
            .vertices
            .get(current)
            .and_then(|row| row.iter().find(|(k, _)| *k != prev))
        else {
            tracing::trace!(vertex = %current, "chain stops at a vertex without exit");
            return None;
        };

        weight += *w;
        coordinates.push(*ctx.coordinates.get(current)?);
        values.extend(ctx.edge_value(current, next));

        prev = current;
        current = next;
    }

    Some(Chain {
        end: current.clone(),
        weight,
        coordinates,
        edge_data: ctx.fold(values),
    })
}

/// Walk incoming edges backwards from `origin` through `first`; the returned
/// chain is oriented from the end vertex towards `origin`
pub fn walk_backward<F>(ctx: &WalkContext<'_>, origin: &VertexKey, first: &VertexKey, is_end: &F) -> Option<Chain>
where
    F: Fn(&VertexKey) -> bool + ?Sized,
{
    let mut weights = vec![*ctx.vertices.get(first)?.get(origin)?];
    let mut values: Vec<&EdgeData> = ctx.edge_value(first, origin).into_iter().collect();
    let mut coordinates = Vec::new();

    let mut prev = origin;
    let mut current = first;
    while current != origin && !is_end(current) {
        let Some((next, w)) = ctx
            .reverse
            .get(current)
            .and_then(|row| row.iter().find(|(k, _)| *k != prev))
        else {
            tracing::trace!(vertex = %current, "chain stops at a vertex without entry");
            return None;
        };

        weights.push(*w);
        coordinates.push(*ctx.coordinates.get(current)?);
        values.extend(ctx.edge_value(next, current));

        prev = current;
        current = next;
    }
    coordinates.push(*ctx.coordinates.get(current)?);

    // everything was collected back to front
    coordinates.reverse();
    weights.reverse();
    values.reverse();

    let mut weights = weights.into_iter();
    let first_weight = weights.next()?;
    Some(Chain {
        end: current.clone(),
        weight: weights.fold(first_weight, |sum, w| sum + w),
        coordinates,
        edge_data: ctx.fold(values),
    })
}

/// Compacted edges of a single vertex
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactedNode {
    pub edges: FxHashMap<VertexKey, f64>,
    pub coordinates: FxHashMap<VertexKey, Vec<Coordinate>>,
    pub edge_data: FxHashMap<VertexKey, EdgeData>,
}

impl CompactedNode {
    /// Record `chain` unless an equal or cheaper one to the same end exists
    fn offer(&mut self, chain: Chain) {
        if self.edges.get(&chain.end).is_some_and(|&w| w <= chain.weight) {
            return;
        }
        self.edges.insert(chain.end.clone(), chain.weight);
        match chain.edge_data {
            Some(value) => {
                self.edge_data.insert(chain.end.clone(), value);
            }
            None => {
                self.edge_data.remove(&chain.end);
            }
        }
        self.coordinates.insert(chain.end, chain.coordinates);
    }
}

/// Outgoing compacted edges of `origin`
pub fn compact_node<F>(ctx: &WalkContext<'_>, origin: &VertexKey, is_end: &F) -> CompactedNode
where
    F: Fn(&VertexKey) -> bool + ?Sized,
{
    let mut node = CompactedNode::default();
    let Some(row) = ctx.vertices.get(origin) else {
        return node;
    };
    for first in row.keys() {
        if let Some(chain) = walk_forward(ctx, origin, first, is_end) {
            if chain.end != *origin {
                node.offer(chain);
            }
        }
    }
    node
}

/// Incoming compacted edges of `origin`, keyed by the vertex they start from
pub fn compact_node_incoming<F>(ctx: &WalkContext<'_>, origin: &VertexKey, is_end: &F) -> CompactedNode
where
    F: Fn(&VertexKey) -> bool + ?Sized,
{
    let mut node = CompactedNode::default();
    let Some(row) = ctx.reverse.get(origin) else {
        return node;
    };
    for first in row.keys() {
        if let Some(chain) = walk_backward(ctx, origin, first, is_end) {
            if chain.end != *origin {
                node.offer(chain);
            }
        }
    }
    node
}

/// Output of [`compact_graph`]
#[derive(Clone, Debug, Default)]
pub struct Compaction {
    pub graph: Adjacency<f64>,
    pub coordinates: Adjacency<Vec<Coordinate>>,
    pub edge_data: Option<Adjacency<EdgeData>>,
}

/// Collapse every pass-through chain of the raw graph
///
/// Forks are compacted in parallel; each fork only writes its own row.
pub fn compact_graph(ctx: &WalkContext<'_>, options: &PathFinderOptions) -> Compaction {
    let forks = find_forks(ctx.vertices, ctx.reverse);
    let total = forks.len();
    let done = AtomicUsize::new(0);

    let nodes: Vec<CompactedNode> = {
        let fork_set: FxHashSet<&VertexKey> = forks.iter().collect();
        let is_end = |key: &VertexKey| fork_set.contains(key);

        forks
            .par_iter()
            .map(|fork| {
                let node = compact_node(ctx, fork, &is_end);
                options.report(Phase::Compaction, done.fetch_add(1, Ordering::Relaxed), total);
                node
            })
            .collect()
    };

    let mut compaction = Compaction {
        graph: FxHashMap::default(),
        coordinates: FxHashMap::default(),
        edge_data: ctx.edge_data.map(|_| FxHashMap::default()),
    };
    for (fork, node) in forks.into_iter().zip(nodes) {
        if let Some(edge_data) = &mut compaction.edge_data {
            edge_data.insert(fork.clone(), node.edge_data);
        }
        compaction.coordinates.insert(fork.clone(), node.coordinates);
        compaction.graph.insert(fork, node.edges);
    }

    tracing::info!(
        forks = compaction.graph.len(),
        edges = compaction.graph.values().map(|row| row.len()).sum::<usize>(),
        "compacted graph"
    );

    compaction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_data::PropertyCollector;
    use crate::graph::reverse_adjacency;
    use serde_json::json;

    fn key(i: usize) -> VertexKey {
        VertexKey::new(format!("{i},0"))
    }

    struct Fixture {
        vertices: Adjacency<f64>,
        reverse: Adjacency<f64>,
        coordinates: FxHashMap<VertexKey, Coordinate>,
        edge_data: Adjacency<EdgeData>,
        reducer: PropertyCollector,
    }

    impl Fixture {
        /// Vertices 0..n on a line at x = i
        fn new(n: usize) -> Self {
            Self {
                vertices: FxHashMap::default(),
                reverse: FxHashMap::default(),
                coordinates: (0..n).map(|i| (key(i), Coordinate::new(i as f64, 0.0))).collect(),
                edge_data: FxHashMap::default(),
                reducer: PropertyCollector::new("name"),
            }
        }

        fn edge(&mut self, a: usize, b: usize, w: f64) -> &mut Self {
            self.vertices.entry(key(a)).or_default().insert(key(b), w);
            self.vertices.entry(key(b)).or_default();
            self.edge_data
                .entry(key(a))
                .or_default()
                .insert(key(b), json!([format!("{a}-{b}")]));
            self.reverse = reverse_adjacency(&self.vertices);
            self
        }

        fn both(&mut self, a: usize, b: usize, w: f64) -> &mut Self {
            self.edge(a, b, w).edge(b, a, w)
        }

        fn ctx(&self) -> WalkContext<'_> {
            WalkContext {
                vertices: &self.vertices,
                reverse: &self.reverse,
                coordinates: &self.coordinates,
                edge_data: Some((&self.edge_data, &self.reducer)),
            }
        }
    }

    #[test]
    fn classifies_forks_and_pass_through_vertices() {
        let mut f = Fixture::new(6);
        // 0 - 1 - 2 - 3 with a spur 2 - 4, and one-way 4 -> 5
        f.both(0, 1, 1.0).both(1, 2, 1.0).both(2, 3, 1.0).both(2, 4, 1.0).edge(4, 5, 1.0);

        assert!(is_pass_through(&f.vertices, &f.reverse, &key(1)));
        assert!(!is_pass_through(&f.vertices, &f.reverse, &key(0)), "dead end");
        assert!(!is_pass_through(&f.vertices, &f.reverse, &key(2)), "intersection");
        assert!(!is_pass_through(&f.vertices, &f.reverse, &key(4)), "mixed one-way");
        assert_eq!(find_forks(&f.vertices, &f.reverse), vec![key(0), key(2), key(3), key(4), key(5)]);
    }

    #[test]
    fn one_way_chain_vertices_pass_through() {
        let mut f = Fixture::new(4);
        f.edge(0, 1, 1.0).edge(1, 2, 1.0).edge(2, 3, 1.0);
        assert!(is_pass_through(&f.vertices, &f.reverse, &key(1)));
        assert!(is_pass_through(&f.vertices, &f.reverse, &key(2)));

        // a sink with two inbound edges is a fork
        let mut g = Fixture::new(3);
        g.edge(0, 1, 1.0).edge(2, 1, 1.0);
        assert!(!is_pass_through(&g.vertices, &g.reverse, &key(1)));
    }

    #[test]
    fn chain_accumulates_weight_coordinates_and_edge_data() {
        let mut f = Fixture::new(4);
        f.both(0, 1, 0.1).both(1, 2, 0.2).both(2, 3, 0.3);
        let forks: FxHashSet<VertexKey> = find_forks(&f.vertices, &f.reverse).into_iter().collect();
        let is_end = |k: &VertexKey| forks.contains(k);

        let chain = walk_forward(&f.ctx(), &key(0), &key(1), &is_end).unwrap();
        assert_eq!(chain.end, key(3));
        assert_eq!(chain.weight, 0.1 + 0.2 + 0.3);
        assert_eq!(
            chain.coordinates,
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0), Coordinate::new(2.0, 0.0)]
        );
        assert_eq!(chain.edge_data, Some(json!(["0-1", "1-2", "2-3"])));
    }

    #[test]
    fn backward_walk_matches_forward_prefix() {
        let mut f = Fixture::new(5);
        f.both(0, 1, 0.1).both(1, 2, 0.7).both(2, 3, 0.3).both(3, 4, 0.9);
        let forks: FxHashSet<VertexKey> = find_forks(&f.vertices, &f.reverse).into_iter().collect();
        let is_end = |k: &VertexKey| forks.contains(k);

        // incoming edge of 3 from fork 0, walking 2 <- 1 <- 0
        let chain = walk_backward(&f.ctx(), &key(3), &key(2), &is_end).unwrap();
        assert_eq!(chain.end, key(0));
        assert_eq!(chain.weight, 0.1 + 0.7 + 0.3);
        assert_eq!(
            chain.coordinates,
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0), Coordinate::new(2.0, 0.0)]
        );
        assert_eq!(chain.edge_data, Some(json!(["0-1", "1-2", "2-3"])));
    }

    #[test]
    fn compaction_keeps_only_forks() {
        let mut f = Fixture::new(6);
        f.both(0, 1, 1.0).both(1, 2, 2.0).both(2, 3, 3.0).both(2, 4, 4.0).both(4, 5, 5.0);

        let compaction = compact_graph(&f.ctx(), &PathFinderOptions::default());
        let mut forks: Vec<_> = compaction.graph.keys().cloned().collect();
        forks.sort();
        assert_eq!(forks, vec![key(0), key(2), key(3), key(5)]);

        assert_eq!(compaction.graph[&key(0)][&key(2)], 3.0);
        assert_eq!(compaction.graph[&key(2)][&key(5)], 9.0);
        assert_eq!(compaction.graph[&key(5)][&key(2)], 9.0);
        assert_eq!(compaction.graph[&key(2)][&key(3)], 3.0);
        assert_eq!(
            compaction.coordinates[&key(5)][&key(2)],
            vec![Coordinate::new(5.0, 0.0), Coordinate::new(4.0, 0.0)]
        );
        let edge_data = compaction.edge_data.unwrap();
        assert_eq!(edge_data[&key(0)][&key(2)], json!(["0-1", "1-2"]));
    }

    #[test]
    fn loops_back_to_the_origin_are_dropped() {
        // 0 - 1 - 2 - 3 - 1 : a lollipop whose loop starts and ends at fork 1
        let mut f = Fixture::new(4);
        f.both(0, 1, 1.0).both(1, 2, 1.0).both(2, 3, 1.0).both(3, 1, 1.0);

        let compaction = compact_graph(&f.ctx(), &PathFinderOptions::default());
        assert_eq!(compaction.graph.len(), 2);
        assert_eq!(compaction.graph[&key(1)].len(), 1);
        assert_eq!(compaction.graph[&key(1)][&key(0)], 1.0);
    }

    #[test]
    fn sink_forks_get_empty_rows() {
        let mut f = Fixture::new(3);
        f.edge(0, 1, 1.0).edge(2, 1, 1.0);

        let compaction = compact_graph(&f.ctx(), &PathFinderOptions::default());
        assert!(compaction.graph[&key(1)].is_empty());
        assert!(compaction.coordinates[&key(1)].is_empty());
        assert_eq!(compaction.graph[&key(0)][&key(1)], 1.0);
    }
}
