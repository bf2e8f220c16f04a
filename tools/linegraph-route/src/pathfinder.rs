//! The path finder engine
//!
//! Owns the prepared graph and answers point-to-point queries. Every query
//! promotes its endpoints inside a [`PhantomScope`], so the prepared graph is
//! identical before and after each call.

use linegraph_common::{Coordinate, CoordinateKeyer, Error, Result, VertexKey};
use std::fmt;
use std::sync::Arc;

use crate::builder::build_raw_graph;
use crate::compact::{compact_graph, WalkContext};
use crate::config::PathFinderOptions;
use crate::dijkstra::shortest_path;
use crate::edge_data::EdgeDataReducer;
use crate::geo::haversine_distance;
use crate::graph::{reverse_adjacency, Adjacency, PreparedGraph};
use crate::phantom::PhantomScope;
use crate::reconstruct::{expand_path, Route};
use crate::spatial::{SegmentLocator, SnappedPoint};
use crate::topology::{FeatureCollection, Topology};

#[derive(Clone)]
pub struct PathFinder {
    graph: PreparedGraph,
    reverse: Adjacency<f64>,
    keyer: CoordinateKeyer,
    reducer: Option<Arc<dyn EdgeDataReducer>>,
}

impl PathFinder {
    /// Build and compact the graph of `topology`
    pub fn new(topology: &Topology, options: PathFinderOptions) -> Result<Self> {
        options.validate()?;
        let raw = build_raw_graph(topology, &options);
        let reverse = reverse_adjacency(&raw.vertices);

        let compaction = {
            let ctx = WalkContext {
                vertices: &raw.vertices,
                reverse: &reverse,
                coordinates: &topology.vertices,
                edge_data: raw.edge_data.as_ref().zip(options.edge_data.as_deref()),
            };
            compact_graph(&ctx, &options)
        };

        let graph = PreparedGraph {
            vertices: raw.vertices,
            edge_data: raw.edge_data,
            source_vertices: topology.vertices.clone(),
            compacted_vertices: compaction.graph,
            compacted_coordinates: compaction.coordinates,
            compacted_edges: compaction.edge_data,
        };

        Self::from_parts(graph, reverse, &options)
    }

    pub fn from_geojson(collection: &FeatureCollection, options: PathFinderOptions) -> Result<Self> {
        let topology = Topology::from_geojson(collection, &options)?;
        Self::new(&topology, options)
    }

    /// Reuse a previously prepared graph without recompaction
    ///
    /// `options` must describe the graph: the same keying and an edge data
    /// reducer exactly when the graph carries edge data.
    pub fn from_prepared(graph: PreparedGraph, options: PathFinderOptions) -> Result<Self> {
        options.validate()?;
        check_prepared(&graph, &options)?;
        let reverse = reverse_adjacency(&graph.vertices);
        Self::from_parts(graph, reverse, &options)
    }

    fn from_parts(graph: PreparedGraph, reverse: Adjacency<f64>, options: &PathFinderOptions) -> Result<Self> {
        if graph.compacted_vertices.is_empty() {
            return Err(Error::NoForks);
        }
        Ok(Self {
            graph,
            reverse,
            keyer: options.keyer(),
            reducer: options.edge_data.clone(),
        })
    }

    /// The prepared graph, suitable for persisting
    pub fn serialize(&self) -> &PreparedGraph {
        &self.graph
    }

    pub fn into_prepared(self) -> PreparedGraph {
        self.graph
    }

    pub fn keyer(&self) -> &CoordinateKeyer {
        &self.keyer
    }

    /// Shortest path between two raw vertices; `None` when either is unknown
    /// or no path exists
    pub fn find_path_between_keys(&mut self, start: &VertexKey, finish: &VertexKey) -> Option<Route> {
        let mut scope = PhantomScope::new(&mut self.graph, &self.reverse, self.reducer.as_deref());
        if !scope.promote(start) || !scope.promote(finish) {
            tracing::debug!(%start, %finish, "query endpoint is not a network vertex");
            return None;
        }

        let (weight, vertices) = shortest_path(&scope.graph().compacted_vertices, start, finish)?;
        tracing::debug!(%start, %finish, weight, hops = vertices.len(), "found path");
        expand_path(scope.graph(), &vertices, weight)
    }

    /// Shortest path between the network vertices at `a` and `b`
    pub fn find_path_between_vertices(&mut self, a: Coordinate, b: Coordinate) -> Option<Route> {
        let start = self.keyer.key(a);
        let finish = self.keyer.key(b);
        self.find_path_between_keys(&start, &finish)
    }

    /// Shortest path between two arbitrary points, snapped onto the network
    /// by `locator`
    ///
    /// When both points snap onto the same segment the result is the straight
    /// connector between them, without a graph search. That shortcut ignores
    /// one-way restrictions and segments dropped as impassable.
    pub fn find_path<L>(&mut self, locator: &L, a: Coordinate, b: Coordinate) -> Option<Route>
    where
        L: SegmentLocator + ?Sized,
    {
        let a = locator.nearest_segment(a)?;
        let b = locator.nearest_segment(b)?;

        if self.same_segment(&a, &b) {
            tracing::debug!("both points on one segment");
            return Some(Route {
                path: vec![a.point, b.point],
                weight: haversine_distance(a.point, b.point) * a.weight_factor,
                edge_datas: self.graph.compacted_edges.as_ref().map(|_| Vec::new()),
            });
        }

        let start = self.keyer.key(a.point);
        let finish = self.keyer.key(b.point);
        if self.graph.vertices.contains_key(&start) && self.graph.vertices.contains_key(&finish) {
            if let Some(route) = self.find_path_between_keys(&start, &finish) {
                return Some(route);
            }
        }

        let candidates = [(a.start, b.start), (a.start, b.end), (a.end, b.start), (a.end, b.end)];
        candidates.into_iter().fold(None, |best: Option<Route>, (va, vb)| {
            let Some(candidate) = self.connect(&a, &b, va, vb) else {
                return best;
            };
            tracing::debug!(from = %va, to = %vb, weight = candidate.weight, "candidate route");
            match best {
                Some(best) if best.weight <= candidate.weight => Some(best),
                _ => Some(candidate),
            }
        })
    }

    fn same_segment(&self, a: &SnappedPoint, b: &SnappedPoint) -> bool {
        let same = |x, y| self.keyer.same_vertex(x, y);
        (same(a.start, b.start) && same(a.end, b.end)) || (same(a.start, b.end) && same(a.end, b.start))
    }

    /// Route from `va` to `vb` extended by connectors to the snapped points
    fn connect(&mut self, a: &SnappedPoint, b: &SnappedPoint, va: Coordinate, vb: Coordinate) -> Option<Route> {
        let mut route = self.find_path_between_vertices(va, vb)?;

        if !self.keyer.same_vertex(a.point, va) {
            route.weight += haversine_distance(a.point, va) * a.weight_factor;
            route.path.insert(0, a.point);
        }
        if !self.keyer.same_vertex(vb, b.point) {
            route.weight += haversine_distance(vb, b.point) * b.weight_factor;
            route.path.push(b.point);
        }
        Some(route)
    }
}

/// Vertices re-keyed when checking a prepared graph against its options
const KEY_SAMPLE: usize = 32;

fn check_prepared(graph: &PreparedGraph, options: &PathFinderOptions) -> Result<()> {
    match (graph.compacted_edges.is_some(), options.edge_data.is_some()) {
        (true, false) => {
            return Err(Error::InvalidInput(
                "prepared graph carries edge data but no edge data reducer is configured".to_string(),
            ))
        }
        (false, true) => {
            return Err(Error::InvalidInput(
                "edge data reducer configured but the prepared graph carries no edge data".to_string(),
            ))
        }
        _ => {}
    }

    let keyer = options.keyer();
    if let Some((key, &c)) = graph
        .source_vertices
        .iter()
        .take(KEY_SAMPLE)
        .find(|(key, c)| keyer.key(**c) != **key)
    {
        return Err(Error::InvalidInput(format!(
            "vertex {c} is keyed '{key}' in the prepared graph but '{}' under precision {}",
            keyer.key(c),
            keyer.precision()
        )));
    }
    Ok(())
}

impl fmt::Debug for PathFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFinder")
            .field("forks", &self.graph.fork_count())
            .field("compacted_edges", &self.graph.compacted_edge_count())
            .field("keyer", &self.keyer)
            .field("edge_data", &self.reducer.is_some())
            .finish()
    }
}
