//! Phantom vertices
//!
//! A query endpoint that is a pass-through vertex is not part of the compacted
//! graph. It is temporarily promoted: compacted edges to and from it are
//! computed by walking its chain in both directions, and written into the
//! prepared graph. [`PhantomScope`] undoes every promotion when dropped, so the
//! prepared graph is restored on every exit path of a query.

use linegraph_common::VertexKey;

use crate::compact::{compact_node, compact_node_incoming, WalkContext};
use crate::edge_data::EdgeDataReducer;
use crate::graph::{Adjacency, PreparedGraph};

/// Record of one promotion, enough to undo it
#[derive(Debug)]
pub(crate) struct Phantom {
    key: VertexKey,
    /// Vertices whose rows received a column for `key`
    incoming: Vec<VertexKey>,
}

/// Promote `key` into the compacted graph. Returns `None` when it already is
/// routable, in which case there is nothing to undo.
pub(crate) fn insert_phantom(
    graph: &mut PreparedGraph,
    reverse: &Adjacency<f64>,
    reducer: Option<&dyn EdgeDataReducer>,
    key: &VertexKey,
) -> Option<Phantom> {
    if graph.compacted_vertices.contains_key(key) {
        return None;
    }

    let (outgoing, mut incoming) = {
        let ctx = WalkContext {
            vertices: &graph.vertices,
            reverse,
            coordinates: &graph.source_vertices,
            edge_data: graph.edge_data.as_ref().zip(reducer),
        };
        let compacted = &graph.compacted_vertices;
        let is_end = |k: &VertexKey| compacted.contains_key(k);
        (compact_node(&ctx, key, &is_end), compact_node_incoming(&ctx, key, &is_end))
    };

    let outgoing_count = outgoing.edges.len();
    graph.compacted_vertices.insert(key.clone(), outgoing.edges);
    graph.compacted_coordinates.insert(key.clone(), outgoing.coordinates);
    if let Some(edges) = &mut graph.compacted_edges {
        edges.insert(key.clone(), outgoing.edge_data);
    }

    let mut neighbors = Vec::with_capacity(incoming.edges.len());
    for (neighbor, weight) in incoming.edges {
        let Some(row) = graph.compacted_vertices.get_mut(&neighbor) else {
            tracing::warn!(vertex = %neighbor, "incoming chain ends outside the compacted graph");
            continue;
        };
        row.insert(key.clone(), weight);

        if let Some(coordinates) = incoming.coordinates.remove(&neighbor) {
            if let Some(row) = graph.compacted_coordinates.get_mut(&neighbor) {
                row.insert(key.clone(), coordinates);
            }
        }
        if let (Some(edges), Some(value)) = (&mut graph.compacted_edges, incoming.edge_data.remove(&neighbor)) {
            if let Some(row) = edges.get_mut(&neighbor) {
                row.insert(key.clone(), value);
            }
        }
        neighbors.push(neighbor);
    }

    tracing::trace!(
        phantom = %key,
        outgoing = outgoing_count,
        incoming = neighbors.len(),
        "promoted phantom vertex"
    );

    Some(Phantom {
        key: key.clone(),
        incoming: neighbors,
    })
}

/// Remove everything [`insert_phantom`] added for `phantom`
pub(crate) fn remove_phantom(graph: &mut PreparedGraph, phantom: &Phantom) {
    for neighbor in &phantom.incoming {
        if let Some(row) = graph.compacted_vertices.get_mut(neighbor) {
            row.remove(&phantom.key);
        }
        if let Some(row) = graph.compacted_coordinates.get_mut(neighbor) {
            row.remove(&phantom.key);
        }
        if let Some(row) = graph.compacted_edges.as_mut().and_then(|edges| edges.get_mut(neighbor)) {
            row.remove(&phantom.key);
        }
    }

    graph.compacted_vertices.remove(&phantom.key);
    graph.compacted_coordinates.remove(&phantom.key);
    if let Some(edges) = &mut graph.compacted_edges {
        edges.remove(&phantom.key);
    }

    tracing::trace!(phantom = %phantom.key, "removed phantom vertex");
}

/// Guard holding the phantom vertices of one query
///
/// Phantoms are removed in reverse insertion order when the scope is dropped,
/// including during unwinding.
pub struct PhantomScope<'g> {
    graph: &'g mut PreparedGraph,
    reverse: &'g Adjacency<f64>,
    reducer: Option<&'g dyn EdgeDataReducer>,
    phantoms: Vec<Phantom>,
}

impl<'g> PhantomScope<'g> {
    pub fn new(
        graph: &'g mut PreparedGraph,
        reverse: &'g Adjacency<f64>,
        reducer: Option<&'g dyn EdgeDataReducer>,
    ) -> Self {
        Self {
            graph,
            reverse,
            reducer,
            phantoms: Vec::new(),
        }
    }

    /// Make `key` routable for the lifetime of the scope.
    /// Returns false when `key` is not a vertex of the raw graph.
    pub fn promote(&mut self, key: &VertexKey) -> bool {
        if !self.graph.vertices.contains_key(key) {
            return false;
        }
        if let Some(phantom) = insert_phantom(&mut *self.graph, self.reverse, self.reducer, key) {
            self.phantoms.push(phantom);
        }
        true
    }

    pub fn graph(&self) -> &PreparedGraph {
        &*self.graph
    }

    pub fn phantom_count(&self) -> usize {
        self.phantoms.len()
    }
}

impl Drop for PhantomScope<'_> {
    fn drop(&mut self) {
        while let Some(phantom) = self.phantoms.pop() {
            remove_phantom(self.graph, &phantom);
        }
    }
}
