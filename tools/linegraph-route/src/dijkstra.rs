//! Shortest path over the compacted graph

use linegraph_common::VertexKey;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

use crate::graph::Adjacency;

/// Dijkstra from `start` to `finish`
///
/// Returns the total weight and the visited vertices, both endpoints included,
/// or `None` when `finish` cannot be reached. Weights must be non-negative.
pub fn shortest_path(graph: &Adjacency<f64>, start: &VertexKey, finish: &VertexKey) -> Option<(f64, Vec<VertexKey>)> {
    if !graph.contains_key(start) || !graph.contains_key(finish) {
        return None;
    }
    if start == finish {
        return Some((0.0, vec![start.clone()]));
    }

    let mut dist: FxHashMap<&VertexKey, f64> = FxHashMap::default();
    let mut parent: FxHashMap<&VertexKey, &VertexKey> = FxHashMap::default();
    let mut pq: PriorityQueue<&VertexKey, Reverse<OrderedFloat<f64>>> = PriorityQueue::new();

    dist.insert(start, 0.0);
    pq.push(start, Reverse(OrderedFloat(0.0)));

    let mut settled = 0usize;
    while let Some((u, Reverse(OrderedFloat(d)))) = pq.pop() {
        if u == finish {
            tracing::trace!(settled, weight = d, "search reached target");
            return Some((d, unwind(&parent, start, finish)));
        }
        settled += 1;

        let Some(row) = graph.get(u) else {
            continue;
        };
        for (v, &w) in row {
            let new_dist = d + w;
            if dist.get(v).is_some_and(|&known| known <= new_dist) {
                continue;
            }
            dist.insert(v, new_dist);
            parent.insert(v, u);
            pq.push(v, Reverse(OrderedFloat(new_dist)));
        }
    }

    tracing::trace!(settled, "target not reachable");
    None
}

fn unwind(parent: &FxHashMap<&VertexKey, &VertexKey>, start: &VertexKey, finish: &VertexKey) -> Vec<VertexKey> {
    let mut path = vec![finish.clone()];
    let mut current = finish;
    while current != start {
        match parent.get(current) {
            Some(&prev) => {
                path.push(prev.clone());
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
