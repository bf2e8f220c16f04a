//! Nearest-segment lookup for off-network query points

use linegraph_common::Coordinate;
use rstar::primitives::{GeomWithData, Line};
use rstar::RTree;

use crate::topology::Topology;
use crate::weight::weight_factor;

/// A query point projected onto its nearest network segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnappedPoint {
    /// Projection of the query onto the segment
    pub point: Coordinate,
    pub start: Coordinate,
    pub end: Coordinate,
    /// Weight factor of the line the segment belongs to
    pub weight_factor: f64,
}

/// Finds the network segment closest to a coordinate
pub trait SegmentLocator {
    fn nearest_segment(&self, point: Coordinate) -> Option<SnappedPoint>;
}

impl<F> SegmentLocator for F
where
    F: Fn(Coordinate) -> Option<SnappedPoint>,
{
    fn nearest_segment(&self, point: Coordinate) -> Option<SnappedPoint> {
        self(point)
    }
}

/// Segment with its line's weight factor for the R-tree
type IndexedSegment = GeomWithData<Line<[f64; 2]>, f64>;

/// R-tree over every raw edge of a topology
///
/// Distances are planar in degrees, which is adequate for picking the nearest
/// segment at street scale.
pub struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    pub fn from_topology(topology: &Topology, weight_property: &str) -> Self {
        let segments: Vec<IndexedSegment> = topology
            .edges
            .iter()
            .filter_map(|edge| {
                let from = topology.coordinate(&edge.from)?;
                let to = topology.coordinate(&edge.to)?;
                Some(GeomWithData::new(
                    Line::new(from.into(), to.into()),
                    weight_factor(&edge.properties, weight_property),
                ))
            })
            .collect();

        tracing::debug!(segments = segments.len(), "built segment index");

        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl SegmentLocator for SegmentIndex {
    fn nearest_segment(&self, point: Coordinate) -> Option<SnappedPoint> {
        let query: [f64; 2] = point.into();
        let segment = self.tree.nearest_neighbor_iter(&query).next()?;
        let line = segment.geom();

        Some(SnappedPoint {
            point: line.nearest_point(&query).into(),
            start: line.from.into(),
            end: line.to.into(),
            weight_factor: segment.data,
        })
    }
}
