pub mod builder;
pub mod compact;
pub mod config;
pub mod dijkstra;
pub mod edge_data;
pub mod geo;
pub mod graph;
pub mod pathfinder;
pub mod phantom;
pub mod reconstruct;
pub mod spatial;
pub mod topology;
pub mod weight;

pub use config::{PathFinderOptions, Phase};
pub use edge_data::{EdgeDataReducer, PropertyCollector};
pub use graph::PreparedGraph;
pub use pathfinder::PathFinder;
pub use reconstruct::Route;
pub use spatial::{SegmentIndex, SegmentLocator, SnappedPoint};
pub use topology::{FeatureCollection, Topology};
pub use weight::{DistanceWeight, Weight, ZeroWeightPolicy};
