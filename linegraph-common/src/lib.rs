//! Common utilities for the linegraph toolkit

pub mod coord;
pub mod error;

pub use coord::{round_coord, Coordinate, CoordinateKeyer, KeyFn, VertexKey, DEFAULT_PRECISION, MAX_PRECISION};
pub use error::{Error, Result};
