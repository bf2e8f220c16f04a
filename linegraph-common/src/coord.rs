//! Coordinates and vertex identity
//!
//! Vertices are identified by a string key derived from a coordinate rounded to
//! a configurable number of decimal places. Two coordinates that round to the
//! same value always produce the same key; geometry output keeps the full
//! precision coordinate.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Default rounding precision in decimal places (about 1.1 m at the equator)
pub const DEFAULT_PRECISION: u32 = 5;

/// A (longitude, latitude) pair, serialized as `[lng, lat]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(c: [f64; 2]) -> Self {
        Self::new(c[0], c[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lng, c.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lng, self.lat)
    }
}

/// Identity of a graph vertex
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexKey(String);

impl VertexKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VertexKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Largest supported rounding precision; `f64` carries no more decimal digits
pub const MAX_PRECISION: u32 = 15;

/// Round both components of `c` to `precision` decimal places
///
/// Values that round to zero come out as `+0.0`, so both sides of the prime
/// meridian or the equator produce the same key.
pub fn round_coord(c: Coordinate, precision: u32) -> Coordinate {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    let round = |x: f64| {
        let r = (x * factor).round() / factor;
        if r == 0.0 {
            0.0
        } else {
            r
        }
    };
    Coordinate::new(round(c.lng), round(c.lat))
}

/// Maps an already rounded coordinate to its vertex key
pub type KeyFn = Arc<dyn Fn(Coordinate) -> VertexKey + Send + Sync>;

fn join_key(c: Coordinate) -> VertexKey {
    VertexKey(format!("{},{}", c.lng, c.lat))
}

/// Rounds coordinates and turns them into vertex keys
#[derive(Clone)]
pub struct CoordinateKeyer {
    precision: u32,
    key_fn: KeyFn,
}

impl CoordinateKeyer {
    pub fn new(precision: u32, key_fn: KeyFn) -> Self {
        Self { precision, key_fn }
    }

    /// Keyer using the default `"lng,lat"` key format
    pub fn with_precision(precision: u32) -> Self {
        Self::new(precision, Arc::new(join_key))
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn round(&self, c: Coordinate) -> Coordinate {
        round_coord(c, self.precision)
    }

    pub fn key(&self, c: Coordinate) -> VertexKey {
        (self.key_fn)(self.round(c))
    }

    /// True when both coordinates round to the same vertex
    pub fn same_vertex(&self, a: Coordinate, b: Coordinate) -> bool {
        self.round(a) == self.round(b)
    }
}

impl Default for CoordinateKeyer {
    fn default() -> Self {
        Self::with_precision(DEFAULT_PRECISION)
    }
}

impl fmt::Debug for CoordinateKeyer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateKeyer")
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}
