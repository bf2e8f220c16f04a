//! Path finder configuration
//!
//! Every strategy (keying, weighting, edge data reduction, progress reporting)
//! is an explicit value carried by [`PathFinderOptions`].

use linegraph_common::{CoordinateKeyer, Error, KeyFn, Result, DEFAULT_PRECISION, MAX_PRECISION};
use std::fmt;
use std::sync::Arc;

use crate::edge_data::EdgeDataReducer;
use crate::weight::{DistanceWeight, WeightFn, ZeroWeightPolicy};

/// Progress is reported every this many items of a phase
pub const PROGRESS_INTERVAL: usize = 1000;

/// Preprocessing phase reported to the progress callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    TopologyVertices,
    TopologyEdges,
    EdgeWeights,
    Compaction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::TopologyVertices => "topo:vertices",
            Phase::TopologyEdges => "topo:edges",
            Phase::EdgeWeights => "edgeweights",
            Phase::Compaction => "compaction",
        };
        f.write_str(name)
    }
}

/// `(phase, index, total)`
pub type ProgressFn = Arc<dyn Fn(Phase, usize, usize) + Send + Sync>;

#[derive(Clone)]
pub struct PathFinderOptions {
    /// Rounding precision of vertex keys, in decimal places
    pub precision: u32,
    pub key_fn: Option<KeyFn>,
    pub weight_fn: WeightFn,
    pub zero_weight: ZeroWeightPolicy,
    pub edge_data: Option<Arc<dyn EdgeDataReducer>>,
    pub progress: Option<ProgressFn>,
}

impl PathFinderOptions {
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }

    pub fn with_weight_fn(mut self, weight_fn: WeightFn) -> Self {
        self.weight_fn = weight_fn;
        self
    }

    pub fn with_zero_weight(mut self, policy: ZeroWeightPolicy) -> Self {
        self.zero_weight = policy;
        self
    }

    pub fn with_edge_data(mut self, reducer: Arc<dyn EdgeDataReducer>) -> Self {
        self.edge_data = Some(reducer);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Reject settings that cannot produce meaningful vertex keys
    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(Error::InvalidInput(format!(
                "precision {} exceeds the maximum of {MAX_PRECISION} decimal places",
                self.precision
            )));
        }
        Ok(())
    }

    pub fn keyer(&self) -> CoordinateKeyer {
        match &self.key_fn {
            Some(key_fn) => CoordinateKeyer::new(self.precision, Arc::clone(key_fn)),
            None => CoordinateKeyer::with_precision(self.precision),
        }
    }

    pub(crate) fn report(&self, phase: Phase, index: usize, total: usize) {
        if index % PROGRESS_INTERVAL != 0 {
            return;
        }
        if let Some(progress) = &self.progress {
            progress(phase, index, total);
        }
    }
}

impl Default for PathFinderOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            key_fn: None,
            weight_fn: DistanceWeight::default().into_weight_fn(),
            zero_weight: ZeroWeightPolicy::default(),
            edge_data: None,
            progress: None,
        }
    }
}

impl fmt::Debug for PathFinderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFinderOptions")
            .field("precision", &self.precision)
            .field("custom_key_fn", &self.key_fn.is_some())
            .field("zero_weight", &self.zero_weight)
            .field("edge_data", &self.edge_data.is_some())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
