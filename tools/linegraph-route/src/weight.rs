//! Edge weighting
//!
//! A weight function sees both endpoint coordinates of a raw edge plus the
//! properties of the line it belongs to, and answers with either one weight for
//! both directions or an independent weight per direction. A missing direction
//! means there is no edge that way.

use linegraph_common::{Coordinate, Error};
use std::str::FromStr;
use std::sync::Arc;

use crate::geo::haversine_distance;
use crate::topology::Properties;

/// Property holding the per-line weight factor
pub const DEFAULT_WEIGHT_PROPERTY: &str = "weight";

/// Property holding the one-way flag
pub const DEFAULT_ONEWAY_PROPERTY: &str = "oneway";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Weight {
    Symmetric(f64),
    Directional {
        forward: Option<f64>,
        backward: Option<f64>,
    },
}

impl Weight {
    pub fn forward(&self) -> Option<f64> {
        match *self {
            Weight::Symmetric(w) => Some(w),
            Weight::Directional { forward, .. } => forward,
        }
    }

    pub fn backward(&self) -> Option<f64> {
        match *self {
            Weight::Symmetric(w) => Some(w),
            Weight::Directional { backward, .. } => backward,
        }
    }
}

pub type WeightFn = Arc<dyn Fn(Coordinate, Coordinate, &Properties) -> Weight + Send + Sync>;

/// How a weight of exactly zero is interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZeroWeightPolicy {
    /// Zero means the direction cannot be traversed
    #[default]
    Impassable,
    /// Zero is a legitimate, free traversal
    Free,
}

impl ZeroWeightPolicy {
    /// Filter one direction's weight down to what may enter the graph
    pub fn admit(self, weight: Option<f64>) -> Option<f64> {
        let w = weight?;
        if !w.is_finite() || w < 0.0 {
            tracing::warn!(weight = w, "dropping edge with invalid weight");
            return None;
        }
        if w == 0.0 && self == ZeroWeightPolicy::Impassable {
            return None;
        }
        Some(w)
    }
}

impl FromStr for ZeroWeightPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "impassable" => Ok(ZeroWeightPolicy::Impassable),
            "free" => Ok(ZeroWeightPolicy::Free),
            other => Err(Error::InvalidInput(format!(
                "unknown zero-weight policy '{other}' (expected 'impassable' or 'free')"
            ))),
        }
    }
}

/// Numeric weight factor of a line, 1.0 when absent or unusable
pub fn weight_factor(properties: &Properties, property: &str) -> f64 {
    properties
        .get(property)
        .and_then(serde_json::Value::as_f64)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .unwrap_or(1.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Oneway {
    No,
    Forward,
    Backward,
}

fn oneway(properties: &Properties, property: &str) -> Oneway {
    match properties.get(property) {
        Some(serde_json::Value::Bool(true)) => Oneway::Forward,
        Some(serde_json::Value::String(s)) => match s.as_str() {
            "yes" | "true" | "1" => Oneway::Forward,
            "-1" | "reverse" => Oneway::Backward,
            _ => Oneway::No,
        },
        Some(serde_json::Value::Number(n)) if n.as_i64() == Some(1) => Oneway::Forward,
        Some(serde_json::Value::Number(n)) if n.as_i64() == Some(-1) => Oneway::Backward,
        _ => Oneway::No,
    }
}

/// Default weighting: haversine metres times the line's weight factor
#[derive(Clone, Debug)]
pub struct DistanceWeight {
    weight_property: String,
    oneway_property: String,
}

impl DistanceWeight {
    pub fn new(weight_property: impl Into<String>) -> Self {
        Self {
            weight_property: weight_property.into(),
            oneway_property: DEFAULT_ONEWAY_PROPERTY.to_string(),
        }
    }

    pub fn with_oneway_property(mut self, property: impl Into<String>) -> Self {
        self.oneway_property = property.into();
        self
    }

    pub fn weigh(&self, a: Coordinate, b: Coordinate, properties: &Properties) -> Weight {
        let w = haversine_distance(a, b) * weight_factor(properties, &self.weight_property);
        match oneway(properties, &self.oneway_property) {
            Oneway::No => Weight::Symmetric(w),
            Oneway::Forward => Weight::Directional {
                forward: Some(w),
                backward: None,
            },
            Oneway::Backward => Weight::Directional {
                forward: None,
                backward: Some(w),
            },
        }
    }

    pub fn into_weight_fn(self) -> WeightFn {
        Arc::new(move |a: Coordinate, b: Coordinate, properties: &Properties| {
            self.weigh(a, b, properties)
        })
    }
}

impl Default for DistanceWeight {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHT_PROPERTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_weight_policy_decides_free_edges() {
        assert_eq!(ZeroWeightPolicy::Impassable.admit(Some(0.0)), None);
        assert_eq!(ZeroWeightPolicy::Free.admit(Some(0.0)), Some(0.0));
        assert_eq!(ZeroWeightPolicy::Free.admit(Some(-1.0)), None);
        assert_eq!(ZeroWeightPolicy::Free.admit(Some(f64::NAN)), None);
        assert_eq!(ZeroWeightPolicy::Impassable.admit(None), None);
        assert_eq!(ZeroWeightPolicy::Impassable.admit(Some(2.5)), Some(2.5));
    }

    #[test]
    fn policy_parses_from_cli_strings() {
        assert_eq!("free".parse::<ZeroWeightPolicy>().unwrap(), ZeroWeightPolicy::Free);
        assert_eq!("Impassable".parse::<ZeroWeightPolicy>().unwrap(), ZeroWeightPolicy::Impassable);
        assert!("sometimes".parse::<ZeroWeightPolicy>().is_err());
    }

    #[test]
    fn distance_weight_applies_factor_and_oneway() {
        let weighting = DistanceWeight::default();
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.001);
        let base = haversine_distance(a, b);

        assert_eq!(weighting.weigh(a, b, &json!({})), Weight::Symmetric(base));
        assert_eq!(weighting.weigh(a, b, &json!({"weight": 3})), Weight::Symmetric(base * 3.0));

        let forward_only = weighting.weigh(a, b, &json!({"oneway": "yes"}));
        assert_eq!(forward_only.forward(), Some(base));
        assert_eq!(forward_only.backward(), None);

        let backward_only = weighting.weigh(a, b, &json!({"oneway": -1}));
        assert_eq!(backward_only.forward(), None);
        assert_eq!(backward_only.backward(), Some(base));
    }

    #[test]
    fn unusable_weight_factors_fall_back_to_one() {
        assert_eq!(weight_factor(&json!({"weight": "fast"}), "weight"), 1.0);
        assert_eq!(weight_factor(&json!({"weight": -2.0}), "weight"), 1.0);
        assert_eq!(weight_factor(&serde_json::Value::Null, "weight"), 1.0);
        assert_eq!(weight_factor(&json!({"cost": 0.5}), "cost"), 0.5);
    }
}
