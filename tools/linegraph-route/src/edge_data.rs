//! Edge metadata reduction
//!
//! Each raw edge gets `reduce(seed, properties)`. Compacted edges fold the
//! values of their raw edges, in travel order, with `merge`.

use serde_json::Value;

use crate::topology::Properties;

/// Reduced metadata of a raw or compacted edge
pub type EdgeData = Value;

pub trait EdgeDataReducer: Send + Sync {
    fn seed(&self) -> EdgeData;

    /// Fold one line's properties into an accumulator
    fn reduce(&self, acc: &EdgeData, properties: &Properties) -> EdgeData;

    /// Combine two accumulated values; must be associative
    fn merge(&self, left: &EdgeData, right: &EdgeData) -> EdgeData;

    fn edge_value(&self, properties: &Properties) -> EdgeData {
        self.reduce(&self.seed(), properties)
    }
}

/// Left fold of `merge` over the values of a chain, `None` for an empty chain
pub(crate) fn fold_chain<'a, I>(reducer: &dyn EdgeDataReducer, values: I) -> Option<EdgeData>
where
    I: IntoIterator<Item = &'a EdgeData>,
{
    let mut values = values.into_iter();
    let first = values.next()?.clone();
    Some(values.fold(first, |acc, value| reducer.merge(&acc, value)))
}

/// Collects the distinct values of one property along an edge, in first-seen order
#[derive(Clone, Debug)]
pub struct PropertyCollector {
    property: String,
}

impl PropertyCollector {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

fn push_distinct(items: &mut Vec<Value>, value: &Value) {
    if !value.is_null() && !items.contains(value) {
        items.push(value.clone());
    }
}

impl EdgeDataReducer for PropertyCollector {
    fn seed(&self) -> EdgeData {
        Value::Array(Vec::new())
    }

    fn reduce(&self, acc: &EdgeData, properties: &Properties) -> EdgeData {
        let mut items = acc.as_array().cloned().unwrap_or_default();
        if let Some(value) = properties.get(&self.property) {
            push_distinct(&mut items, value);
        }
        Value::Array(items)
    }

    fn merge(&self, left: &EdgeData, right: &EdgeData) -> EdgeData {
        let mut items = left.as_array().cloned().unwrap_or_default();
        for value in right.as_array().into_iter().flatten() {
            push_distinct(&mut items, value);
        }
        Value::Array(items)
    }
}
