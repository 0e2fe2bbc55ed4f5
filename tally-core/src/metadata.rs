use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Numeric side-data returned by an operation, e.g. consumed capacity units or rows affected.
///
/// Merging two `Metadata` values sums them key by key, which is how a run aggregates the
/// metadata of all its successful samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, f64>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn merge(&mut self, other: &Metadata) {
        for (key, value) in &other.0 {
            *self.0.entry(key.clone()).or_insert(0.) += value;
        }
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, f64> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<()> for Metadata {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a f64);
    type IntoIter = btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
