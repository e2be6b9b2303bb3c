//! Multi-valued dictionary.
//!
//! A thin wrapper around `im` persistent collections: cloning a `MultiDict`
//! is O(1), so search contexts and entity definitions can be shared freely.

use std::fmt;
use std::iter::FromIterator;

/// A map from each key to an ordered list of values.
///
/// Keys iterate in sorted order; values under a key keep insertion order.
#[derive(Clone)]
pub struct MultiDict<K, V>(im::OrdMap<K, im::Vector<V>>)
where
    K: Clone + Ord,
    V: Clone;

impl<K: Clone + Ord, V: Clone> MultiDict<K, V> {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self(im::OrdMap::new())
    }

    /// Appends a value under `key`.
    pub fn insert(&mut self, key: K, value: V) {
        self.0
            .entry(key)
            .or_insert_with(im::Vector::new)
            .push_back(value);
    }

    /// Returns a new dictionary with the value appended.
    #[must_use]
    pub fn with(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the values stored under `key`, in insertion order.
    pub fn get<'a>(&'a self, key: &K) -> impl Iterator<Item = &'a V> + use<'a, K, V> {
        self.0.get(key).into_iter().flat_map(im::Vector::iter)
    }

    /// Returns true if at least one value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.0.get(key).is_some_and(|values| !values.is_empty())
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.keys()
    }

    /// Returns every value, grouped by key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values().flat_map(im::Vector::iter)
    }

    /// Returns an iterator over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k, v)))
    }

    /// Returns the total number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(im::Vector::len).sum()
    }

    /// Returns true if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Clone + Ord, V: Clone> Default for MultiDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Ord + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for MultiDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Clone + Ord, V: Clone> FromIterator<(K, V)> for MultiDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}
