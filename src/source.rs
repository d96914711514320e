//! Read-only views over a request's string-keyed parameters.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;

/// Uniform read-only access to a parameter set.
///
/// Names are case-sensitive. Absent names yield `None`/`false`, never a panic.
/// The validation pipeline only borrows a source for the duration of one call
/// and never mutates it.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use param_gate::ParamSource;
///
/// let mut params = HashMap::new();
/// params.insert("page".to_string(), "2".to_string());
///
/// assert!(params.has("page"));
/// assert!(!params.has("Page"));
/// assert_eq!(ParamSource::get(&params, "page"), Some("2"));
/// ```
pub trait ParamSource {
    /// Returns the raw value for `name`.
    fn get(&self, name: &str) -> Option<&str>;

    /// Returns all parameter names in enumeration order.
    fn names(&self) -> Vec<&str>;

    /// Returns every raw value for `name` in arrival order.
    ///
    /// Sources with one value per key return at most one entry.
    fn get_all(&self, name: &str) -> Vec<&str> {
        self.get(name).into_iter().collect()
    }

    /// Returns `true` if `name` is present.
    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the request body, if the source has one. Used only for failure reports.
    fn body(&self) -> Option<&str> {
        None
    }
}

impl<S: BuildHasher> ParamSource for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        BTreeMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

impl<S: BuildHasher> ParamSource for IndexMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        IndexMap::get(self, name).map(String::as_str)
    }

    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

impl<T: ParamSource + ?Sized> ParamSource for &T {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }

    fn names(&self) -> Vec<&str> {
        (**self).names()
    }

    fn get_all(&self, name: &str) -> Vec<&str> {
        (**self).get_all(name)
    }

    fn has(&self, name: &str) -> bool {
        (**self).has(name)
    }

    fn body(&self) -> Option<&str> {
        (**self).body()
    }
}

/// Ordered, multi-valued parameter set.
///
/// Repeated keys keep every value; [`ParamSource::get`] returns the last one
/// and names enumerate in first-seen order.
///
/// # Examples
///
/// ```
/// use param_gate::{ParamSource, QueryParams};
///
/// let params: QueryParams = [("tag", "a"), ("page", "1"), ("tag", "b")].into_iter().collect();
///
/// assert_eq!(params.get("tag"), Some("b"));
/// assert_eq!(params.get_all("tag"), ["a", "b"]);
/// assert_eq!(params.names(), ["tag", "page"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: IndexMap<String, Vec<String>>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces every value for `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Removes `key` and returns its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(key)
    }

    /// Returns every value for `key`, oldest first.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, last value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, values)| values.last().map(|v| (k.as_str(), v.as_str())))
    }

    /// Copies any parameter source into an owned set, keeping repeated values.
    pub fn snapshot(source: &dyn ParamSource) -> Self {
        source
            .names()
            .into_iter()
            .flat_map(|name| {
                source
                    .get_all(name)
                    .into_iter()
                    .map(move |value| (name, value))
            })
            .collect()
    }
}

impl ParamSource for QueryParams {
    fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .get(name)
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
