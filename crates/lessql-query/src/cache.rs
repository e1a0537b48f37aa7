//! Caching of fetched query results.
//!
//! Results are keyed by a query's canonical definition (see
//! [`Select::definition`](crate::Select::definition)) so queries with the same
//! shape share one fetch.

use std::collections::HashMap;

/// Cache of fetched results, keyed by query definition.
///
/// There is no eviction: a cache lives exactly as long as the root result
/// (or unbound row) that owns it.
///
/// # Example
///
/// ```
/// use lessql_query::cache::QueryCache;
///
/// let mut cache = QueryCache::new();
/// assert_eq!(cache.get("SELECT * FROM `post`"), None);
///
/// cache.insert("SELECT * FROM `post`", vec![11, 12]);
/// assert_eq!(cache.get("SELECT * FROM `post`"), Some(vec![11, 12]));
/// ```
#[derive(Debug, Clone)]
pub struct QueryCache<T> {
    entries: HashMap<String, T>,
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get a cached value.
    pub fn get(&self, definition: &str) -> Option<T> {
        self.entries.get(definition).cloned()
    }

    /// Store a value, replacing any previous one for the definition.
    pub fn insert(&mut self, definition: impl Into<String>, value: T) {
        self.entries.insert(definition.into(), value);
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
