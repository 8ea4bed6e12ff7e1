// Ordered key/value parameters.
//
// Used both as a GET query string and as a form-urlencoded POST body.
// Serializes as a sequence of `(key, value)` pairs, which is the shape
// `reqwest`'s `query()` and `form()` builders expect.

use serde::Serialize;
use serde_json::{Map, Value};

/// Request parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Append a parameter. Keys are not deduplicated.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.push((key.into(), value.to_string()));
    }

    /// Build from a JSON object, dropping `null` values.
    ///
    /// Strings are taken verbatim; numbers and booleans use their JSON text;
    /// arrays and objects are serialized as compact JSON.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let pairs = object
            .iter()
            .filter_map(|(k, v)| {
                let text = match v {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((k.clone(), text))
            })
            .collect();
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    /// Canonical `k=v&k=v` text with keys sorted, for use in cache keys.
    pub fn canonical(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self.0.iter().collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }
}
