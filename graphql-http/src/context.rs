//! Provide a [`Context`] for the handling of a single HTTP request.
//!
//! Upstream middleware can place a [`Context`] in the extensions of the inbound
//! [`http::Request`]; its entries become the attributes of the [`crate::WebGraphQlRequest`].

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;
use tower::BoxError;

/// Holds [`Context`] entries.
pub(crate) type Entries = Arc<DashMap<String, Value>>;

/// Request attributes, keyed by name.
///
/// Values are stored as JSON so that any serializable value can be attached. Cloning a
/// `Context` is cheap and clones share their entries.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Context {
    entries: Entries,
}

impl Context {
    /// Create a new, empty context.
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert a value, returning the previous value for `key` if there was one.
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> Deserialize<'de> + Serialize,
    {
        match self
            .entries
            .insert(key.into(), serde_json_bytes::to_value(value)?)
        {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json_bytes::from_value(v)?)),
        }
    }

    /// Get a value, deserialized into `V`.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: AsRef<str>,
        V: for<'de> Deserialize<'de>,
    {
        self.entries
            .get(key.as_ref())
            .map(|v| serde_json_bytes::from_value(v.value().clone()))
            .transpose()
            .map_err(|e| e.into())
    }

    pub fn contains_key<K: AsRef<str>>(&self, key: K) -> bool {
        self.entries.contains_key(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A snapshot of the current entries.
    pub fn iter(&self) -> impl Iterator<Item = (String, Value)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
