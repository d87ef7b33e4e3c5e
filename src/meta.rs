//! Request-scoped metadata bag.
//!
//! Upstream middleware stores values in the [`Meta`] bag of a request's
//! extensions; handlers receive a copy through a `meta` request field.
//!
//! ```rust
//! use axum::{extract::Request, middleware::Next, response::Response};
//! use axum_bind::MetaExt;
//!
//! async fn tag_user(mut req: Request, next: Next) -> Response {
//!     req.meta_mut().set("user_id", 42);
//!     next.run(req).await
//! }
//! ```

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::collections::BTreeMap,
};

/// String-keyed bag of arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta(BTreeMap<String, Value>);

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics when the key is absent. Use it for keys an upstream middleware
    /// guarantees to set.
    pub fn must_get(&self, key: &str) -> &Value {
        match self.0.get(key) {
            Some(value) => value,
            None => panic!("meta key `{key}` is not set"),
        }
    }

    /// Stores `value` under `key`, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Meta(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Access to the [`Meta`] bag stored in request extensions.
pub trait MetaExt {
    /// The bag, if any middleware created one.
    fn meta(&self) -> Option<&Meta>;

    /// The bag, created empty on first access.
    fn meta_mut(&mut self) -> &mut Meta;
}

impl MetaExt for http::Extensions {
    fn meta(&self) -> Option<&Meta> {
        self.get::<Meta>()
    }

    fn meta_mut(&mut self) -> &mut Meta {
        self.get_or_insert_default::<Meta>()
    }
}

impl<B> MetaExt for http::Request<B> {
    fn meta(&self) -> Option<&Meta> {
        self.extensions().meta()
    }

    fn meta_mut(&mut self) -> &mut Meta {
        self.extensions_mut().meta_mut()
    }
}
