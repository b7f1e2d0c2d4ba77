use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Row store backend error: {0}")]
    Backend(String),
    #[error("Row in '{collection}' failed to encode or decode: {source}")]
    Codec {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Row '{id}' not found in '{collection}'")]
    Missing { collection: String, id: String },
}

/// Generic keyed storage over named record collections.
///
/// The engine only ever needs find-by-id and upsert; everything else about
/// the backend (SQL, document store, files) stays behind this trait. Rows
/// travel as JSON values so the trait stays object-safe; [`fetch`] and
/// [`put`] add the typed surface.
pub trait RowStore {
    fn find(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;
    fn upsert(&self, collection: &str, id: &str, row: Value) -> Result<(), StoreError>;
}

/// Typed read through a [`RowStore`].
pub fn fetch<T: DeserializeOwned>(
    store: &dyn RowStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.find(collection, id)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Codec {
                collection: collection.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Typed write through a [`RowStore`].
pub fn put<T: Serialize>(
    store: &dyn RowStore,
    collection: &str,
    id: &str,
    row: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(row).map_err(|source| StoreError::Codec {
        collection: collection.to_string(),
        source,
    })?;
    store.upsert(collection, id, value)
}

/// In-memory row store for tests and embedding without a backend.
///
/// Interior mutability keeps the trait's `&self` surface; the engine is
/// single-threaded by design, so `RefCell` suffices.
#[derive(Default)]
pub struct InMemoryRowStore {
    collections: RefCell<HashMap<String, BTreeMap<String, Value>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows of a collection in key order; test convenience.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .borrow()
            .get(collection)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .borrow()
            .get(collection)
            .map_or(0, |rows| rows.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl RowStore for InMemoryRowStore {
    fn find(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .collections
            .borrow()
            .get(collection)
            .and_then(|rows| rows.get(id).cloned()))
    }

    fn upsert(&self, collection: &str, id: &str, row: Value) -> Result<(), StoreError> {
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), row);
        Ok(())
    }
}
