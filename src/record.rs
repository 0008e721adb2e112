// Generic record trait for any storable type

use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Positive integer identifier, unique within the collection
    fn id(&self) -> u64;

    /// Collection name for this record type (e.g., "favorites", "comments")
    /// Determines the document filename `{collection}.json` and the array key inside it
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields exposed to `Filter` evaluation
    /// Return empty HashMap if the record is never filtered
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// Value types that can be indexed for filtering
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
}

/// Next identifier for a collection: one past the largest id in use
pub fn next_id<T: Record>(records: &[T]) -> u64 {
    records.iter().map(|r| r.id()).max().unwrap_or(0) + 1
}
