use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// A persisted document. Each record type lives in its own table and is
/// addressed by its `id`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table (or in-memory collection) name
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
}

/// Validate a field or table name before it is spliced into SQL.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name.chars().next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
