use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::record::Record;
use crate::types::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Equality filters, ordering and paging for a collection read.
///
/// Filters match top-level fields of the stored document; a `Value::Null`
/// filter matches records where the field is null or absent.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filters: Vec<(String, Value)>,
    pub order: Option<(String, SortDirection)>,
    pub page: Option<Page>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Add a filter only when a value is present
    pub fn filter_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(field, v),
            None => self,
        }
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Storage for one record type.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError>;

    /// Fetch by id; `DatabaseError::NotFound` when absent
    async fn get(&self, id: Uuid) -> Result<T, DatabaseError>;

    async fn insert(&self, record: T) -> Result<T, DatabaseError>;

    /// Replace the stored record with the same id
    async fn update(&self, record: T) -> Result<T, DatabaseError>;

    /// Remove by id, returning the removed record
    async fn delete(&self, id: Uuid) -> Result<T, DatabaseError>;

    async fn find_one(&self, query: &ListQuery) -> Result<Option<T>, DatabaseError> {
        let query = ListQuery {
            page: Some(Page::new(1, 0)),
            ..query.clone()
        };
        Ok(self.list(&query).await?.into_iter().next())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(DatabaseError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn not_found<T: Record>(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, id))
}
