use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::record::Record;
use crate::database::repository::{not_found, ListQuery, Repository, SortDirection};

/// Process-local repository used for development and tests. Records keep
/// insertion order unless the query asks for another.
pub struct MemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_document<T: Record>(record: &T) -> Result<Value, DatabaseError> {
    serde_json::to_value(record).map_err(|e| DatabaseError::QueryError(e.to_string()))
}

fn matches(document: &Value, filters: &[(String, Value)]) -> bool {
    filters.iter().all(|(field, expected)| {
        let actual = document.get(field).unwrap_or(&Value::Null);
        actual == expected
    })
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        // Nulls sort last
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        let records = self.records.read().await;

        let mut selected = Vec::new();
        for record in records.iter() {
            let document = to_document(record)?;
            if matches(&document, &query.filters) {
                selected.push((document, record.clone()));
            }
        }

        if let Some((field, direction)) = &query.order {
            // Stable sort keeps insertion order among equal keys
            selected.sort_by(|(a, _), (b, _)| {
                let ordering = compare_values(
                    a.get(field).unwrap_or(&Value::Null),
                    b.get(field).unwrap_or(&Value::Null),
                );
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let iter = selected.into_iter().map(|(_, record)| record);
        Ok(match query.page {
            Some(page) => iter.skip(page.skip as usize).take(page.limit as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn get(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| not_found::<T>(id))
    }

    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(DatabaseError::Conflict(format!(
                "{} record {} already exists",
                T::TABLE,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| not_found::<T>(record.id()))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<T, DatabaseError> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| not_found::<T>(id))?;
        Ok(records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Comment, CommentInput};
    use crate::types::Page;

    fn comment(story_id: Uuid, parent_id: Option<Uuid>, body: &str) -> Comment {
        Comment::create(
            CommentInput {
                story_id,
                parent_id,
                body: body.to_string(),
            },
            Uuid::new_v4(),
            "Tester".to_string(),
        )
    }

    #[tokio::test]
    async fn test_filters_and_null_match() {
        let repo = MemoryRepository::<Comment>::new();
        let story = Uuid::new_v4();
        let root = repo.insert(comment(story, None, "root")).await.unwrap();
        repo.insert(comment(story, Some(root.id), "reply")).await.unwrap();
        repo.insert(comment(Uuid::new_v4(), None, "elsewhere")).await.unwrap();

        let top_level = repo
            .list(&ListQuery::new().filter("story_id", story.to_string()).filter("parent_id", Value::Null))
            .await
            .unwrap();
        assert_eq!(top_level.len(), 1);
        assert_eq!(top_level[0].body, "root");
    }

    #[tokio::test]
    async fn test_paging_and_order() {
        let repo = MemoryRepository::<Comment>::new();
        let story = Uuid::new_v4();
        for body in ["a", "b", "c", "d"] {
            repo.insert(comment(story, None, body)).await.unwrap();
        }

        let page = repo
            .list(&ListQuery::new().order_by("body", SortDirection::Desc).page(Page::new(2, 1)))
            .await
            .unwrap();
        let bodies: Vec<_> = page.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = MemoryRepository::<Comment>::new();
        let missing = comment(Uuid::new_v4(), None, "ghost");
        assert!(matches!(repo.update(missing.clone()).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(repo.delete(missing.id).await, Err(DatabaseError::NotFound(_))));
        assert!(!repo.exists(missing.id).await.unwrap());
    }
}
