use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Row};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::record::{is_valid_identifier, Record};
use crate::database::repository::{not_found, ListQuery, Repository, SortDirection};

/// Postgres repository storing each record as a JSONB document in the
/// table named by `T::TABLE`.
pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T: Record> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    fn table() -> String {
        DatabaseManager::quote_identifier(T::TABLE)
    }

    /// Build the SELECT for a list query. Filter values are bound as
    /// parameters; field names are validated and embedded as literals.
    fn build_select(query: &ListQuery) -> Result<(String, Vec<Value>), DatabaseError> {
        let mut sql = format!("SELECT data FROM {}", Self::table());
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        for (field, value) in &query.filters {
            if !is_valid_identifier(field) {
                return Err(DatabaseError::InvalidIdentifier(field.clone()));
            }
            if value.is_null() {
                clauses.push(format!("(data->'{0}' IS NULL OR data->'{0}' = 'null'::jsonb)", field));
            } else {
                params.push(value.clone());
                clauses.push(format!("data->'{}' = ${}", field, params.len()));
            }
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        match &query.order {
            Some((field, direction)) => {
                if !is_valid_identifier(field) {
                    return Err(DatabaseError::InvalidIdentifier(field.clone()));
                }
                let dir = match direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                sql.push_str(&format!(" ORDER BY data->'{}' {} NULLS LAST, created_at ASC", field, dir));
            }
            None => sql.push_str(" ORDER BY created_at ASC"),
        }

        if let Some(page) = query.page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.limit, page.skip));
        }

        Ok((sql, params))
    }

    fn decode(row: &sqlx::postgres::PgRow) -> Result<T, DatabaseError> {
        let Json(record): Json<T> = row.try_get("data")?;
        Ok(record)
    }
}

#[async_trait]
impl<T: Record> Repository<T> for PgRepository<T> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>, DatabaseError> {
        let (sql, params) = Self::build_select(query)?;

        let mut q = sqlx::query(&sql);
        for param in params {
            q = q.bind(Json(param));
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(Self::decode).collect()
    }

    async fn get(&self, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", Self::table());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;
        Self::decode(&row)
    }

    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        let sql = format!("INSERT INTO {} (id, data) VALUES ($1, $2)", Self::table());
        sqlx::query(&sql)
            .bind(record.id())
            .bind(Json(&record))
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Conflict(
                    format!("{} record {} already exists", T::TABLE, record.id()),
                ),
                _ => DatabaseError::Sqlx(e),
            })?;
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        let sql = format!("UPDATE {} SET data = $2 WHERE id = $1", Self::table());
        let result = sqlx::query(&sql)
            .bind(record.id())
            .bind(Json(&record))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<T>(record.id()));
        }
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING data", Self::table());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;
        Self::decode(&row)
    }
}
