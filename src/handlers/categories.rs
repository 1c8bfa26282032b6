use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ensure_exists;
use crate::api::state::AppState;
use crate::database::models::{Category, CategoryInput};
use crate::database::{ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub language_id: Option<Uuid>,
    pub active: Option<bool>,
}

/// GET /categories
pub async fn list(State(state): State<AppState>, Query(filter): Query<CategoryFilter>) -> ApiResult<Vec<Category>> {
    let query = ListQuery::new()
        .filter_opt("language_id", filter.language_id.map(|id| json!(id)))
        .filter_opt("is_active", filter.active);
    Ok(ApiResponse::success(state.stores.categories.list(&query).await?))
}

/// GET /categories/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Category> {
    Ok(ApiResponse::success(state.stores.categories.get(id).await?))
}

/// POST /categories
pub async fn create(State(state): State<AppState>, Json(input): Json<CategoryInput>) -> ApiResult<Category> {
    input.validate()?;
    ensure_exists(state.stores.languages.as_ref(), input.language_id, "language_id").await?;

    let category = state.stores.categories.insert(Category::create(input)).await?;
    Ok(ApiResponse::created(category))
}

/// PUT /categories/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Category> {
    input.validate()?;
    let mut category = state.stores.categories.get(id).await?;
    ensure_exists(state.stores.languages.as_ref(), input.language_id, "language_id").await?;

    category.apply(input);
    Ok(ApiResponse::success(state.stores.categories.update(category).await?))
}

/// DELETE /categories/:id - refused while stories belong to it
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Category> {
    let stories = ListQuery::new().filter("category_id", json!(id));
    if state.stores.stories.find_one(&stories).await?.is_some() {
        return Err(ApiError::conflict("Category still contains stories"));
    }

    Ok(ApiResponse::success(state.stores.categories.delete(id).await?))
}
