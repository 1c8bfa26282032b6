use axum::{
    extract::{Path, Query, State},
    Json,
};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ensure_exists;
use crate::api::state::AppState;
use crate::database::models::{Category, Story, StoryInput};
use crate::database::{ListQuery, Repository, SortDirection};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::PageQuery;

#[derive(Debug, Default, Deserialize)]
pub struct StoryFilter {
    pub category_id: Option<Uuid>,
    pub language_id: Option<Uuid>,
    pub published: Option<bool>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

/// Category must exist and share the story's language
async fn check_references(state: &AppState, input: &StoryInput) -> Result<(), ApiError> {
    ensure_exists(state.stores.languages.as_ref(), input.language_id, "language_id").await?;
    let category: Category = match state.stores.categories.get(input.category_id).await {
        Ok(category) => category,
        Err(crate::database::DatabaseError::NotFound(_)) => {
            return Err(ApiError::missing_reference("category_id", input.category_id))
        }
        Err(e) => return Err(e.into()),
    };
    if category.language_id != input.language_id {
        let mut field_errors = std::collections::HashMap::new();
        field_errors.insert(
            "category_id".to_string(),
            "Category belongs to a different language".to_string(),
        );
        return Err(ApiError::unprocessable_entity("Invalid reference", field_errors));
    }
    Ok(())
}

/// GET /story-list - ordered by `sort_order`
pub async fn list(State(state): State<AppState>, Query(filter): Query<StoryFilter>) -> ApiResult<Vec<Story>> {
    let page = PageQuery {
        limit: filter.limit,
        skip: filter.skip,
    };
    let mut query = ListQuery::new()
        .filter_opt("category_id", filter.category_id.map(|id| json!(id)))
        .filter_opt("language_id", filter.language_id.map(|id| json!(id)))
        .filter_opt("is_published", filter.published)
        .order_by("sort_order", SortDirection::Asc);
    if filter.limit.is_some() || filter.skip.is_some() {
        query = query.page(page.resolve(&state.config.pagination));
    }

    Ok(ApiResponse::success(state.stores.stories.list(&query).await?))
}

/// GET /story-by-id-admin/:id - includes unpublished stories
pub async fn show_admin(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Story> {
    Ok(ApiResponse::success(state.stores.stories.get(id).await?))
}

/// POST /stories
pub async fn create(State(state): State<AppState>, Json(input): Json<StoryInput>) -> ApiResult<Story> {
    input.validate()?;
    check_references(&state, &input).await?;

    let story = state.stores.stories.insert(Story::create(input)).await?;
    tracing::info!("Created story {} ({})", story.id, story.title);
    Ok(ApiResponse::created(story))
}

/// PUT /stories/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StoryInput>,
) -> ApiResult<Story> {
    input.validate()?;
    let mut story = state.stores.stories.get(id).await?;
    check_references(&state, &input).await?;

    story.apply(input);
    Ok(ApiResponse::success(state.stores.stories.update(story).await?))
}

/// DELETE /stories/:id - also removes the story's questions and comments
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Story> {
    let story = state.stores.stories.get(id).await?;
    let by_story = ListQuery::new().filter("story_id", json!(id));

    let questions = state.stores.story_questions.list(&by_story).await?;
    try_join_all(questions.iter().map(|q| state.stores.story_questions.delete(q.id))).await?;

    let comments = state.stores.comments.list(&by_story).await?;
    try_join_all(comments.iter().map(|c| state.stores.comments.delete(c.id))).await?;

    state.stores.stories.delete(id).await?;
    tracing::info!(
        "Deleted story {} with {} questions and {} comments",
        story.id,
        questions.len(),
        comments.len()
    );
    Ok(ApiResponse::success(story))
}
