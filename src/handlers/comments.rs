use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use futures::future::try_join_all;
use serde_json::{json, Value};
use uuid::Uuid;

use super::ensure_exists;
use crate::api::state::AppState;
use crate::database::models::{Comment, CommentInput};
use crate::database::{ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::types::PageQuery;

/// GET /comments/:story_id?limit&skip - top-level comments, oldest first
pub async fn list_for_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Comment>> {
    let query = ListQuery::new()
        .filter("story_id", json!(story_id))
        .filter("parent_id", Value::Null)
        .page(page.resolve(&state.config.pagination));
    Ok(ApiResponse::success(state.stores.comments.list(&query).await?))
}

/// GET /comment-replies/:comment_id?limit&skip
pub async fn replies(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Comment>> {
    let query = ListQuery::new()
        .filter("parent_id", json!(comment_id))
        .page(page.resolve(&state.config.pagination));
    Ok(ApiResponse::success(state.stores.comments.list(&query).await?))
}

/// POST /comments - authored by the caller; replies must target a
/// top-level comment on the same story
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CommentInput>,
) -> ApiResult<Comment> {
    input.validate()?;
    ensure_exists(state.stores.stories.as_ref(), input.story_id, "story_id").await?;

    if let Some(parent_id) = input.parent_id {
        let parent = match state.stores.comments.get(parent_id).await {
            Ok(parent) => parent,
            Err(crate::database::DatabaseError::NotFound(_)) => {
                return Err(ApiError::missing_reference("parent_id", parent_id))
            }
            Err(e) => return Err(e.into()),
        };
        if parent.story_id != input.story_id || parent.parent_id.is_some() {
            return Err(ApiError::bad_request("Replies must answer a top-level comment on the same story"));
        }
    }

    let comment = Comment::create(input, principal.user_id, principal.name.clone());
    let comment = state.stores.comments.insert(comment).await?;
    Ok(ApiResponse::created(comment))
}

/// DELETE /comment/:id - removes the comment and its replies
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Comment> {
    let comment = state.stores.comments.get(id).await?;

    let replies = state
        .stores
        .comments
        .list(&ListQuery::new().filter("parent_id", json!(id)))
        .await?;
    try_join_all(replies.iter().map(|r| state.stores.comments.delete(r.id))).await?;

    state.stores.comments.delete(id).await?;
    Ok(ApiResponse::success(comment))
}
