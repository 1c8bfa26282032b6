use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ensure_exists;
use crate::api::state::AppState;
use crate::database::models::{Question, QuestionInput, StoryQuestion, StoryQuestionInput};
use crate::database::{ListQuery, Repository};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct QuestionFilter {
    pub language_id: Option<Uuid>,
}

// Story questions

/// GET /story-question-list/:story_id
pub async fn list_for_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> ApiResult<Vec<StoryQuestion>> {
    // Distinguish "no questions yet" from "no such story"
    state.stores.stories.get(story_id).await?;

    let query = ListQuery::new().filter("story_id", json!(story_id));
    Ok(ApiResponse::success(state.stores.story_questions.list(&query).await?))
}

/// GET /story-question-by-id-admin/:id
pub async fn show_story_question(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StoryQuestion> {
    Ok(ApiResponse::success(state.stores.story_questions.get(id).await?))
}

/// POST /story-questions
pub async fn create_story_question(
    State(state): State<AppState>,
    Json(input): Json<StoryQuestionInput>,
) -> ApiResult<StoryQuestion> {
    input.validate()?;
    ensure_exists(state.stores.stories.as_ref(), input.story_id, "story_id").await?;

    let question = state.stores.story_questions.insert(StoryQuestion::create(input)).await?;
    Ok(ApiResponse::created(question))
}

/// PUT /story-questions/:id
pub async fn update_story_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StoryQuestionInput>,
) -> ApiResult<StoryQuestion> {
    input.validate()?;
    let mut question = state.stores.story_questions.get(id).await?;
    ensure_exists(state.stores.stories.as_ref(), input.story_id, "story_id").await?;

    question.apply(input);
    Ok(ApiResponse::success(state.stores.story_questions.update(question).await?))
}

/// DELETE /story-questions/:id
pub async fn delete_story_question(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StoryQuestion> {
    Ok(ApiResponse::success(state.stores.story_questions.delete(id).await?))
}

// General questions

/// GET /question-list
pub async fn list(State(state): State<AppState>, Query(filter): Query<QuestionFilter>) -> ApiResult<Vec<Question>> {
    let query = ListQuery::new().filter_opt("language_id", filter.language_id.map(|id| json!(id)));
    Ok(ApiResponse::success(state.stores.questions.list(&query).await?))
}

/// GET /question-by-id-admin/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Question> {
    Ok(ApiResponse::success(state.stores.questions.get(id).await?))
}

/// POST /questions
pub async fn create(State(state): State<AppState>, Json(input): Json<QuestionInput>) -> ApiResult<Question> {
    input.validate()?;
    if let Some(language_id) = input.language_id {
        ensure_exists(state.stores.languages.as_ref(), language_id, "language_id").await?;
    }

    let question = state.stores.questions.insert(Question::create(input)).await?;
    Ok(ApiResponse::created(question))
}

/// PUT /questions/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<Question> {
    input.validate()?;
    let mut question = state.stores.questions.get(id).await?;
    if let Some(language_id) = input.language_id {
        ensure_exists(state.stores.languages.as_ref(), language_id, "language_id").await?;
    }

    question.apply(input);
    Ok(ApiResponse::success(state.stores.questions.update(question).await?))
}

/// DELETE /questions/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Question> {
    Ok(ApiResponse::success(state.stores.questions.delete(id).await?))
}
