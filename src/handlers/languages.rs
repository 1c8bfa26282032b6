use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::database::models::{Language, LanguageInput};
use crate::database::{ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct LanguageFilter {
    pub active: Option<bool>,
}

async fn ensure_code_free(state: &AppState, code: &str, except: Option<Uuid>) -> Result<(), ApiError> {
    let existing = state
        .stores
        .languages
        .find_one(&ListQuery::new().filter("code", code.trim().to_lowercase()))
        .await?;
    match existing {
        Some(language) if Some(language.id) != except => {
            Err(ApiError::conflict(format!("Language code '{}' is already in use", language.code)))
        }
        _ => Ok(()),
    }
}

/// GET /fetch-languages
pub async fn list(State(state): State<AppState>, Query(filter): Query<LanguageFilter>) -> ApiResult<Vec<Language>> {
    let query = ListQuery::new().filter_opt("is_active", filter.active);
    Ok(ApiResponse::success(state.stores.languages.list(&query).await?))
}

/// GET /fetch-languages/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Language> {
    Ok(ApiResponse::success(state.stores.languages.get(id).await?))
}

/// POST /languages
pub async fn create(State(state): State<AppState>, Json(input): Json<LanguageInput>) -> ApiResult<Language> {
    input.validate()?;
    ensure_code_free(&state, &input.code, None).await?;

    let language = state.stores.languages.insert(Language::create(input)).await?;
    Ok(ApiResponse::created(language))
}

/// PUT /languages/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<LanguageInput>,
) -> ApiResult<Language> {
    input.validate()?;
    let mut language = state.stores.languages.get(id).await?;
    ensure_code_free(&state, &input.code, Some(id)).await?;

    language.apply(input);
    Ok(ApiResponse::success(state.stores.languages.update(language).await?))
}

/// DELETE /languages/:id - refused while categories or stories use it
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Language> {
    let by_language = ListQuery::new().filter("language_id", json!(id));
    let in_use = state.stores.categories.find_one(&by_language).await?.is_some()
        || state.stores.stories.find_one(&by_language).await?.is_some();
    if in_use {
        return Err(ApiError::conflict("Language is still used by categories or stories"));
    }

    Ok(ApiResponse::success(state.stores.languages.delete(id).await?))
}
