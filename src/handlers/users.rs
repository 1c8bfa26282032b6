use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::auth::password::hash_password;
use crate::database::models::user::normalize_email;
use crate::database::models::{User, UserInput, UserUpdate, UserView};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Principal};

async fn ensure_email_free(state: &AppState, email: &str, except: Option<Uuid>) -> Result<(), ApiError> {
    let existing = state
        .stores
        .users
        .find_one(&ListQuery::new().filter("email", normalize_email(email)))
        .await?;
    match existing {
        Some(user) if Some(user.id) != except => Err(ApiError::conflict("An account with this email already exists")),
        _ => Ok(()),
    }
}

/// GET /users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    let users = state.stores.users.list(&ListQuery::new()).await?;
    Ok(ApiResponse::success(users.iter().map(User::view).collect()))
}

/// GET /users/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<UserView> {
    let user = state.stores.users.get(id).await?;
    Ok(ApiResponse::success(user.view()))
}

/// POST /users
pub async fn create(State(state): State<AppState>, Json(input): Json<UserInput>) -> ApiResult<UserView> {
    input.validate()?;
    ensure_email_free(&state, &input.email, None).await?;

    let user = User::create(
        &input.name,
        &input.email,
        hash_password(&input.password)?,
        input.permissions,
        input.is_active,
    );
    let user = state.stores.users.insert(user).await?;

    tracing::info!("Created user {}", user.id);
    Ok(ApiResponse::created(user.view()))
}

/// PUT /users/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UserUpdate>,
) -> ApiResult<UserView> {
    input.validate()?;
    let mut user = state.stores.users.get(id).await?;
    ensure_email_free(&state, &input.email, Some(id)).await?;

    let password_hash = input.password.as_deref().map(hash_password).transpose()?;
    user.apply(input, password_hash);
    let user = state.stores.users.update(user).await?;

    Ok(ApiResponse::success(user.view()))
}

/// DELETE /users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserView> {
    if principal.user_id == id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }

    let user = state.stores.users.delete(id).await?;
    tracing::info!("User {} deleted by {}", user.id, principal.user_id);
    Ok(ApiResponse::success(user.view()))
}
