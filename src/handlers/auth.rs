use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{permissions, AuthError};
use crate::database::models::user::normalize_email;
use crate::database::models::{LoginRequest, RegisterRequest, User, UserView};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Principal};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserView,
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    Ok(state
        .stores
        .users
        .find_one(&ListQuery::new().filter("email", normalize_email(email)))
        .await?)
}

fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    Ok(TokenResponse {
        token: state.keys.issue(user)?,
        expires_in: state.keys.expiry_seconds(),
        user: user.view(),
    })
}

/// POST /auth/login - exchange email and password for a JWT
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> ApiResult<TokenResponse> {
    let user = find_by_email(&state, &request.email).await?;

    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("Failed login attempt for {}", normalize_email(&request.email));
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !user.is_active {
        return Err(AuthError::InactiveUser.into());
    }

    tracing::info!("User {} logged in", user.id);
    Ok(ApiResponse::success(token_response(&state, &user)?))
}

/// POST /auth/register - self-service reader account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    request.validate()?;

    if find_by_email(&state, &request.email).await?.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let user = User::create(
        &request.name,
        &request.email,
        hash_password(&request.password)?,
        permissions::owned(permissions::DEFAULT_USER_PERMISSIONS),
        true,
    );
    let user = state.stores.users.insert(user).await?;

    tracing::info!("Registered user {}", user.id);
    Ok(ApiResponse::created(token_response(&state, &user)?))
}

/// GET /auth/me - the resolved caller
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
