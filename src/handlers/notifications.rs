use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::database::models::{NotificationInput, PushNotification};
use crate::database::{ListQuery, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /notifications
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<PushNotification>> {
    Ok(ApiResponse::success(state.stores.notifications.list(&ListQuery::new()).await?))
}

/// POST /notifications - store, dispatch, then record the send time
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NotificationInput>,
) -> ApiResult<PushNotification> {
    input.validate()?;
    let mut notification = state.stores.notifications.insert(PushNotification::create(input)).await?;

    if let Err(e) = state.push.send(&notification).await {
        tracing::error!("Push dispatch failed for notification {}: {}", notification.id, e);
        return Err(ApiError::bad_gateway(format!(
            "Notification {} was saved but could not be sent",
            notification.id
        )));
    }

    notification.sent_at = Some(Utc::now());
    notification.updated_at = Utc::now();
    let notification = state.stores.notifications.update(notification).await?;
    Ok(ApiResponse::created(notification))
}

/// DELETE /notifications/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PushNotification> {
    Ok(ApiResponse::success(state.stores.notifications.delete(id).await?))
}
