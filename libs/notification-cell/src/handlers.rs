use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthContext;
use shared_models::error::AppError;

use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn get_my_notifications(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let notifications = service.get_my_notifications(&ctx).await?;

    Ok(Json(json!({
        "notifications": notifications,
        "total": notifications.len()
    })))
}

#[axum::debug_handler]
pub async fn get_unread_count(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let count = service.get_unread_count(&ctx).await?;

    Ok(Json(json!({ "count": count })))
}

#[axum::debug_handler]
pub async fn mark_as_read(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let notification = service.mark_as_read(&ctx, notification_id).await?;

    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_as_read(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let updated = service.mark_all_as_read(&ctx).await?;

    Ok(Json(json!({ "updated": updated })))
}
