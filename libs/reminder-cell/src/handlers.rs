use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthContext;
use shared_models::error::AppError;

use crate::models::{CreateReminderRequest, DueRemindersQuery, UpdateReminderStatusRequest};
use crate::services::ReminderService;

#[axum::debug_handler]
pub async fn create_reminder(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.create_reminder(&ctx, request).await?;

    Ok(Json(json!({ "id": reminder.id })))
}

#[axum::debug_handler]
pub async fn get_doctor_reminders(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminders = service.get_doctor_reminders(&ctx).await?;

    Ok(Json(json!({
        "reminders": reminders,
        "total": reminders.len()
    })))
}

#[axum::debug_handler]
pub async fn get_due_reminders(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<DueRemindersQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminders = service.get_due_reminders(&ctx, query.date).await?;

    Ok(Json(json!({
        "reminders": reminders,
        "total": reminders.len()
    })))
}

#[axum::debug_handler]
pub async fn dispatch_due_reminders(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<DueRemindersQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let sent = service.dispatch_due_reminders(&ctx, query.date).await?;

    Ok(Json(json!({ "sent": sent })))
}

#[axum::debug_handler]
pub async fn update_reminder_status(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(reminder_id): Path<Uuid>,
    Json(request): Json<UpdateReminderStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.update_reminder_status(&ctx, reminder_id, request.status).await?;

    Ok(Json(json!(reminder)))
}
