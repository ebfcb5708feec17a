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

use crate::models::{AvailableSlotsQuery, BookAppointmentRequest, UpdateAppointmentStatusRequest};
use crate::services::{AppointmentBookingService, AppointmentLifecycleService, AvailabilityService};

// ==============================================================================
// AVAILABILITY & BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let slots = service.get_available_slots(&ctx, doctor_id, query.date).await?;

    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.book_appointment(&ctx, request).await?;

    Ok(Json(json!({ "id": appointment.id })))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointments = service.get_my_appointments(&ctx).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_today_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointments = service.get_today_appointments(&ctx).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.get_appointment(&ctx, appointment_id).await?;

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(&state);
    let appointment = service
        .update_appointment_status(&ctx, appointment_id, request.status)
        .await?;

    Ok(Json(json!({ "id": appointment.id, "status": appointment.status })))
}
