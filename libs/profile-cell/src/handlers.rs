use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthContext;
use shared_models::error::AppError;

use crate::models::{
    CreateUserProfileRequest, UpdateDoctorScheduleRequest, UpdateDoctorStatusRequest,
    UpdateMedicalHistoryRequest, UpdateUserProfileRequest,
};
use crate::services::ProfileService;

#[axum::debug_handler]
pub async fn get_current_user_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.get_current_user_profile(&ctx).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn create_user_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateUserProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.create_user_profile(&ctx, request).await?;

    Ok(Json(json!({ "id": profile.id })))
}

#[axum::debug_handler]
pub async fn update_user_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<UpdateUserProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.update_user_profile(&ctx, request).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn get_active_doctors(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let doctors = service.get_active_doctors(&ctx).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_status(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<UpdateDoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.update_doctor_status(&ctx, request.is_online).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_doctor_schedule(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<UpdateDoctorScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.update_doctor_schedule(&ctx, request).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn get_my_patient_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.get_my_patient_profile(&ctx).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_medical_history(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<UpdateMedicalHistoryRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.update_medical_history(&ctx, request).await?;

    Ok(Json(json!(profile)))
}
