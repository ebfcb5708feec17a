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

use crate::models::CreateMedicalRecordRequest;
use crate::services::MedicalRecordService;

#[axum::debug_handler]
pub async fn create_medical_record(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    let record = service.create_medical_record(&ctx, request).await?;

    Ok(Json(json!({ "id": record.id })))
}

#[axum::debug_handler]
pub async fn get_patient_medical_records(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    let records = service.get_patient_medical_records(&ctx, patient_id).await?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_records(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    let records = service.get_appointment_records(&ctx, appointment_id).await?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}
