use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn medical_record_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_medical_record))
        .route("/patients/{patient_id}", get(get_patient_medical_records))
        .route("/appointments/{appointment_id}", get(get_appointment_records))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
