use std::sync::Arc;
use axum::{middleware, routing::{get, patch, put}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn profile_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/me", get(get_current_user_profile).post(create_user_profile).put(update_user_profile))
        .route("/doctors", get(get_active_doctors))
        .route("/doctor/status", patch(update_doctor_status))
        .route("/doctor/schedule", put(update_doctor_schedule))
        .route("/patient", get(get_my_patient_profile))
        .route("/patient/medical-history", put(update_medical_history))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
