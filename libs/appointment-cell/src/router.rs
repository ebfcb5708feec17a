use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::get_my_appointments))
        .route("/today", get(handlers::get_today_appointments))
        .route("/availability/{doctor_id}", get(handlers::get_available_slots))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
