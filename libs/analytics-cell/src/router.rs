use std::sync::Arc;
use axum::{middleware, routing::get, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn analytics_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard_analytics))
        .route("/patients", get(get_patient_analytics))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
