use std::sync::Arc;
use axum::{middleware, routing::{get, patch, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn reminder_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_reminder).get(get_doctor_reminders))
        .route("/due", get(get_due_reminders))
        .route("/due/dispatch", post(dispatch_due_reminders))
        .route("/{reminder_id}/status", patch(update_reminder_status))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
