use std::sync::Arc;
use axum::{middleware, routing::{patch, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn billing_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_invoice).get(get_my_invoices))
        .route("/{invoice_id}/status", patch(update_invoice_status))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
