use std::sync::Arc;
use axum::{middleware, routing::{get, patch, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn inventory_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(add_inventory_item).get(get_inventory_items))
        .route("/low-stock", get(get_low_stock_items))
        .route("/{item_id}/quantity", patch(update_inventory_quantity))
        .route("/{item_id}/logs", get(get_item_logs))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
