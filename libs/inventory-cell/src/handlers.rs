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

use crate::models::{AddInventoryItemRequest, InventoryQuery, UpdateQuantityRequest};
use crate::services::InventoryService;

#[axum::debug_handler]
pub async fn add_inventory_item(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<AddInventoryItemRequest>,
) -> Result<Json<Value>, AppError> {
    let service = InventoryService::new(&state);
    let item = service.add_inventory_item(&ctx, request).await?;

    Ok(Json(json!({ "id": item.id })))
}

#[axum::debug_handler]
pub async fn get_inventory_items(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = InventoryService::new(&state);
    let items = service.get_inventory_items(&ctx, query.category).await?;

    Ok(Json(json!({
        "items": items,
        "total": items.len()
    })))
}

#[axum::debug_handler]
pub async fn update_inventory_quantity(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<Value>, AppError> {
    let service = InventoryService::new(&state);
    let item = service.update_inventory_quantity(&ctx, item_id, request).await?;

    Ok(Json(json!(item)))
}

#[axum::debug_handler]
pub async fn get_low_stock_items(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = InventoryService::new(&state);
    let items = service.get_low_stock_items(&ctx).await?;

    Ok(Json(json!({
        "items": items,
        "total": items.len()
    })))
}

#[axum::debug_handler]
pub async fn get_item_logs(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = InventoryService::new(&state);
    let logs = service.get_item_logs(&ctx, item_id).await?;

    Ok(Json(json!({
        "logs": logs,
        "total": logs.len()
    })))
}
